//! Data layer - in-memory mirror of the records owned by the remote service.

pub mod store;

pub use store::{IssuePatch, IssueStore};
