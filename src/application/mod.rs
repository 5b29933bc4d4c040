//! Application layer (use-cases, policies).
//!
//! This module orchestrates domain logic without depending on the terminal
//! front end, the HTTP client, or any storage.

pub mod segmenter;
