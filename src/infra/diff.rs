//! Change-descriptor retrieval.
//!
//! Wraps the remote diff computation into a single awaited call. The
//! descriptor's representation is the service's business: it is treated as an
//! opaque string here and forwarded verbatim to the update call that follows.

use crate::infra::api::{RemoteError, RemoteService};

/// Requests a server-computed change descriptor between two versions of a
/// test-case document.
pub struct DiffRequester<'a> {
    service: &'a dyn RemoteService,
}

impl<'a> DiffRequester<'a> {
    pub fn new(service: &'a dyn RemoteService) -> Self {
        Self { service }
    }

    /// One round-trip to `/detect-changes`. A failure is surfaced to the
    /// caller as-is; there is no retry.
    pub async fn compute_diff(
        &self,
        old_text: &str,
        new_text: &str,
    ) -> Result<String, RemoteError> {
        self.service.detect_changes(old_text, new_text).await
    }
}
