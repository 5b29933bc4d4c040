//! Issue store for CaseForge
//! Holds every issue known to the client and applies server-confirmed updates.

use std::collections::HashMap;

use crate::domain::{Artifact, Issue, IssueStatus};

/// Field-merge patch for [`IssueStore::apply_update`]. Only the fields a
/// remote operation actually confirmed are set.
#[derive(Debug, Clone, Default)]
pub struct IssuePatch {
    pub status: Option<IssueStatus>,
    pub test_cases: Option<String>,
    pub artifacts: Option<Vec<Artifact>>,
    pub automated_code: Option<String>,
}

/// The single shared mutable resource of the pipeline: all issues fetched
/// from the service, in server order.
///
/// The store is pure in-memory state - no remote calls originate here, and
/// the pipeline controller is the only writer after the initial bulk load.
#[derive(Debug, Default)]
pub struct IssueStore {
    issues: Vec<Issue>,
    by_id: HashMap<String, usize>,
}

impl IssueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the entire known set with `issues`.
    ///
    /// No merge semantics: previous contents are discarded wholesale, and
    /// edit buffers tied to ids no longer present become orphaned (they are
    /// never surfaced for an absent id).
    pub fn load(&mut self, issues: Vec<Issue>) {
        self.by_id = issues
            .iter()
            .enumerate()
            .map(|(index, issue)| (issue.id.clone(), index))
            .collect();
        self.issues = issues;
    }

    /// Exact-key lookup by server-assigned id.
    pub fn find(&self, id: &str) -> Option<&Issue> {
        self.by_id.get(id).map(|&index| &self.issues[index])
    }

    /// Stable, insertion-order-preserving subsequence.
    pub fn filter(&self, predicate: impl Fn(&Issue) -> bool) -> Vec<&Issue> {
        self.issues.iter().filter(|issue| predicate(issue)).collect()
    }

    /// Case-insensitive substring match on the issue key or the status wire
    /// string; backs the issue search box.
    pub fn search(&self, query: &str) -> Vec<&Issue> {
        let needle = query.to_lowercase();
        self.filter(|issue| {
            issue.key.to_lowercase().contains(&needle)
                || issue.status.as_wire().to_lowercase().contains(&needle)
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter()
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// Merges the set fields of `patch` into the record for `id`.
    ///
    /// A silent no-op when `id` is absent: callers check `find` first and
    /// surface "issue not found" themselves before updating.
    pub fn apply_update(&mut self, id: &str, patch: IssuePatch) {
        let Some(&index) = self.by_id.get(id) else {
            return;
        };
        let issue = &mut self.issues[index];
        if let Some(status) = patch.status {
            issue.status = status;
        }
        if let Some(test_cases) = patch.test_cases {
            issue.test_cases = test_cases;
        }
        if let Some(artifacts) = patch.artifacts {
            issue.artifacts = artifacts;
        }
        if let Some(automated_code) = patch.automated_code {
            issue.automated_code = Some(automated_code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue(id: &str, key: &str, status: IssueStatus) -> Issue {
        Issue {
            id: id.to_string(),
            key: key.to_string(),
            status,
            narrative: String::new(),
            test_cases: String::new(),
            artifacts: Vec::new(),
            automated_code: None,
        }
    }

    #[test]
    fn test_load_replaces_previous_set() {
        let mut store = IssueStore::new();
        store.load(vec![
            issue("a", "PROJ-1", IssueStatus::Processed),
            issue("b", "PROJ-2", IssueStatus::Processed),
        ]);
        store.load(vec![issue("c", "PROJ-3", IssueStatus::CodeGenerated)]);

        assert!(store.find("a").is_none());
        assert!(store.find("b").is_none());
        assert_eq!(store.find("c").unwrap().key, "PROJ-3");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_apply_update_on_absent_id_is_noop() {
        let mut store = IssueStore::new();
        store.load(vec![issue("a", "PROJ-1", IssueStatus::Processed)]);
        let before: Vec<Issue> = store.iter().cloned().collect();

        store.apply_update(
            "missing",
            IssuePatch {
                status: Some(IssueStatus::TestCaseVerified),
                test_cases: Some("changed".to_string()),
                ..Default::default()
            },
        );

        let after: Vec<Issue> = store.iter().cloned().collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_apply_update_merges_only_set_fields() {
        let mut store = IssueStore::new();
        let mut seeded = issue("a", "PROJ-1", IssueStatus::Processed);
        seeded.test_cases = "old".to_string();
        store.load(vec![seeded]);

        store.apply_update(
            "a",
            IssuePatch {
                status: Some(IssueStatus::TestCaseVerified),
                ..Default::default()
            },
        );

        let updated = store.find("a").unwrap();
        assert_eq!(updated.status, IssueStatus::TestCaseVerified);
        // Unset fields stay untouched.
        assert_eq!(updated.test_cases, "old");
    }

    #[test]
    fn test_filter_preserves_insertion_order() {
        let mut store = IssueStore::new();
        store.load(vec![
            issue("a", "PROJ-1", IssueStatus::Processed),
            issue("b", "PROJ-2", IssueStatus::CodeGenerated),
            issue("c", "PROJ-3", IssueStatus::Processed),
        ]);

        let processed = store.filter(|i| i.status == IssueStatus::Processed);
        let keys: Vec<_> = processed.iter().map(|i| i.key.as_str()).collect();
        assert_eq!(keys, vec!["PROJ-1", "PROJ-3"]);
    }

    #[test]
    fn test_search_matches_key_and_status() {
        let mut store = IssueStore::new();
        store.load(vec![
            issue("a", "PROJ-1", IssueStatus::Processed),
            issue("b", "OTHER-9", IssueStatus::TestCaseVerified),
        ]);

        let by_key: Vec<_> = store.search("proj").iter().map(|i| i.id.clone()).collect();
        assert_eq!(by_key, vec!["a"]);

        let by_status: Vec<_> = store
            .search("verified")
            .iter()
            .map(|i| i.id.clone())
            .collect();
        assert_eq!(by_status, vec!["b"]);
    }
}
