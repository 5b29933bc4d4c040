use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Unique identifier for an issue, assigned by the remote service.
pub type IssueId = String;

/// Pipeline status of an issue, as reported by the remote service.
///
/// The wire literals (`processed`, `CODE_GENERATED`, `Test_case_verified`)
/// are preserved byte-for-byte in both directions; the server is treated as
/// authoritative for their casing and spelling. Anything else passes through
/// `Other` unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum IssueStatus {
    Processed,
    CodeGenerated,
    TestCaseVerified,
    Other(String),
}

impl IssueStatus {
    /// The exact string the remote service uses for this status.
    pub fn as_wire(&self) -> &str {
        match self {
            Self::Processed => "processed",
            Self::CodeGenerated => "CODE_GENERATED",
            Self::TestCaseVerified => "Test_case_verified",
            Self::Other(s) => s,
        }
    }
}

impl fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_wire())
    }
}

impl FromStr for IssueStatus {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s.to_string()))
    }
}

impl From<String> for IssueStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "processed" => Self::Processed,
            "CODE_GENERATED" => Self::CodeGenerated,
            "Test_case_verified" => Self::TestCaseVerified,
            _ => Self::Other(s),
        }
    }
}

impl From<IssueStatus> for String {
    fn from(status: IssueStatus) -> Self {
        status.as_wire().to_string()
    }
}

/// A named automation artifact attached to an issue.
///
/// The server encodes each artifact as a single-entry object
/// `{<title>: <body>}`; (de)serialization flattens that shape. If the object
/// carries more than one entry, the first one wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<String, String>",
    into = "BTreeMap<String, String>"
)]
pub struct Artifact {
    pub title: String,
    pub body: String,
}

impl From<BTreeMap<String, String>> for Artifact {
    fn from(mut map: BTreeMap<String, String>) -> Self {
        match map.pop_first() {
            Some((title, body)) => Self { title, body },
            None => Self {
                title: String::new(),
                body: String::new(),
            },
        }
    }
}

impl From<Artifact> for BTreeMap<String, String> {
    fn from(artifact: Artifact) -> Self {
        BTreeMap::from([(artifact.title, artifact.body)])
    }
}

/// One tracked ticket mirrored from the remote service.
///
/// The service owns these records; the client only mutates its mirror through
/// `IssueStore::apply_update` after a successful remote operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    /// Opaque unique identifier assigned by the remote service.
    #[serde(rename = "_id")]
    pub id: IssueId,
    /// Human-readable issue key (e.g. "PROJ-123").
    #[serde(rename = "issue_key")]
    pub key: String,
    /// Current pipeline status.
    pub status: IssueStatus,
    /// Free text describing the issue; source for analysis and generation.
    #[serde(rename = "jira_text", default)]
    pub narrative: String,
    /// Accepted test-case document, authoritative on the server.
    #[serde(rename = "test_cases", default)]
    pub test_cases: String,
    /// Automation artifacts produced once automation succeeded.
    #[serde(rename = "automated_tests", default)]
    pub artifacts: Vec<Artifact>,
    /// Most recent persisted automation output, if any.
    #[serde(rename = "automated_code", default)]
    pub automated_code: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_wire_round_trip() {
        let raw = r#"{
            "_id": "64fa12",
            "issue_key": "PROJ-7",
            "status": "CODE_GENERATED",
            "jira_text": "As a user...",
            "test_cases": "1. Open the page",
            "automated_tests": [{"LoginTest": "class LoginTest {}"}]
        }"#;

        let issue: Issue = serde_json::from_str(raw).unwrap();
        assert_eq!(issue.id, "64fa12");
        assert_eq!(issue.key, "PROJ-7");
        assert_eq!(issue.status, IssueStatus::CodeGenerated);
        assert_eq!(issue.artifacts.len(), 1);
        assert_eq!(issue.artifacts[0].title, "LoginTest");
        assert_eq!(issue.artifacts[0].body, "class LoginTest {}");
        assert_eq!(issue.automated_code, None);

        let value = serde_json::to_value(&issue).unwrap();
        assert_eq!(value["_id"], "64fa12");
        assert_eq!(value["status"], "CODE_GENERATED");
        assert_eq!(value["automated_tests"][0]["LoginTest"], "class LoginTest {}");
    }

    #[test]
    fn test_issue_tolerates_sparse_records() {
        // Fresh tickets come back with only id, key, status and narrative.
        let raw = r#"{"_id": "1", "issue_key": "PROJ-1", "status": "processed"}"#;
        let issue: Issue = serde_json::from_str(raw).unwrap();
        assert_eq!(issue.status, IssueStatus::Processed);
        assert!(issue.test_cases.is_empty());
        assert!(issue.artifacts.is_empty());
    }
}
