//! Domain types for CaseForge
//! Defines the core data structures and business objects used throughout the application.

pub mod error;
pub mod issue;
pub mod segment;

pub use error::*;
pub use issue::*;
pub use segment::*;

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_issue_status_display_parse() {
        assert_eq!(IssueStatus::Processed.to_string(), "processed");
        assert_eq!(IssueStatus::CodeGenerated.to_string(), "CODE_GENERATED");
        assert_eq!(
            IssueStatus::TestCaseVerified.to_string(),
            "Test_case_verified"
        );
        assert_eq!(
            IssueStatus::from_str("processed").unwrap(),
            IssueStatus::Processed
        );
        assert_eq!(
            IssueStatus::from_str("CODE_GENERATED").unwrap(),
            IssueStatus::CodeGenerated
        );
        assert_eq!(
            IssueStatus::from_str("Test_case_verified").unwrap(),
            IssueStatus::TestCaseVerified
        );
    }

    #[test]
    fn test_issue_status_preserves_unknown_literals() {
        let status = IssueStatus::from_str("In_review").unwrap();
        assert_eq!(status, IssueStatus::Other("In_review".to_string()));
        // Whatever the server sent goes back out byte-for-byte.
        assert_eq!(status.to_string(), "In_review");
    }

    #[test]
    fn test_segment_source_reconstruction() {
        let code = Segment::Code {
            language: "java".to_string(),
            content: "int x = 1;\n".to_string(),
        };
        assert_eq!(code.to_source(), "```java\nint x = 1;\n```");

        let text = Segment::Text {
            content: "plain".to_string(),
        };
        assert_eq!(text.to_source(), "plain");
    }
}
