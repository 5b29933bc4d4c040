//! HTTP client for the remote analysis/generation service.
//!
//! Every endpoint takes and returns JSON against a single configured base
//! URL. The [`RemoteService`] trait is the seam: the production
//! implementation is [`ApiClient`], tests substitute a scripted fake.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Issue, PipelineError};

/// Failure talking to the remote service. Never retried automatically.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The service answered with a non-success status. `message` is the
    /// user-visible text: the JSON `message` field of the error body when
    /// present, the HTTP status line otherwise.
    #[error("{message}")]
    Status { status: u16, message: String },

    /// The request could not be completed at the transport level.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// A success response did not match the documented shape.
    #[error("malformed response from {endpoint}: {source}")]
    Malformed {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl From<RemoteError> for PipelineError {
    fn from(err: RemoteError) -> Self {
        PipelineError::Remote(err.to_string())
    }
}

/// Wire body for `POST /update-test-cases`. The change descriptor in
/// `changes` is forwarded verbatim from `/detect-changes`; `status` carries
/// the exact wire literal.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateTestCasesRequest {
    pub issue_key: String,
    pub jira_text: String,
    pub changes: String,
    pub new_test_cases: String,
    pub status: String,
}

/// The remote pipeline service consumed by the controller.
#[async_trait]
pub trait RemoteService: Send + Sync {
    /// `GET /get-jira-data` - the full issue list.
    async fn fetch_issues(&self) -> Result<Vec<Issue>, RemoteError>;

    /// `POST /analyze` - per-issue-key analysis text.
    async fn analyze(
        &self,
        issue_keys: &[String],
    ) -> Result<HashMap<String, String>, RemoteError>;

    /// `POST /generate-test-cases` - one test-case document for the keys.
    async fn generate_test_cases(&self, issue_keys: &[String]) -> Result<String, RemoteError>;

    /// `POST /generate-automation-code` - automation code for one issue.
    async fn generate_automation_code(
        &self,
        issue_key: &str,
        narrative: &str,
        test_cases: &str,
    ) -> Result<String, RemoteError>;

    /// `POST /detect-changes` - opaque change descriptor between two texts.
    async fn detect_changes(
        &self,
        old_text: &str,
        new_text: &str,
    ) -> Result<String, RemoteError>;

    /// `POST /update-test-cases` - persists the verified document. The
    /// response body is ignored beyond its status.
    async fn update_test_cases(
        &self,
        request: UpdateTestCasesRequest,
    ) -> Result<(), RemoteError>;
}

#[derive(Debug, Deserialize)]
struct IssueListResponse {
    jira_data: Vec<Issue>,
}

#[derive(Debug, Serialize)]
struct IssueKeysRequest<'a> {
    jira_ids: &'a [String],
}

#[derive(Debug, Deserialize)]
struct GenerateTestCasesResponse {
    #[serde(rename = "testCases")]
    test_cases: String,
}

#[derive(Debug, Serialize)]
struct AutomationCodeRequest<'a> {
    jira_key: &'a str,
    jira_text: &'a str,
    test_cases: &'a str,
}

#[derive(Debug, Deserialize)]
struct AutomationCodeResponse {
    automated_code: String,
}

#[derive(Debug, Serialize)]
struct DetectChangesRequest<'a> {
    old_text: &'a str,
    new_text: &'a str,
}

#[derive(Debug, Deserialize)]
struct DetectChangesResponse {
    diff: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Production [`RemoteService`] over `reqwest`.
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            http: reqwest::Client::new(),
        }
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &'static str) -> Result<T, RemoteError> {
        let response = self.http.get(self.url(endpoint)).send().await;
        Self::decode(Self::check(response, endpoint).await?, endpoint).await
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        body: &B,
    ) -> Result<T, RemoteError> {
        let response = self.http.post(self.url(endpoint)).json(body).send().await;
        Self::decode(Self::check(response, endpoint).await?, endpoint).await
    }

    /// Maps transport failures and non-success statuses to [`RemoteError`],
    /// preferring the error body's JSON `message` field over the bare status
    /// line for the user-visible text.
    async fn check(
        response: Result<reqwest::Response, reqwest::Error>,
        endpoint: &'static str,
    ) -> Result<reqwest::Response, RemoteError> {
        let response = response.map_err(|err| {
            log::error!("[{endpoint}] {err}");
            RemoteError::Transport(err)
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let status_line = format!(
            "HTTP {}: {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("unknown status"),
        );
        let message = response
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|body| body.message)
            .unwrap_or(status_line);
        log::error!("[{endpoint}] {message}");
        Err(RemoteError::Status {
            status: status.as_u16(),
            message,
        })
    }

    async fn decode<T: DeserializeOwned>(
        response: reqwest::Response,
        endpoint: &'static str,
    ) -> Result<T, RemoteError> {
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|source| {
            log::error!("[{endpoint}] unexpected response shape: {source}");
            RemoteError::Malformed { endpoint, source }
        })
    }
}

#[async_trait]
impl RemoteService for ApiClient {
    async fn fetch_issues(&self) -> Result<Vec<Issue>, RemoteError> {
        let response: IssueListResponse = self.get_json("/get-jira-data").await?;
        Ok(response.jira_data)
    }

    async fn analyze(
        &self,
        issue_keys: &[String],
    ) -> Result<HashMap<String, String>, RemoteError> {
        self.post_json("/analyze", &IssueKeysRequest { jira_ids: issue_keys })
            .await
    }

    async fn generate_test_cases(&self, issue_keys: &[String]) -> Result<String, RemoteError> {
        let response: GenerateTestCasesResponse = self
            .post_json(
                "/generate-test-cases",
                &IssueKeysRequest { jira_ids: issue_keys },
            )
            .await?;
        Ok(response.test_cases)
    }

    async fn generate_automation_code(
        &self,
        issue_key: &str,
        narrative: &str,
        test_cases: &str,
    ) -> Result<String, RemoteError> {
        let response: AutomationCodeResponse = self
            .post_json(
                "/generate-automation-code",
                &AutomationCodeRequest {
                    jira_key: issue_key,
                    jira_text: narrative,
                    test_cases,
                },
            )
            .await?;
        Ok(response.automated_code)
    }

    async fn detect_changes(
        &self,
        old_text: &str,
        new_text: &str,
    ) -> Result<String, RemoteError> {
        let response: DetectChangesResponse = self
            .post_json("/detect-changes", &DetectChangesRequest { old_text, new_text })
            .await?;
        Ok(response.diff)
    }

    async fn update_test_cases(
        &self,
        request: UpdateTestCasesRequest,
    ) -> Result<(), RemoteError> {
        let endpoint = "/update-test-cases";
        let response = self.http.post(self.url(endpoint)).json(&request).send().await;
        Self::check(response, endpoint).await?;
        Ok(())
    }
}
