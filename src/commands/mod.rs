//! Pipeline controller operations.
//!
//! Each operation is a standalone async function over the shared [`AppState`]
//! and the [`RemoteService`] seam, mirroring one user intent from the view
//! layer. Remote operations hold the busy flag for their full duration via
//! [`BusyGuard`] and surface failures as the single pipeline error string.
//!
//! The controller does not queue or reject overlapping calls: the view
//! disables triggers while busy, and if it does not, the last response to
//! resolve wins for any shared output field. There is no cancellation and no
//! timeout - an issued call runs to completion or failure.

use crate::data::store::IssuePatch;
use crate::domain::{IssueId, IssueStatus, PipelineError};
use crate::infra::api::{RemoteService, UpdateTestCasesRequest};
use crate::infra::diff::DiffRequester;
use crate::state::{AppState, BusyGuard, Stage};

/// Switches the active stage. Entering Verify or Automate refreshes the
/// issue set from the service; the switch itself is a pure local transition.
pub async fn set_active_stage(
    state: &AppState,
    service: &dyn RemoteService,
    stage: Stage,
) -> Result<(), PipelineError> {
    state.pipeline.lock().unwrap().active_stage = stage;
    match stage {
        Stage::Verify | Stage::Automate => fetch_all(state, service).await,
        Stage::Generate => Ok(()),
    }
}

/// Bulk-fetches every issue and replaces the store contents wholesale.
/// Idempotent to repeat; on failure the store is left unchanged.
pub async fn fetch_all(state: &AppState, service: &dyn RemoteService) -> Result<(), PipelineError> {
    fetch_all_inner(state, service)
        .await
        .map_err(|err| surface_error(state, err))
}

async fn fetch_all_inner(
    state: &AppState,
    service: &dyn RemoteService,
) -> Result<(), PipelineError> {
    let _busy = BusyGuard::acquire(&state.pipeline);
    let issues = service.fetch_issues().await?;
    log::debug!("loaded {} issues", issues.len());
    state.store.lock().unwrap().load(issues);
    Ok(())
}

/// Runs analysis for the given issue ids.
///
/// Blank ids are dropped; an effectively empty list fails fast with a
/// validation error and no network call. All transient outputs (and the
/// previous error) are reset before the request, so stale results from an
/// earlier analyze never survive a new one.
pub async fn analyze(
    state: &AppState,
    service: &dyn RemoteService,
    issue_keys: &[String],
) -> Result<(), PipelineError> {
    analyze_inner(state, service, issue_keys)
        .await
        .map_err(|err| surface_error(state, err))
}

async fn analyze_inner(
    state: &AppState,
    service: &dyn RemoteService,
    issue_keys: &[String],
) -> Result<(), PipelineError> {
    let _busy = BusyGuard::acquire(&state.pipeline);

    let keys: Vec<String> = issue_keys
        .iter()
        .map(|key| key.trim())
        .filter(|key| !key.is_empty())
        .map(str::to_string)
        .collect();
    if keys.is_empty() {
        return Err(PipelineError::validation(
            "Please enter at least one issue ID.",
        ));
    }

    {
        let mut pipeline = state.pipeline.lock().unwrap();
        pipeline.error = None;
        pipeline.analysis = None;
        pipeline.analysis_keys.clear();
        pipeline.generated_test_cases = None;
        pipeline.generated_code = None;
    }

    let analysis = service.analyze(&keys).await?;

    let mut pipeline = state.pipeline.lock().unwrap();
    pipeline.analysis = Some(analysis);
    pipeline.analysis_keys = keys;
    Ok(())
}

/// Generates a test-case document from the last analysis, posting the same
/// issue ids that analysis ran with.
pub async fn generate_test_cases(
    state: &AppState,
    service: &dyn RemoteService,
) -> Result<(), PipelineError> {
    generate_test_cases_inner(state, service)
        .await
        .map_err(|err| surface_error(state, err))
}

async fn generate_test_cases_inner(
    state: &AppState,
    service: &dyn RemoteService,
) -> Result<(), PipelineError> {
    let _busy = BusyGuard::acquire(&state.pipeline);

    let keys = {
        let pipeline = state.pipeline.lock().unwrap();
        if pipeline.analysis.as_ref().is_none_or(|a| a.is_empty()) {
            return Err(PipelineError::validation(
                "Run analysis before generating test cases.",
            ));
        }
        pipeline.analysis_keys.clone()
    };

    let test_cases = service.generate_test_cases(&keys).await?;
    state.pipeline.lock().unwrap().generated_test_cases = Some(test_cases);
    Ok(())
}

/// Generates automation code for one stored issue.
///
/// The result lands in the transient `generated_code` slot only - it is NOT
/// written into the issue record, so freshly generated output stays distinct
/// from automation code the server has already persisted.
pub async fn generate_automated_code(
    state: &AppState,
    service: &dyn RemoteService,
    issue_id: &str,
) -> Result<(), PipelineError> {
    generate_automated_code_inner(state, service, issue_id)
        .await
        .map_err(|err| surface_error(state, err))
}

async fn generate_automated_code_inner(
    state: &AppState,
    service: &dyn RemoteService,
    issue_id: &str,
) -> Result<(), PipelineError> {
    let _busy = BusyGuard::acquire(&state.pipeline);

    if issue_id.trim().is_empty() {
        return Err(PipelineError::validation("Please select an issue first."));
    }

    let (key, narrative, test_cases) = {
        let store = state.store.lock().unwrap();
        let issue = store
            .find(issue_id)
            .ok_or_else(|| PipelineError::not_found(issue_id))?;
        (
            issue.key.clone(),
            issue.narrative.clone(),
            issue.test_cases.clone(),
        )
    };

    let code = service
        .generate_automation_code(&key, &narrative, &test_cases)
        .await?;
    log::info!("generated automation code for {key}");
    state.pipeline.lock().unwrap().generated_code = Some(code);
    Ok(())
}

/// Persists the edited test cases for one issue.
///
/// Requires a non-empty edit buffer. Fetches a change descriptor for the
/// edit against the persisted document, posts the update, and only then
/// mirrors the new document and the verified status into the store and
/// clears the buffer. A failure at any step leaves prior state untouched.
pub async fn update_test_cases(
    state: &AppState,
    service: &dyn RemoteService,
    issue_id: &str,
) -> Result<(), PipelineError> {
    update_test_cases_inner(state, service, issue_id)
        .await
        .map_err(|err| surface_error(state, err))
}

async fn update_test_cases_inner(
    state: &AppState,
    service: &dyn RemoteService,
    issue_id: &str,
) -> Result<(), PipelineError> {
    let _busy = BusyGuard::acquire(&state.pipeline);

    let (key, narrative, old_test_cases) = {
        let store = state.store.lock().unwrap();
        let issue = store
            .find(issue_id)
            .ok_or_else(|| PipelineError::not_found(issue_id))?;
        (
            issue.key.clone(),
            issue.narrative.clone(),
            issue.test_cases.clone(),
        )
    };

    let new_test_cases = {
        let pipeline = state.pipeline.lock().unwrap();
        let buffer = pipeline.edit_buffers.get(issue_id).cloned().unwrap_or_default();
        if buffer.trim().is_empty() {
            return Err(PipelineError::validation("Test cases cannot be empty."));
        }
        buffer
    };

    let changes = DiffRequester::new(service)
        .compute_diff(&old_test_cases, &new_test_cases)
        .await?;

    service
        .update_test_cases(UpdateTestCasesRequest {
            issue_key: key.clone(),
            jira_text: narrative,
            changes,
            new_test_cases: new_test_cases.clone(),
            status: IssueStatus::TestCaseVerified.to_string(),
        })
        .await?;
    log::info!("updated test cases for {key}");

    {
        let mut store = state.store.lock().unwrap();
        store.apply_update(
            issue_id,
            IssuePatch {
                status: Some(IssueStatus::TestCaseVerified),
                test_cases: Some(new_test_cases),
                ..Default::default()
            },
        );
    }
    state.pipeline.lock().unwrap().edit_buffers.remove(issue_id);
    Ok(())
}

/// Selects the issue the Verify/Automate stages operate on. Pure local.
pub fn select_issue(state: &AppState, issue_id: Option<IssueId>) {
    state.pipeline.lock().unwrap().active_issue = issue_id;
}

/// Toggles an issue key in the analysis-output selection. Pure local.
pub fn toggle_selection(state: &AppState, issue_key: &str) {
    let mut pipeline = state.pipeline.lock().unwrap();
    if !pipeline.selection.remove(issue_key) {
        pipeline.selection.insert(issue_key.to_string());
    }
}

/// Writes the in-progress replacement text for an issue's test cases into
/// the edit buffer. Pure local; nothing is persisted until
/// [`update_test_cases`] succeeds.
pub fn edit_test_cases(state: &AppState, issue_id: &str, text: String) {
    state
        .pipeline
        .lock()
        .unwrap()
        .edit_buffers
        .insert(issue_id.to_string(), text);
}

/// Records `err` as the pipeline error string - overwriting any prior error,
/// never aggregating - and hands it back to the caller.
fn surface_error(state: &AppState, err: PipelineError) -> PipelineError {
    state.pipeline.lock().unwrap().error = Some(err.to_string());
    err
}
