use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, RwLock};

use crate::data::store::IssueStore;
use crate::domain::IssueId;
use crate::infra::app_config::AppConfig;

/// The active pipeline stage (tab).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stage {
    #[default]
    Generate,
    Verify,
    Automate,
}

impl Stage {
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Generate => "Generate Test Cases",
            Stage::Verify => "Verify & Update Test Cases",
            Stage::Automate => "Automated Test Cases",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Generate => write!(f, "generate"),
            Stage::Verify => write!(f, "verify"),
            Stage::Automate => write!(f, "automate"),
        }
    }
}

impl FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "generate" => Ok(Stage::Generate),
            "verify" => Ok(Stage::Verify),
            "automate" | "automated" => Ok(Stage::Automate),
            other => Err(format!("unknown stage: {other}")),
        }
    }
}

/// Mutable pipeline state shared between the controller and the view.
///
/// Transient outputs (`analysis`, `analysis_keys`, `generated_test_cases`,
/// `generated_code`) are reset wholesale on each new analyze invocation.
/// `generated_code` is a freshly generated, not-yet-persisted result; the
/// persisted counterpart lives on the issue record itself.
#[derive(Debug, Default)]
pub struct PipelineState {
    pub active_stage: Stage,
    /// True while a remote operation is in flight. Advisory: the view
    /// disables triggers while set; the controller does not reject overlap.
    pub busy: bool,
    /// The most recent operation failure, user-visible text. Overwritten by
    /// each new failure, never aggregated.
    pub error: Option<String>,
    /// Per-issue-key analysis text from the last analyze call.
    pub analysis: Option<HashMap<String, String>>,
    /// The ids used for the last analyze; generation posts the same set.
    pub analysis_keys: Vec<String>,
    pub generated_test_cases: Option<String>,
    pub generated_code: Option<String>,
    /// Issue keys ticked in the analysis output.
    pub selection: HashSet<String>,
    /// Issue selected in the Verify/Automate stages.
    pub active_issue: Option<IssueId>,
    /// Unsaved per-issue replacement text for test cases, keyed by issue id.
    /// Independent of the persisted document until committed.
    pub edit_buffers: HashMap<IssueId, String>,
}

/// Shared application state handed to every controller operation.
///
/// One explicit, injectable container - no ambient globals - so operations
/// are unit-testable without a rendering environment.
pub struct AppState {
    pub store: Arc<Mutex<IssueStore>>,
    pub pipeline: Arc<Mutex<PipelineState>>,
    pub config: Arc<RwLock<AppConfig>>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            store: Arc::new(Mutex::new(IssueStore::new())),
            pipeline: Arc::new(Mutex::new(PipelineState::default())),
            config: Arc::new(RwLock::new(config)),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

/// RAII guard for the shared busy flag.
///
/// Acquired on entry to every remote operation and released on drop, so no
/// exit path - success, failure, early return or unwind - can leave `busy`
/// stuck true.
pub struct BusyGuard {
    pipeline: Arc<Mutex<PipelineState>>,
}

impl BusyGuard {
    pub fn acquire(pipeline: &Arc<Mutex<PipelineState>>) -> Self {
        if let Ok(mut state) = pipeline.lock() {
            state.busy = true;
        }
        Self {
            pipeline: Arc::clone(pipeline),
        }
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        // Tolerates a poisoned lock while unwinding.
        if let Ok(mut state) = self.pipeline.lock() {
            state.busy = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_parse_round_trip() {
        assert_eq!("generate".parse::<Stage>().unwrap(), Stage::Generate);
        assert_eq!("Verify".parse::<Stage>().unwrap(), Stage::Verify);
        assert_eq!("automated".parse::<Stage>().unwrap(), Stage::Automate);
        assert!("deploy".parse::<Stage>().is_err());
    }

    #[test]
    fn test_busy_guard_releases_on_every_path() {
        let state = AppState::default();

        {
            let _guard = BusyGuard::acquire(&state.pipeline);
            assert!(state.pipeline.lock().unwrap().busy);
        }
        assert!(!state.pipeline.lock().unwrap().busy);

        // Early-return shape: the guard drops with the scope.
        let simulate_failure = || -> Result<(), ()> {
            let _guard = BusyGuard::acquire(&state.pipeline);
            Err(())
        };
        assert!(simulate_failure().is_err());
        assert!(!state.pipeline.lock().unwrap().busy);
    }
}
