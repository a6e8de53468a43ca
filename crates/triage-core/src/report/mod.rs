use crate::model::TriageDecision;
use serde::{Deserialize, Serialize};

pub mod console;

/// What one pipeline invocation hands back to its caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: i64,
    pub ok: bool,
    pub failed_tests: Vec<String>,
    pub flaky_failed_tests: Vec<String>,
    pub block_ci: bool,
    pub triage: TriageDecision,
}
