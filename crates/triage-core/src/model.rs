use serde::{Deserialize, Serialize};

/// Likely cause of a failing run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    CodeBug,
    EnvironmentIssue,
    FlakyTest,
    Unknown,
}

impl Classification {
    /// Parse a wire value, coercing anything outside the set to `Unknown`.
    pub fn parse(s: &str) -> Self {
        match s {
            "code_bug" => Self::CodeBug,
            "environment_issue" => Self::EnvironmentIssue,
            "flaky_test" => Self::FlakyTest,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::CodeBug => "code_bug",
            Self::EnvironmentIssue => "environment_issue",
            Self::FlakyTest => "flaky_test",
            Self::Unknown => "unknown",
        }
    }
}

/// Recommended CI action for a triaged run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriageAction {
    Retry,
    CreateTicket,
    Escalate,
    Ignore,
    BlockCi,
}

impl TriageAction {
    /// Parse a wire value, coercing anything outside the set to `Escalate`.
    pub fn parse(s: &str) -> Self {
        match s {
            "retry" => Self::Retry,
            "create_ticket" => Self::CreateTicket,
            "ignore" => Self::Ignore,
            "block_ci" => Self::BlockCi,
            _ => Self::Escalate,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Retry => "retry",
            Self::CreateTicket => "create_ticket",
            Self::Escalate => "escalate",
            Self::Ignore => "ignore",
            Self::BlockCi => "block_ci",
        }
    }
}

/// Which strategy actually produced a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Engine {
    Rules,
    External,
}

/// The classification outcome for one run. Computed once, embedded in its
/// `TestRun`, never mutated afterwards.
///
/// `block_ci` is the single source of truth for whether the pipeline
/// should fail the build. The extended fields are only populated by the
/// external strategy; the rule engine leaves them empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriageDecision {
    pub classification: Classification,
    pub action: TriageAction,
    pub block_ci: bool,
    pub confidence: f64,
    #[serde(default)]
    pub reason: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suspected_files: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suspected_functions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_cause_summary: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub next_steps: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommended_patch: Option<String>,
    /// `None` for the fixed no-action decision of a passing run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine: Option<Engine>,
    /// Captured error text when the resolver fell back to rules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_error: Option<String>,
}

impl TriageDecision {
    /// Fixed decision persisted for a run that reported zero failures.
    pub fn all_passed() -> Self {
        Self {
            classification: Classification::Unknown,
            action: TriageAction::Ignore,
            block_ci: false,
            confidence: 1.0,
            reason: "all tests passed".into(),
            suspected_files: Vec::new(),
            suspected_functions: Vec::new(),
            root_cause_summary: None,
            next_steps: Vec::new(),
            recommended_patch: None,
            engine: None,
            engine_error: None,
        }
    }
}

/// One execution of the suite, as stored. `id` is assigned by the store
/// on insert and never reused.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestRun {
    pub id: i64,
    pub created_at: String,
    pub ok: bool,
    pub return_code: i32,
    pub raw_output: String,
    pub all_tests: Vec<String>,
    pub failed_tests: Vec<String>,
    pub triage: TriageDecision,
}

/// A run before the store has assigned it an id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunDraft {
    pub created_at: String,
    pub ok: bool,
    pub return_code: i32,
    pub raw_output: String,
    pub all_tests: Vec<String>,
    pub failed_tests: Vec<String>,
    pub triage: TriageDecision,
}

/// Test identifier lists carry set semantics but are stored as ordered
/// sequences for reproducible serialization.
pub fn normalize_ids(mut ids: Vec<String>) -> Vec<String> {
    ids.sort();
    ids.dedup();
    ids
}
