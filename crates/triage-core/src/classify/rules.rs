use crate::model::{Classification, TriageAction, TriageDecision};

struct Signature {
    markers: &'static [&'static str],
    classification: Classification,
    action: TriageAction,
    block_ci: bool,
    confidence: f64,
    reason: &'static str,
}

// Priority-ordered: the first matching signature wins. Infrastructure
// signals outrank logic-failure signals so that a timeout alongside an
// assertion still reads as an environment problem.
const CATALOGUE: &[Signature] = &[
    Signature {
        markers: &["TimeoutError", "ConnectionError"],
        classification: Classification::EnvironmentIssue,
        action: TriageAction::Retry,
        block_ci: false,
        confidence: 0.75,
        reason: "looks like an infrastructure/network timeout; typically not a code regression",
    },
    Signature {
        markers: &["ZeroDivisionError", "KeyError", "AssertionError"],
        classification: Classification::CodeBug,
        action: TriageAction::BlockCi,
        block_ci: true,
        confidence: 0.80,
        reason: "likely code/logic issue; should block CI and be fixed",
    },
];

/// Deterministic baseline classifier. Always returns a well-formed
/// decision for any input, including empty input; it is the strategy the
/// resolver can fall back to unconditionally.
#[derive(Debug, Clone, Default)]
pub struct RuleEngine;

impl RuleEngine {
    pub fn classify(&self, raw_output: &str) -> TriageDecision {
        for sig in CATALOGUE {
            if sig.markers.iter().any(|m| raw_output.contains(m)) {
                return template(
                    sig.classification,
                    sig.action,
                    sig.block_ci,
                    sig.confidence,
                    sig.reason,
                );
            }
        }
        template(
            Classification::Unknown,
            TriageAction::Escalate,
            false,
            0.40,
            "not enough signal; needs human review",
        )
    }
}

fn template(
    classification: Classification,
    action: TriageAction,
    block_ci: bool,
    confidence: f64,
    reason: &str,
) -> TriageDecision {
    TriageDecision {
        classification,
        action,
        block_ci,
        confidence,
        reason: reason.to_string(),
        suspected_files: Vec::new(),
        suspected_functions: Vec::new(),
        root_cause_summary: None,
        next_steps: Vec::new(),
        recommended_patch: None,
        engine: None,
        engine_error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_bug_signature_blocks_ci() {
        let raw = "FAILED app/test_buggy.py::test_divide_zero - ZeroDivisionError: division by zero";
        let d = RuleEngine.classify(raw);
        assert_eq!(d.classification, Classification::CodeBug);
        assert_eq!(d.action, TriageAction::BlockCi);
        assert!(d.block_ci);
        assert_eq!(d.confidence, 0.80);
    }

    #[test]
    fn environment_signal_takes_priority() {
        let raw = "AssertionError: boom\nConnectionError: upstream unreachable";
        let d = RuleEngine.classify(raw);
        assert_eq!(d.classification, Classification::EnvironmentIssue);
        assert_eq!(d.action, TriageAction::Retry);
        assert!(!d.block_ci);
        assert_eq!(d.confidence, 0.75);
    }

    #[test]
    fn no_signal_escalates() {
        let d = RuleEngine.classify("");
        assert_eq!(d.classification, Classification::Unknown);
        assert_eq!(d.action, TriageAction::Escalate);
        assert!(!d.block_ci);
        assert_eq!(d.confidence, 0.40);
    }

    #[test]
    fn same_input_same_decision() {
        let raw = "KeyError: 'user_id'";
        assert_eq!(RuleEngine.classify(raw), RuleEngine.classify(raw));
    }
}
