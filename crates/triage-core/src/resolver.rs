use crate::classify::{ExternalTriage, RuleEngine};
use crate::model::{Engine, TriageDecision};

/// Orchestrates the two classification strategies: the external engine is
/// tried first and the rule engine answers whenever it cannot. `resolve`
/// itself never fails; it is the point where richer, non-deterministic
/// judgment degrades to deterministic, unconditionally-available judgment.
#[derive(Clone)]
pub struct TriageResolver {
    external: ExternalTriage,
    rules: RuleEngine,
}

impl TriageResolver {
    pub fn new(external: ExternalTriage, rules: RuleEngine) -> Self {
        Self { external, rules }
    }

    /// Rule-only resolver, for callers that disabled the external engine.
    pub fn rules_only() -> Self {
        Self::new(ExternalTriage::new(None), RuleEngine)
    }

    pub async fn resolve(&self, raw_output: &str) -> TriageDecision {
        match self.external.classify(raw_output).await {
            Ok(mut decision) => {
                decision.engine = Some(Engine::External);
                decision
            }
            Err(e) => {
                tracing::warn!(event = "triage_fallback", error = %e);
                let mut decision = self.rules.classify(raw_output);
                decision.engine = Some(Engine::Rules);
                decision.engine_error = Some(e.to_string());
                decision
            }
        }
    }
}
