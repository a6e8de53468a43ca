use async_trait::async_trait;
use std::sync::Arc;
use triage_core::classify::{ExternalTriage, RuleEngine};
use triage_core::model::{Classification, Engine, TriageAction};
use triage_core::providers::llm::{LlmClient, LlmResponse};
use triage_core::resolver::TriageResolver;

enum FakeBehavior {
    Reply(&'static str),
    Fail(&'static str),
}

struct FakeLlm(FakeBehavior);

#[async_trait]
impl LlmClient for FakeLlm {
    async fn complete(&self, _prompt: &str) -> anyhow::Result<LlmResponse> {
        match &self.0 {
            FakeBehavior::Reply(text) => Ok(LlmResponse {
                text: (*text).to_string(),
                provider: "fake".into(),
                model: "fake-1".into(),
            }),
            FakeBehavior::Fail(msg) => anyhow::bail!("{}", msg),
        }
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }
}

fn resolver_with(behavior: FakeBehavior) -> TriageResolver {
    let client: Arc<dyn LlmClient> = Arc::new(FakeLlm(behavior));
    TriageResolver::new(ExternalTriage::new(Some(client)), RuleEngine)
}

const RAW: &str = "FAILED app/test_buggy.py::test_divide_zero - ZeroDivisionError: division by zero";

#[tokio::test]
async fn transport_error_falls_back_to_rules() {
    let resolver = resolver_with(FakeBehavior::Fail("connection reset by peer"));
    let d = resolver.resolve(RAW).await;

    assert_eq!(d.engine, Some(Engine::Rules));
    let err = d.engine_error.as_deref().expect("captured error");
    assert!(err.contains("connection reset by peer"));

    // The decision body is exactly what the rule engine alone produces.
    let expected = RuleEngine.classify(RAW);
    assert_eq!(d.classification, expected.classification);
    assert_eq!(d.action, expected.action);
    assert_eq!(d.block_ci, expected.block_ci);
    assert_eq!(d.confidence, expected.confidence);
    assert_eq!(d.reason, expected.reason);
}

#[tokio::test]
async fn unparseable_reply_falls_back_to_rules() {
    let resolver = resolver_with(FakeBehavior::Reply("I could not decide, sorry."));
    let d = resolver.resolve(RAW).await;

    assert_eq!(d.engine, Some(Engine::Rules));
    assert!(d
        .engine_error
        .as_deref()
        .expect("captured error")
        .contains("unparseable"));
    assert_eq!(d.classification, Classification::CodeBug);
    assert!(d.block_ci);
}

#[tokio::test]
async fn missing_credentials_fall_back_to_rules() {
    let resolver = TriageResolver::rules_only();
    let d = resolver.resolve(RAW).await;

    assert_eq!(d.engine, Some(Engine::Rules));
    assert!(d
        .engine_error
        .as_deref()
        .expect("captured error")
        .contains("configuration"));
}

#[tokio::test]
async fn valid_reply_is_stamped_external() {
    let resolver = resolver_with(FakeBehavior::Reply(
        "Here is my triage:\n\
         {\"classification\": \"environment_issue\", \"action\": \"retry\",\n\
          \"block_ci\": false, \"confidence\": 0.66, \"reason\": \"registry timeout\",\n\
          \"next_steps\": [\"retry the job\"]}\n\
         Let me know if you need more.",
    ));
    let d = resolver.resolve(RAW).await;

    assert_eq!(d.engine, Some(Engine::External));
    assert!(d.engine_error.is_none());
    assert_eq!(d.classification, Classification::EnvironmentIssue);
    assert_eq!(d.action, TriageAction::Retry);
    assert!(!d.block_ci);
    assert_eq!(d.confidence, 0.66);
    assert_eq!(d.next_steps, vec!["retry the job".to_string()]);
}
