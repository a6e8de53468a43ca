use crate::errors::ClassifyError;
use crate::model::{Classification, TriageAction, TriageDecision};
use crate::providers::llm::LlmClient;
use std::sync::Arc;

/// Remote-reasoning classification strategy. Builds a strict-JSON prompt
/// around the raw runner output, sends it to the configured provider and
/// normalizes the reply into a `TriageDecision`.
///
/// Every failure mode is an explicit `ClassifyError` value; the resolver
/// matches on it rather than catching propagation.
#[derive(Clone)]
pub struct ExternalTriage {
    client: Option<Arc<dyn LlmClient>>,
}

impl ExternalTriage {
    pub fn new(client: Option<Arc<dyn LlmClient>>) -> Self {
        Self { client }
    }

    pub async fn classify(&self, raw_output: &str) -> Result<TriageDecision, ClassifyError> {
        let client = self.client.as_ref().ok_or_else(|| {
            ClassifyError::Configuration(
                "no remote reasoning client configured (is OPENAI_API_KEY set?)".into(),
            )
        })?;

        let prompt = build_prompt(raw_output);
        let resp = client
            .complete(&prompt)
            .await
            .map_err(ClassifyError::Transport)?;

        let obj = extract_json(&resp.text).ok_or_else(|| {
            ClassifyError::UnparseableResponse(
                "reply does not contain a parseable JSON object".into(),
            )
        })?;

        Ok(normalize(&obj))
    }
}

fn build_prompt(raw_output: &str) -> String {
    format!(
        "You are a senior software engineer performing CI failure triage.\n\
         \n\
         Given test runner failure output, return STRICT JSON ONLY.\n\
         Do NOT include markdown or explanations outside JSON.\n\
         \n\
         Schema:\n\
         - classification: one of [\"code_bug\",\"environment_issue\",\"flaky_test\",\"unknown\"]\n\
         - action: one of [\"retry\",\"create_ticket\",\"escalate\",\"ignore\",\"block_ci\"]\n\
         - block_ci: boolean\n\
         - confidence: number between 0 and 1\n\
         - reason: short 1-2 sentences\n\
         - suspected_files: list of file paths (may be empty)\n\
         - suspected_functions: list of function names (may be empty)\n\
         - root_cause_summary: one concise sentence\n\
         - next_steps: list of concrete engineering actions (strings)\n\
         - recommended_patch: corrected code, only when the fix is obvious\n\
         \n\
         Guidelines:\n\
         - If the failure is deterministic and code-related, block CI.\n\
         - If it looks like an environment issue, do not block CI.\n\
         - Be conservative: if uncertain, leave suspected_files/functions empty.\n\
         \n\
         test_output:\n\
         {raw_output}\n"
    )
}

/// Extract the first balanced `{...}` substring and parse it, tolerating
/// leading/trailing prose around the object. Braces inside JSON strings
/// do not count towards nesting.
fn extract_json(text: &str) -> Option<serde_json::Value> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let candidate = &text[start..start + i + c.len_utf8()];
                    return serde_json::from_str(candidate).ok();
                }
            }
            _ => {}
        }
    }
    None
}

/// Minimal validation: out-of-set values are coerced, missing required
/// fields take their documented defaults, extended fields are kept when
/// they are well-typed.
fn normalize(obj: &serde_json::Value) -> TriageDecision {
    let classification = obj
        .get("classification")
        .and_then(|v| v.as_str())
        .map(Classification::parse)
        .unwrap_or(Classification::Unknown);
    let action = obj
        .get("action")
        .and_then(|v| v.as_str())
        .map(TriageAction::parse)
        .unwrap_or(TriageAction::Escalate);
    let block_ci = obj.get("block_ci").and_then(|v| v.as_bool()).unwrap_or(false);
    let confidence = obj
        .get("confidence")
        .and_then(|v| v.as_f64())
        .unwrap_or(0.5);

    TriageDecision {
        classification,
        action,
        block_ci,
        confidence,
        reason: obj
            .get("reason")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string(),
        suspected_files: string_list(obj.get("suspected_files")),
        suspected_functions: string_list(obj.get("suspected_functions")),
        root_cause_summary: obj
            .get("root_cause_summary")
            .and_then(|v| v.as_str())
            .map(str::to_string),
        next_steps: string_list(obj.get("next_steps")),
        recommended_patch: obj
            .get("recommended_patch")
            .and_then(|v| v.as_str())
            .map(str::to_string),
        engine: None,
        engine_error: None,
    }
}

fn string_list(v: Option<&serde_json::Value>) -> Vec<String> {
    v.and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|x| x.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
