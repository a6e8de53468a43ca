use crate::collect::{collect_all_tests, extract_failed_tests, SuiteRunner};
use crate::flaky::{compute_flaky_stats, FlakyPolicy};
use crate::model::{RunDraft, TriageDecision};
use crate::report::RunReport;
use crate::resolver::TriageResolver;
use crate::storage::Store;
use std::sync::Arc;

/// One pipeline invocation: execute the suite, extract a structured
/// result, resolve a triage decision, persist the run, annotate flaky
/// failures and report the CI gate. Strictly sequential; callers run at
/// most one invocation at a time.
pub struct Pipeline {
    pub store: Store,
    pub runner: Arc<dyn SuiteRunner>,
    pub resolver: TriageResolver,
    pub flaky: FlakyPolicy,
}

impl Pipeline {
    pub async fn run_once(&self) -> anyhow::Result<RunReport> {
        let created_at = chrono::Utc::now().to_rfc3339();

        // Discovery degrades to an empty universe; execution failing to
        // spawn at all is fatal.
        let all_tests = collect_all_tests(self.runner.as_ref());
        let (return_code, raw_output) = self.runner.execute()?;
        let failed_tests = extract_failed_tests(&raw_output);
        let ok = return_code == 0;

        if ok {
            let triage = TriageDecision::all_passed();
            let run_id = self.store.insert_run(&RunDraft {
                created_at,
                ok,
                return_code,
                raw_output,
                all_tests,
                failed_tests: failed_tests.clone(),
                triage: triage.clone(),
            })?;
            tracing::info!(event = "run_recorded", run_id, ok = true);
            return Ok(RunReport {
                run_id,
                ok,
                failed_tests,
                flaky_failed_tests: Vec::new(),
                block_ci: false,
                triage,
            });
        }

        let triage = self.resolver.resolve(&raw_output).await;
        let run_id = self.store.insert_run(&RunDraft {
            created_at,
            ok,
            return_code,
            raw_output,
            all_tests,
            failed_tests: failed_tests.clone(),
            triage: triage.clone(),
        })?;

        // Informational only: flakiness never overrides the gate, the
        // decision's block_ci stays the single source of truth.
        let stats =
            compute_flaky_stats(&self.store, self.flaky.window, self.flaky.min_occurrences)?;
        let flaky_failed_tests: Vec<String> = failed_tests
            .iter()
            .filter(|t| stats.get(t.as_str()).is_some_and(|s| s.is_flaky))
            .cloned()
            .collect();

        tracing::info!(
            event = "run_recorded",
            run_id,
            ok = false,
            block_ci = triage.block_ci,
            failed = failed_tests.len(),
        );

        Ok(RunReport {
            run_id,
            ok,
            failed_tests,
            flaky_failed_tests,
            block_ci: triage.block_ci,
            triage,
        })
    }
}
