use crate::model::normalize_ids;
use anyhow::Context;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::process::Command;
use std::sync::OnceLock;

/// Seam between the pipeline and the real test runner. `collect` is the
/// discovery-only invocation, `execute` runs the suite for real. Both
/// return the process exit code and the merged stdout+stderr text.
pub trait SuiteRunner: Send + Sync {
    fn collect(&self) -> anyhow::Result<(i32, String)>;
    fn execute(&self) -> anyhow::Result<(i32, String)>;
}

/// Invokes pytest (or a pytest-compatible runner) as a subprocess.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PytestRunner {
    pub program: String,
    pub args: Vec<String>,
    pub collect_args: Vec<String>,
}

impl Default for PytestRunner {
    fn default() -> Self {
        Self {
            program: "pytest".into(),
            args: vec!["-q".into()],
            collect_args: vec!["--collect-only".into(), "-q".into()],
        }
    }
}

impl PytestRunner {
    fn run(&self, args: &[String]) -> anyhow::Result<(i32, String)> {
        let out = Command::new(&self.program)
            .args(args)
            .output()
            .with_context(|| format!("failed to invoke test runner '{}'", self.program))?;
        let mut raw = String::from_utf8_lossy(&out.stdout).into_owned();
        raw.push('\n');
        raw.push_str(&String::from_utf8_lossy(&out.stderr));
        Ok((out.status.code().unwrap_or(-1), raw))
    }
}

impl SuiteRunner for PytestRunner {
    fn collect(&self) -> anyhow::Result<(i32, String)> {
        self.run(&self.collect_args)
    }

    fn execute(&self) -> anyhow::Result<(i32, String)> {
        self.run(&self.args)
    }
}

/// Collect the universe of test identifiers via the discovery invocation.
///
/// Discovery failure degrades to an empty universe rather than erroring;
/// downstream flaky statistics simply treat the run as not having
/// observed any test.
pub fn collect_all_tests(runner: &dyn SuiteRunner) -> Vec<String> {
    match runner.collect() {
        Ok((_, raw)) => parse_collected(&raw),
        Err(e) => {
            tracing::warn!(event = "collect_degraded", error = %e);
            Vec::new()
        }
    }
}

/// Parse discovery output into a deduplicated, sorted identifier list.
/// Typical lines look like `app_under_test/test_buggy.py::test_divide_ok`.
pub fn parse_collected(raw: &str) -> Vec<String> {
    let mut tests = Vec::new();
    for line in raw.lines() {
        let line = line.trim();
        if line.contains("::") && !line.starts_with('<') && !line.starts_with("ERROR") {
            tests.push(line.to_string());
        }
    }
    normalize_ids(tests)
}

fn failed_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^FAILED\s+(\S+)\s+-\s+").unwrap())
}

/// Extract failed identifiers from the runner's standard summary lines:
/// `FAILED path/to/test.py::test_name - reason`. Malformed or truncated
/// output degrades to fewer detected failures, never to an error.
pub fn extract_failed_tests(raw: &str) -> Vec<String> {
    let ids = failed_re()
        .captures_iter(raw)
        .map(|c| c[1].to_string())
        .collect();
    normalize_ids(ids)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_failed_summary_lines() {
        let raw = "\
app/test_buggy.py::test_divide_zero FAILED\n\
=== short test summary info ===\n\
FAILED app/test_buggy.py::test_divide_zero - ZeroDivisionError: division by zero\n\
FAILED app/test_buggy.py::test_lookup - KeyError: 'x'\n\
FAILED app/test_buggy.py::test_lookup - KeyError: 'x'\n";
        assert_eq!(
            extract_failed_tests(raw),
            vec![
                "app/test_buggy.py::test_divide_zero".to_string(),
                "app/test_buggy.py::test_lookup".to_string(),
            ]
        );
    }

    #[test]
    fn no_summary_lines_yields_empty_set() {
        assert!(extract_failed_tests("").is_empty());
        assert!(extract_failed_tests("2 passed in 0.01s\n").is_empty());
        // A FAILED token that is not a summary line must not match.
        assert!(extract_failed_tests("the word FAILED appears mid-line\n").is_empty());
    }

    #[test]
    fn parses_collected_nodeids() {
        let raw = "\
app/test_buggy.py::test_divide_ok\n\
app/test_buggy.py::test_divide_zero\n\
<Module app/test_buggy.py>\n\
ERROR app/test_broken.py::boom\n\
app/test_buggy.py::test_divide_ok\n\
\n\
2 tests collected in 0.01s\n";
        assert_eq!(
            parse_collected(raw),
            vec![
                "app/test_buggy.py::test_divide_ok".to_string(),
                "app/test_buggy.py::test_divide_zero".to_string(),
            ]
        );
    }
}
