use crate::report::RunReport;

pub fn print_summary(report: &RunReport) {
    if report.ok {
        eprintln!("run {}: all tests passed", report.run_id);
        return;
    }

    for t in &report.failed_tests {
        if report.flaky_failed_tests.contains(t) {
            eprintln!("FAIL [{}] (flaky in recent history)", t);
        } else {
            eprintln!("FAIL [{}]", t);
        }
    }

    let engine = match report.triage.engine {
        Some(crate::model::Engine::External) => "external",
        Some(crate::model::Engine::Rules) => "rules",
        None => "-",
    };
    eprintln!(
        "run {}: failed={} classification={} action={} confidence={:.2} engine={} gate={}",
        report.run_id,
        report.failed_tests.len(),
        report.triage.classification.as_str(),
        report.triage.action.as_str(),
        report.triage.confidence,
        engine,
        if report.block_ci { "BLOCK" } else { "PASS" },
    );
}
