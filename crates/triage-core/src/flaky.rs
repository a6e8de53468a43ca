use crate::storage::Store;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Window parameters for the flaky heuristic.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct FlakyPolicy {
    pub window: u32,
    pub min_occurrences: u32,
}

impl Default for FlakyPolicy {
    fn default() -> Self {
        Self {
            window: 30,
            min_occurrences: 3,
        }
    }
}

/// Per-test pass/fail statistics over the window. Derived on demand,
/// never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlakyStat {
    pub runs: u32,
    pub fails: u32,
    pub passes: u32,
    pub fail_rate: f64,
    pub is_flaky: bool,
}

/// Practical flaky heuristic over the last `window` runs: a test is
/// flaky when it was observed at least `min_occurrences` times and shows
/// BOTH passing and failing outcomes.
///
/// A run that did not collect a test cannot count as a pass or fail for
/// it, so such runs are excluded from that test's denominator.
pub fn compute_flaky_stats(
    store: &Store,
    window: u32,
    min_occurrences: u32,
) -> anyhow::Result<BTreeMap<String, FlakyStat>> {
    let rows = store.recent_for_flaky(window)?;

    let mut universe: BTreeSet<&str> = BTreeSet::new();
    for r in &rows {
        for t in &r.all_tests {
            universe.insert(t.as_str());
        }
    }

    let mut stats = BTreeMap::new();
    for t in universe {
        let mut runs = 0u32;
        let mut fails = 0u32;
        for r in &rows {
            if !r.all_tests.iter().any(|x| x.as_str() == t) {
                continue;
            }
            runs += 1;
            if r.failed_tests.contains(t) {
                fails += 1;
            }
        }
        if runs == 0 {
            continue;
        }
        let passes = runs - fails;
        let fail_rate = round3(f64::from(fails) / f64::from(runs));
        stats.insert(
            t.to_string(),
            FlakyStat {
                runs,
                fails,
                passes,
                fail_rate,
                is_flaky: runs >= min_occurrences && fails > 0 && passes > 0,
            },
        );
    }
    Ok(stats)
}

fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fail_rate_rounds_to_three_decimals() {
        assert_eq!(round3(2.0 / 3.0), 0.667);
        assert_eq!(round3(1.0 / 3.0), 0.333);
        assert_eq!(round3(0.0), 0.0);
        assert_eq!(round3(1.0), 1.0);
    }
}
