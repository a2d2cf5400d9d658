use std::collections::BTreeSet;

use super::snapshot::Snapshot;
use super::Severity;

/// Upper bound of one band on a qualitative scale.
struct Breakpoint {
    upper: f64,
    inclusive: bool,
}

const ADJECTIVE_SCALE: [(Breakpoint, &str); 4] = [
    (Breakpoint { upper: 5.0, inclusive: true }, "excellent"),
    (Breakpoint { upper: 10.0, inclusive: true }, "great"),
    (Breakpoint { upper: 15.0, inclusive: true }, "good"),
    (Breakpoint { upper: 20.0, inclusive: true }, "fair"),
];
const ADJECTIVE_OVERFLOW: &str = "poor";

const WORKING_WELL: &str = "This implies that only a handful of computers are missing \
    patches, and the current patch management is working well.";
const MINOR_ISSUE: &str = "This implies that there is a minor patch management issue. If \
    there is a patch management system, it should be checked for problems. Each host \
    should also be inspected to be certain it can receive patches.";
const SUBSTANTIAL_ISSUE: &str = "This implies that there is a substantial patch management \
    issue. If there is a patch management system, it should be checked for problems. Each \
    host should also be inspected to be certain it can receive patches.";
const SIGNIFICANT_ISSUE: &str = "This implies that there is a significant patch management \
    issue. If there is a patch management system, it should be checked for problems. Each \
    host should also be inspected to be certain it can receive patches.";
const CRITICAL_PROBLEM: &str = "This implies that there is a critical patch management \
    problem on the network. Any patch management solutions should be inspected for issues \
    and they should be corrected as soon as possible. Each host should also be inspected \
    to be certain it can receive patches.";

const NARRATIVE_SCALE: [(Breakpoint, &str); 4] = [
    (Breakpoint { upper: 6.0, inclusive: false }, WORKING_WELL),
    (Breakpoint { upper: 11.0, inclusive: false }, MINOR_ISSUE),
    (Breakpoint { upper: 16.0, inclusive: false }, SUBSTANTIAL_ISSUE),
    (Breakpoint { upper: 20.0, inclusive: true }, SIGNIFICANT_ISSUE),
];
const NARRATIVE_OVERFLOW: &str = CRITICAL_PROBLEM;

fn scale_lookup(
    scale: &'static [(Breakpoint, &'static str)],
    overflow: &'static str,
    percent: f64,
) -> &'static str {
    for (breakpoint, value) in scale {
        let within = if breakpoint.inclusive {
            percent <= breakpoint.upper
        } else {
            percent < breakpoint.upper
        };
        if within {
            return value;
        }
    }
    overflow
}

/// Share of hosts carrying at least one High or Critical finding, as a
/// percentage of every assessed host. An empty host set yields 0.
pub fn vulnerable_host_percent(snapshot: &Snapshot) -> f64 {
    let total = snapshot.host_count();
    if total == 0 {
        return 0.0;
    }
    let exposed: BTreeSet<u64> = snapshot
        .findings()
        .iter()
        .filter(|f| f.severity >= Severity::High)
        .map(|f| f.host_id)
        .collect();
    (exposed.len() as f64 / total as f64) * 100.0
}

/// Qualitative rating for a vulnerable-host percentage.
pub fn risk_adjective(percent: f64) -> &'static str {
    scale_lookup(&ADJECTIVE_SCALE, ADJECTIVE_OVERFLOW, percent)
}

/// Guidance paragraph matching a vulnerable-host percentage.
pub fn risk_narrative_block(percent: f64) -> &'static str {
    scale_lookup(&NARRATIVE_SCALE, NARRATIVE_OVERFLOW, percent)
}
