use std::collections::BTreeMap;

use tracing::debug;

use super::snapshot::Snapshot;
use super::{SeriesEntry, Severity};

/// Default number of rows in the notable-findings table.
pub const DEFAULT_TOP_N: usize = 10;

/// The `n` most frequently observed Critical vulnerabilities as
/// name-resolved (label, count) rows.
///
/// Count descending; equal counts order alphabetically by plugin name.
/// Returns every distinct plugin when fewer than `n` exist.
pub fn top_critical_by_plugin(snapshot: &Snapshot, n: usize) -> Vec<SeriesEntry> {
    let mut counts: BTreeMap<u64, u64> = BTreeMap::new();
    for finding in snapshot.findings() {
        if finding.severity == Severity::Critical {
            *counts.entry(finding.plugin_id).or_insert(0) += 1;
        }
    }

    let mut rows: Vec<SeriesEntry> = counts
        .into_iter()
        .filter_map(|(plugin_id, count)| {
            snapshot.plugin(plugin_id).map(|plugin| SeriesEntry {
                label: plugin.name.clone(),
                count,
            })
        })
        .collect();
    rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    rows.truncate(n);
    debug!(rows = rows.len(), "ranked critical findings by plugin");
    rows
}
