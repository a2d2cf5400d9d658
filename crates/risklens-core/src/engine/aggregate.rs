use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::snapshot::Snapshot;
use super::{
    filter_by_severity, Finding, SeriesEntry, Severity, StigCategory,
    PLACEHOLDER_PLUGIN_ID,
};

/// Default row cap for truncated groupings.
pub const DEFAULT_GROUP_LIMIT: usize = 10;

/// One deduplicated vulnerability: every finding sharing this plugin id,
/// irrespective of how many hosts exhibit it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginGroup {
    pub plugin_id: u64,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostGroup {
    pub host_id: u64,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceGroup {
    pub service: String,
    pub count: u64,
}

fn count_by_plugin<'a>(findings: impl IntoIterator<Item = &'a Finding>) -> BTreeMap<u64, u64> {
    let mut counts = BTreeMap::new();
    for finding in findings {
        *counts.entry(finding.plugin_id).or_insert(0) += 1;
    }
    counts
}

fn sort_groups_by_count(counts: BTreeMap<u64, u64>) -> Vec<PluginGroup> {
    let mut groups: Vec<PluginGroup> = counts
        .into_iter()
        .map(|(plugin_id, count)| PluginGroup { plugin_id, count })
        .collect();
    groups.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.plugin_id.cmp(&b.plugin_id)));
    groups
}

fn cvss_order(snapshot: &Snapshot, a: u64, b: u64) -> Ordering {
    let score = |id: u64| snapshot.plugin(id).and_then(|p| p.cvss_base_score);
    // Unscored plugins sort after every scored one.
    match (score(a), score(b)) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// One row per distinct plugin at `tier`, ordered by the plugin's CVSS base
/// score ascending; remaining ties fall back to plugin id ascending.
pub fn unique_by_plugin(snapshot: &Snapshot, tier: Severity) -> Vec<PluginGroup> {
    let counts = count_by_plugin(filter_by_severity(snapshot.findings(), tier));
    let mut groups: Vec<PluginGroup> = counts
        .into_iter()
        .map(|(plugin_id, count)| PluginGroup { plugin_id, count })
        .collect();
    groups.sort_by(|a, b| {
        cvss_order(snapshot, a.plugin_id, b.plugin_id)
            .then_with(|| a.plugin_id.cmp(&b.plugin_id))
    });
    trace!(tier = %tier, rows = groups.len(), "grouped unique risks by plugin");
    groups
}

/// Same grouping as [`unique_by_plugin`], ordered by occurrence count
/// descending; ties break toward the lower plugin id.
pub fn unique_by_plugin_sorted_by_count(
    snapshot: &Snapshot,
    tier: Severity,
) -> Vec<PluginGroup> {
    sort_groups_by_count(count_by_plugin(filter_by_severity(snapshot.findings(), tier)))
}

/// Every tier at once, deduplicated by plugin and ordered by count
/// descending.
pub fn all_unique_sorted_by_count(snapshot: &Snapshot) -> Vec<PluginGroup> {
    sort_groups_by_count(count_by_plugin(snapshot.findings()))
}

/// Findings grouped by service, skipping the `unknown` and `general`
/// placeholders reported for unidentified services. Count descending, ties
/// alphabetical, truncated to `limit`.
pub fn by_service(snapshot: &Snapshot, limit: usize) -> Vec<ServiceGroup> {
    let mut counts: BTreeMap<&str, u64> = BTreeMap::new();
    for finding in snapshot.findings() {
        if finding.service == "unknown" || finding.service == "general" {
            continue;
        }
        *counts.entry(finding.service.as_str()).or_insert(0) += 1;
    }
    let mut groups: Vec<ServiceGroup> = counts
        .into_iter()
        .map(|(service, count)| ServiceGroup {
            service: service.to_string(),
            count,
        })
        .collect();
    groups.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.service.cmp(&b.service)));
    groups.truncate(limit);
    groups
}

/// Plugins with the most findings at `tier`, the placeholder ping check
/// excluded. Count descending, ties by plugin id, truncated to `limit`.
pub fn by_plugin_excluding_placeholder(
    snapshot: &Snapshot,
    tier: Severity,
    limit: usize,
) -> Vec<PluginGroup> {
    let counts = count_by_plugin(
        snapshot
            .findings()
            .iter()
            .filter(|f| f.plugin_id != PLACEHOLDER_PLUGIN_ID && f.severity == tier),
    );
    let mut groups = sort_groups_by_count(counts);
    groups.truncate(limit);
    groups
}

/// Hosts carrying the most findings at `tier`, the placeholder ping check
/// excluded. Count descending, ties by host id, truncated to `limit`.
pub fn by_host_excluding_placeholder(
    snapshot: &Snapshot,
    tier: Severity,
    limit: usize,
) -> Vec<HostGroup> {
    let mut counts: BTreeMap<u64, u64> = BTreeMap::new();
    for finding in snapshot.findings() {
        if finding.plugin_id == PLACEHOLDER_PLUGIN_ID || finding.severity != tier {
            continue;
        }
        *counts.entry(finding.host_id).or_insert(0) += 1;
    }
    let mut groups: Vec<HostGroup> = counts
        .into_iter()
        .map(|(host_id, count)| HostGroup { host_id, count })
        .collect();
    groups.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.host_id.cmp(&b.host_id)));
    groups.truncate(limit);
    groups
}

/// Findings whose plugin carries the requested STIG category, most severe
/// first; equal severities keep finding-id order.
pub fn findings_by_stig_category(
    snapshot: &Snapshot,
    category: StigCategory,
) -> Vec<&Finding> {
    let mut findings: Vec<&Finding> = snapshot
        .findings()
        .iter()
        .filter(|f| {
            snapshot
                .plugin(f.plugin_id)
                .map_or(false, |p| p.stig_category == Some(category))
        })
        .collect();
    findings.sort_by(|a, b| b.severity.cmp(&a.severity).then_with(|| a.id.cmp(&b.id)));
    findings
}

/// Findings per tier in chart order, most severe first. The five counts
/// sum to the snapshot's finding total.
pub fn severity_histogram(snapshot: &Snapshot) -> Vec<SeriesEntry> {
    let counts = snapshot.severity_counts();
    Severity::ALL
        .iter()
        .rev()
        .map(|tier| SeriesEntry {
            label: tier.label().to_string(),
            count: counts[tier.code() as usize],
        })
        .collect()
}

/// Service distribution as a chart-ready series.
pub fn service_histogram(snapshot: &Snapshot, limit: usize) -> Vec<SeriesEntry> {
    by_service(snapshot, limit)
        .into_iter()
        .map(|group| SeriesEntry {
            label: group.service,
            count: group.count,
        })
        .collect()
}

/// Cat I/II/III finding counts as a chart-ready series.
pub fn stig_histogram(snapshot: &Snapshot) -> Vec<SeriesEntry> {
    [StigCategory::I, StigCategory::II, StigCategory::III]
        .iter()
        .map(|category| SeriesEntry {
            label: format!("Cat {category}"),
            count: findings_by_stig_category(snapshot, *category).len() as u64,
        })
        .collect()
}

/// Hosts with the most findings at `tier` as a name-resolved series.
pub fn host_histogram(snapshot: &Snapshot, tier: Severity, limit: usize) -> Vec<SeriesEntry> {
    by_host_excluding_placeholder(snapshot, tier, limit)
        .into_iter()
        .filter_map(|group| {
            snapshot.host(group.host_id).map(|host| SeriesEntry {
                label: host.name.clone(),
                count: group.count,
            })
        })
        .collect()
}
