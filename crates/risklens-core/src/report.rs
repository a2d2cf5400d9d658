use std::fmt::Write;

use anyhow::Result;
use serde::Serialize;
use tracing::instrument;

use crate::engine::snapshot::Snapshot;
use crate::engine::{aggregate, assess, rank, SeriesEntry, Severity};

/// Format styles supported in default reporter implementations.
#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    Human,
    Json,
}

/// Everything the downstream report generator consumes for one pass.
#[derive(Debug, Clone, Serialize)]
pub struct RiskSummary {
    pub title: String,
    pub vulnerable_host_percent: f64,
    pub risk_adjective: String,
    pub severity_histogram: Vec<SeriesEntry>,
    pub service_histogram: Vec<SeriesEntry>,
    pub stig_histogram: Vec<SeriesEntry>,
    pub top_critical: Vec<SeriesEntry>,
    pub top_critical_hosts: Vec<SeriesEntry>,
    pub narrative: String,
    pub skipped_records: u64,
}

impl RiskSummary {
    /// Run the whole pipeline against one snapshot.
    #[instrument(skip(snapshot), fields(findings = snapshot.findings().len()))]
    pub fn build(title: &str, snapshot: &Snapshot) -> Self {
        let percent = assess::vulnerable_host_percent(snapshot);
        Self {
            title: title.to_string(),
            vulnerable_host_percent: percent,
            risk_adjective: assess::risk_adjective(percent).to_string(),
            severity_histogram: aggregate::severity_histogram(snapshot),
            service_histogram: aggregate::service_histogram(
                snapshot,
                aggregate::DEFAULT_GROUP_LIMIT,
            ),
            stig_histogram: aggregate::stig_histogram(snapshot),
            top_critical: rank::top_critical_by_plugin(snapshot, rank::DEFAULT_TOP_N),
            top_critical_hosts: aggregate::host_histogram(
                snapshot,
                Severity::Critical,
                aggregate::DEFAULT_GROUP_LIMIT,
            ),
            narrative: severity_narrative(title, snapshot),
            skipped_records: snapshot.skipped_records(),
        }
    }
}

/// Fixed multi-paragraph narrative describing the network's severity
/// posture. Deterministic for a given snapshot and title.
pub fn severity_narrative(title: &str, snapshot: &Snapshot) -> String {
    let percent = assess::vulnerable_host_percent(snapshot);
    let adjective = assess::risk_adjective(percent);
    let block = assess::risk_narrative_block(percent);

    let paragraphs = [
        format!(
            "This bar graph is a representation of the findings by severity; the graph \
             shows that, overall, {title} has a {adjective} handle on the patch management \
             of the network."
        ),
        format!(
            "The majority of the critical findings were found on {percent}% of the total \
             assessed computers. {block}",
            percent = percent.round()
        ),
        "The systems with critical vulnerabilities represent the largest threat to the \
         network, so patching this group is paramount to the overall network security. It \
         only takes one vulnerability to create a security incident."
            .to_string(),
        "It should be noted that low findings and open ports represent the discovery of \
         network services and open ports. Typically, these are not an indication of a \
         serious problem and pose little to no threat. However, the correlation of data \
         between the different severity levels could be used to determine degree of \
         vulnerability for a given system."
            .to_string(),
    ];
    paragraphs.join("\n\n")
}

/// Fixed paragraph accompanying the findings-by-service chart.
pub fn service_narrative() -> &'static str {
    "This graph is a representation of the findings found by service. This graph can help \
     understand what services are running on the network and if they are vulnerable, where \
     the risks are and how they should be protected."
}

/// Produce a report string from a `RiskSummary` using the desired format.
pub fn render_summary(summary: &RiskSummary, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Human => render_human(summary),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(summary)?),
    }
}

fn render_human(summary: &RiskSummary) -> Result<String> {
    let mut out = String::new();
    writeln!(out, "Risk Summary: {}", summary.title)?;
    writeln!(
        out,
        "Vulnerable Hosts: {:.1}% ({})",
        summary.vulnerable_host_percent, summary.risk_adjective
    )?;
    if summary.skipped_records > 0 {
        writeln!(out, "Skipped Records: {}", summary.skipped_records)?;
    }
    writeln!(out)?;

    writeln!(out, "Findings By Severity:")?;
    for entry in &summary.severity_histogram {
        writeln!(
            out,
            "  - {label:>13}: {count}",
            label = entry.label,
            count = entry.count
        )?;
    }

    writeln!(out)?;
    if summary.top_critical.is_empty() {
        writeln!(out, "No critical findings detected.")?;
    } else {
        writeln!(out, "Top Critical Findings:")?;
        for entry in &summary.top_critical {
            writeln!(out, "  - {}: {}", entry.label, entry.count)?;
        }
    }

    if !summary.service_histogram.is_empty() {
        writeln!(out)?;
        writeln!(out, "Findings By Service:")?;
        for entry in &summary.service_histogram {
            writeln!(out, "  - {}: {}", entry.label, entry.count)?;
        }
    }

    writeln!(out)?;
    writeln!(out, "STIG Categories:")?;
    for entry in &summary.stig_histogram {
        writeln!(out, "  - {}: {}", entry.label, entry.count)?;
    }

    writeln!(out)?;
    writeln!(out, "{}", summary.narrative)?;
    Ok(out)
}
