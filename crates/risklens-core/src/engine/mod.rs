use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod aggregate;
pub mod assess;
pub mod rank;
pub mod snapshot;

/// Plugin id reserved for the informational ping check. It confirms a host
/// answered the scanner and carries no vulnerability signal, so per-plugin
/// and per-host rankings exclude it.
pub const PLACEHOLDER_PLUGIN_ID: u64 = 1;

/// Severity tiers assigned by the scanner, ordered low to high.
///
/// The discriminants match the raw severity codes (0–4) used on the wire.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub enum Severity {
    Informational,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Every tier, low to high; passing this to [`filter_by_severities`]
    /// yields the all-risks view.
    pub const ALL: [Severity; 5] = [
        Severity::Informational,
        Severity::Low,
        Severity::Medium,
        Severity::High,
        Severity::Critical,
    ];

    /// Map a raw severity code to its tier.
    pub fn from_code(code: u8) -> Result<Self, InvalidSeverity> {
        match code {
            0 => Ok(Self::Informational),
            1 => Ok(Self::Low),
            2 => Ok(Self::Medium),
            3 => Ok(Self::High),
            4 => Ok(Self::Critical),
            _ => Err(InvalidSeverity { code }),
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Informational => "Informational",
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Critical => "Critical",
        }
    }
}

impl TryFrom<u8> for Severity {
    type Error = InvalidSeverity;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::from_code(code)
    }
}

impl From<Severity> for u8 {
    fn from(severity: Severity) -> u8 {
        severity.code()
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Error produced when a severity code falls outside the supported range.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("severity code {code} is outside the supported range 0..=4")]
pub struct InvalidSeverity {
    pub code: u8,
}

/// DISA STIG compliance category, independent of the numeric severity tier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum StigCategory {
    I,
    II,
    III,
}

impl StigCategory {
    pub fn label(self) -> &'static str {
        match self {
            Self::I => "I",
            Self::II => "II",
            Self::III => "III",
        }
    }
}

impl std::fmt::Display for StigCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unrecognized STIG category `{0}`; expected I, II, or III")]
pub struct InvalidStigCategory(pub String);

impl std::str::FromStr for StigCategory {
    type Err = InvalidStigCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "I" => Ok(Self::I),
            "II" => Ok(Self::II),
            "III" => Ok(Self::III),
            other => Err(InvalidStigCategory(other.to_string())),
        }
    }
}

/// One observed vulnerability instance exactly as the persistence layer
/// hands it over, severity still a raw code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FindingRecord {
    pub id: u64,
    pub host_id: u64,
    pub plugin_id: u64,
    pub severity: u8,
    pub service: String,
}

/// One observed vulnerability instance on one host. Immutable for the
/// duration of a reporting pass.
#[derive(Debug, Clone, Serialize)]
pub struct Finding {
    pub id: u64,
    pub host_id: u64,
    pub plugin_id: u64,
    pub severity: Severity,
    pub service: String,
}

impl Finding {
    /// Promote a raw record, validating the severity code.
    pub fn from_record(record: FindingRecord) -> Result<Self, RecordError> {
        let severity = Severity::from_code(record.severity)
            .map_err(|source| RecordError::InvalidSeverity {
                finding_id: record.id,
                source,
            })?;
        Ok(Self {
            id: record.id,
            host_id: record.host_id,
            plugin_id: record.plugin_id,
            severity,
            service: record.service,
        })
    }
}

/// Errors emitted while promoting raw records into the snapshot.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("finding {finding_id}: {source}")]
    InvalidSeverity {
        finding_id: u64,
        #[source]
        source: InvalidSeverity,
    },
}

/// A scanned host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Host {
    pub id: u64,
    pub name: String,
}

/// A vulnerability definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plugin {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub cvss_base_score: Option<f32>,
    #[serde(default)]
    pub stig_category: Option<StigCategory>,
}

/// Chart-ready (label, count) pair consumed by external renderers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesEntry {
    pub label: String,
    pub count: u64,
}

/// Findings carrying exactly the given tier.
pub fn filter_by_severity(findings: &[Finding], tier: Severity) -> Vec<&Finding> {
    findings.iter().filter(|f| f.severity == tier).collect()
}

/// Findings matching any tier in `tiers`.
pub fn filter_by_severities<'a>(
    findings: &'a [Finding],
    tiers: &[Severity],
) -> Vec<&'a Finding> {
    findings
        .iter()
        .filter(|f| tiers.contains(&f.severity))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(id: u64, severity: Severity) -> Finding {
        Finding {
            id,
            host_id: 1,
            plugin_id: 100 + id,
            severity,
            service: "www".into(),
        }
    }

    #[test]
    fn from_code_maps_every_tier() {
        assert_eq!(Severity::from_code(0).unwrap(), Severity::Informational);
        assert_eq!(Severity::from_code(4).unwrap(), Severity::Critical);
        assert_eq!(Severity::from_code(4).unwrap().code(), 4);
    }

    #[test]
    fn from_code_rejects_out_of_range() {
        let err = Severity::from_code(9).expect_err("code 9 should be invalid");
        assert_eq!(err, InvalidSeverity { code: 9 });
    }

    #[test]
    fn tiers_order_low_to_high() {
        assert!(Severity::Informational < Severity::Low);
        assert!(Severity::High < Severity::Critical);
        assert!(Severity::High >= Severity::High);
    }

    #[test]
    fn record_promotion_carries_finding_context() {
        let record = FindingRecord {
            id: 42,
            host_id: 1,
            plugin_id: 2,
            severity: 7,
            service: "www".into(),
        };
        let err = Finding::from_record(record).expect_err("severity 7 should fail");
        assert!(matches!(
            err,
            RecordError::InvalidSeverity { finding_id: 42, source } if source.code == 7
        ));
    }

    #[test]
    fn tier_filters_partition_the_finding_set() {
        let findings: Vec<_> = [
            Severity::Critical,
            Severity::Critical,
            Severity::High,
            Severity::Low,
            Severity::Informational,
        ]
        .iter()
        .enumerate()
        .map(|(idx, tier)| finding(idx as u64 + 1, *tier))
        .collect();

        let per_tier: usize = Severity::ALL
            .iter()
            .map(|tier| filter_by_severity(&findings, *tier).len())
            .sum();
        assert_eq!(per_tier, findings.len());

        let all = filter_by_severities(&findings, &Severity::ALL);
        assert_eq!(all.len(), findings.len());

        let high_and_up =
            filter_by_severities(&findings, &[Severity::High, Severity::Critical]);
        assert_eq!(high_and_up.len(), 3);
    }

    #[test]
    fn stig_category_parses_trimmed_labels() {
        assert_eq!(" II ".parse::<StigCategory>().unwrap(), StigCategory::II);
        assert!("IV".parse::<StigCategory>().is_err());
    }
}
