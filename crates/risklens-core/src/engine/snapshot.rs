use std::collections::BTreeMap;

use once_cell::sync::OnceCell;
use tracing::{debug, instrument, warn};

use super::{Finding, FindingRecord, Host, Plugin, RecordError, Severity};

/// Read-consistent view of one reporting pass.
///
/// The finding, host, and plugin collections are loaded exactly once;
/// every aggregate derives from the same materialized data, so counts stay
/// consistent across the whole report even if the backing store changes
/// mid-pass.
#[derive(Debug)]
pub struct Snapshot {
    findings: Vec<Finding>,
    hosts: BTreeMap<u64, Host>,
    plugins: BTreeMap<u64, Plugin>,
    skipped_records: u64,
    severity_counts: OnceCell<[u64; 5]>,
}

impl Snapshot {
    /// Build the snapshot, promoting raw finding records and dropping any
    /// record that references a missing host or plugin.
    ///
    /// An out-of-range severity code fails the whole pass with
    /// [`RecordError::InvalidSeverity`]; dangling references never abort and
    /// are surfaced through [`Snapshot::skipped_records`].
    #[instrument(
        skip_all,
        fields(
            findings = records.len(),
            hosts = hosts.len(),
            plugins = plugins.len()
        )
    )]
    pub fn new(
        records: Vec<FindingRecord>,
        hosts: Vec<Host>,
        plugins: Vec<Plugin>,
    ) -> Result<Self, RecordError> {
        let hosts: BTreeMap<u64, Host> = hosts.into_iter().map(|h| (h.id, h)).collect();
        let plugins: BTreeMap<u64, Plugin> =
            plugins.into_iter().map(|p| (p.id, p)).collect();

        let mut findings = Vec::with_capacity(records.len());
        let mut skipped_records = 0u64;
        for record in records {
            let finding = Finding::from_record(record)?;
            if !hosts.contains_key(&finding.host_id) {
                debug!(
                    finding = finding.id,
                    host = finding.host_id,
                    "dropping finding that references an unknown host"
                );
                skipped_records += 1;
                continue;
            }
            if !plugins.contains_key(&finding.plugin_id) {
                debug!(
                    finding = finding.id,
                    plugin = finding.plugin_id,
                    "dropping finding that references an unknown plugin"
                );
                skipped_records += 1;
                continue;
            }
            findings.push(finding);
        }
        if skipped_records > 0 {
            warn!(
                skipped = skipped_records,
                "snapshot dropped findings with dangling references"
            );
        }

        Ok(Self {
            findings,
            hosts,
            plugins,
            skipped_records,
            severity_counts: OnceCell::new(),
        })
    }

    /// Every valid finding, in ingestion order.
    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    pub fn host(&self, id: u64) -> Option<&Host> {
        self.hosts.get(&id)
    }

    pub fn plugin(&self, id: u64) -> Option<&Plugin> {
        self.plugins.get(&id)
    }

    /// Hosts in id order.
    pub fn hosts(&self) -> impl Iterator<Item = &Host> {
        self.hosts.values()
    }

    pub fn host_count(&self) -> u64 {
        self.hosts.len() as u64
    }

    /// Findings dropped during construction because of dangling references.
    pub fn skipped_records(&self) -> u64 {
        self.skipped_records
    }

    /// Occurrence count per tier, indexed by severity code. Computed once
    /// per snapshot and cached.
    pub fn severity_counts(&self) -> [u64; 5] {
        *self.severity_counts.get_or_init(|| {
            let mut counts = [0u64; 5];
            for finding in &self.findings {
                counts[finding.severity.code() as usize] += 1;
            }
            counts
        })
    }

    pub fn severity_count(&self, tier: Severity) -> u64 {
        self.severity_counts()[tier.code() as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host(id: u64) -> Host {
        Host {
            id,
            name: format!("10.0.0.{id}"),
        }
    }

    fn plugin(id: u64, name: &str) -> Plugin {
        Plugin {
            id,
            name: name.into(),
            cvss_base_score: None,
            stig_category: None,
        }
    }

    fn record(id: u64, host_id: u64, plugin_id: u64, severity: u8) -> FindingRecord {
        FindingRecord {
            id,
            host_id,
            plugin_id,
            severity,
            service: "www".into(),
        }
    }

    #[test]
    fn dangling_references_are_skipped_and_counted() {
        let snapshot = Snapshot::new(
            vec![
                record(1, 1, 10, 4),
                record(2, 99, 10, 4),
                record(3, 1, 99, 3),
            ],
            vec![host(1)],
            vec![plugin(10, "Obsolete Web Server")],
        )
        .unwrap();

        assert_eq!(snapshot.findings().len(), 1);
        assert_eq!(snapshot.skipped_records(), 2);
    }

    #[test]
    fn invalid_severity_fails_the_whole_pass() {
        let err = Snapshot::new(
            vec![record(1, 1, 10, 4), record(2, 1, 10, 5)],
            vec![host(1)],
            vec![plugin(10, "Obsolete Web Server")],
        )
        .expect_err("severity 5 should fail construction");
        assert!(matches!(
            err,
            RecordError::InvalidSeverity { finding_id: 2, source } if source.code == 5
        ));
    }

    #[test]
    fn severity_counts_sum_to_finding_total() {
        let snapshot = Snapshot::new(
            vec![
                record(1, 1, 10, 4),
                record(2, 1, 10, 4),
                record(3, 2, 10, 2),
                record(4, 2, 10, 0),
            ],
            vec![host(1), host(2)],
            vec![plugin(10, "Obsolete Web Server")],
        )
        .unwrap();

        let counts = snapshot.severity_counts();
        assert_eq!(counts.iter().sum::<u64>(), snapshot.findings().len() as u64);
        assert_eq!(snapshot.severity_count(Severity::Critical), 2);
        assert_eq!(snapshot.severity_count(Severity::High), 0);
    }

    #[test]
    fn empty_inputs_build_an_empty_snapshot() {
        let snapshot = Snapshot::new(Vec::new(), Vec::new(), Vec::new()).unwrap();
        assert!(snapshot.findings().is_empty());
        assert_eq!(snapshot.host_count(), 0);
        assert_eq!(snapshot.skipped_records(), 0);
        assert_eq!(snapshot.severity_counts(), [0; 5]);
    }
}
