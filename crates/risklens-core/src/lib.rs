pub mod engine;
pub mod report;

pub use engine::snapshot::Snapshot;
pub use engine::{
    aggregate, assess, filter_by_severity, filter_by_severities, rank, Finding,
    FindingRecord, Host, InvalidSeverity, InvalidStigCategory, Plugin, RecordError,
    SeriesEntry, Severity, StigCategory, PLACEHOLDER_PLUGIN_ID,
};
pub use report::{
    render_summary, service_narrative, severity_narrative, OutputFormat, RiskSummary,
};
