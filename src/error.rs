//! Typed errors for dataset handling and basket analysis

/// Errors raised while fetching, loading or analysing the datasets.
///
/// Loader and fetch variants are fatal for a run. The basket-analysis
/// variants stay local to the association-rules section of the dashboard.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum DashboardError {
    #[error("dataset unavailable: {path}: {reason}")]
    DatasetUnavailable { path: String, reason: String },

    #[error("dataset malformed: {path}: {reason}")]
    DatasetMalformed { path: String, reason: String },

    #[error("failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("no transactions found for country '{country}'")]
    EmptyDataset { country: String },

    #[error("antecedent {antecedent:?} has zero support")]
    DivisionByZero { antecedent: Vec<String> },

    #[error("invalid {name}: {value} ({constraint})")]
    InvalidThreshold {
        name: &'static str,
        value: f64,
        constraint: &'static str,
    },

    #[error("unknown segment '{segment}', available: {available:?}")]
    UnknownSegment {
        segment: String,
        available: Vec<String>,
    },
}
