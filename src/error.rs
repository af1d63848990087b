//! Error types for modelscout.

/// Result type alias for modelscout operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for modelscout.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Candidate list is empty")]
    EmptyCandidateList,

    #[error(
        "No eligible candidates among {total} (min_context_capacity: {}, max_average_cost: {})",
        fmt_opt(.min_context_capacity),
        fmt_opt(.max_average_cost)
    )]
    NoEligibleCandidates {
        total: usize,
        min_context_capacity: Option<u64>,
        max_average_cost: Option<f64>,
    },

    #[error("Invalid candidate '{identifier}': {reason}")]
    InvalidCandidate { identifier: String, reason: String },

    #[error("Invalid requirements: {0}")]
    InvalidRequirements(String),

    #[error("Unknown role '{0}'")]
    UnknownRole(String),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Catalog fetch timed out after {0:?}")]
    CatalogTimeout(std::time::Duration),

    #[error("Upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),
}

fn fmt_opt<T: std::fmt::Display>(value: &Option<T>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "none".to_string(),
    }
}
