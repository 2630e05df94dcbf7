use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Invalid time range: {0}")]
    InvalidTimeRange(String),

    #[error("Invalid granularity: {0}")]
    InvalidGranularity(String),

    #[error("Invalid report filter: {0}")]
    InvalidFilter(String),

    #[error("Aggregates cannot answer this query: {0}")]
    AggregatesUnavailable(String),

    #[error("Aggregation failed for bucket {bucket}: {reason}")]
    AggregationFailed { bucket: String, reason: String },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Query timeout")]
    QueryTimeout,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}
