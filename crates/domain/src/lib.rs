//! Ferrous Analytics Domain Layer
pub mod aggregate;
pub mod config;
pub mod errors;
pub mod granularity;
pub mod outcome;
pub mod overview;
pub mod report;
pub mod time_range;

pub use aggregate::AggregateRow;
pub use config::{AnalyticsConfig, CliOverrides, Config, ConfigError, DatabaseConfig, LoggingConfig};
pub use errors::DomainError;
pub use granularity::Granularity;
pub use outcome::{CategoryCounts, OutcomeCategory, OutcomePage, OutcomeRecord};
pub use overview::{LatencyPoint, NodeHealthCounts, OverviewResult, StatusCount};
pub use report::{FilterField, ReportFilter, ReportResult, ReportSource, TimeSlot};
pub use time_range::TimeRange;
