mod analytics;
mod database;
mod errors;
mod logging;
mod root;

pub use analytics::AnalyticsConfig;
pub use database::DatabaseConfig;
pub use errors::ConfigError;
pub use logging::LoggingConfig;
pub use root::{CliOverrides, Config};
