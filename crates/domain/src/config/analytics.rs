use crate::Granularity;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Aggregation cadence and report cache tuning.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnalyticsConfig {
    /// Seconds between two aggregation sweeps.
    #[serde(default = "default_aggregation_interval_secs")]
    pub aggregation_interval_secs: u64,

    /// How far back each sweep recomputes buckets.
    #[serde(default = "default_aggregation_lookback_days")]
    pub aggregation_lookback_days: u32,

    /// The newest minutes left to the next sweep, so buckets still receiving
    /// writes are not rolled up too early.
    #[serde(default = "default_aggregation_safety_margin_minutes")]
    pub aggregation_safety_margin_minutes: u32,

    #[serde(default = "default_aggregation_granularities")]
    pub aggregation_granularities: Vec<Granularity>,

    #[serde(default = "default_cache_ttl_minutes")]
    pub default_cache_ttl_minutes: u64,

    #[serde(default = "default_short_cache_ttl_minutes")]
    pub short_cache_ttl_minutes: u64,

    /// Windows ending less than this many minutes ago are always answered from raw records.
    #[serde(default = "default_recency_threshold_minutes")]
    pub recency_threshold_minutes: u64,

    #[serde(default = "default_cache_maintenance_interval_secs")]
    pub cache_maintenance_interval_secs: u64,

    /// Read by the route configuration editor; not used by analytics.
    #[serde(default = "default_max_tracked_backups")]
    pub max_tracked_backups: u32,
}

impl AnalyticsConfig {
    pub fn default_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.default_cache_ttl_minutes * 60)
    }

    pub fn short_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.short_cache_ttl_minutes * 60)
    }

    pub fn recency_threshold(&self) -> Duration {
        Duration::from_secs(self.recency_threshold_minutes * 60)
    }
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            aggregation_interval_secs: default_aggregation_interval_secs(),
            aggregation_lookback_days: default_aggregation_lookback_days(),
            aggregation_safety_margin_minutes: default_aggregation_safety_margin_minutes(),
            aggregation_granularities: default_aggregation_granularities(),
            default_cache_ttl_minutes: default_cache_ttl_minutes(),
            short_cache_ttl_minutes: default_short_cache_ttl_minutes(),
            recency_threshold_minutes: default_recency_threshold_minutes(),
            cache_maintenance_interval_secs: default_cache_maintenance_interval_secs(),
            max_tracked_backups: default_max_tracked_backups(),
        }
    }
}

fn default_aggregation_interval_secs() -> u64 {
    300
}

fn default_aggregation_lookback_days() -> u32 {
    7
}

fn default_aggregation_safety_margin_minutes() -> u32 {
    5
}

fn default_aggregation_granularities() -> Vec<Granularity> {
    Granularity::ALL.to_vec()
}

fn default_cache_ttl_minutes() -> u64 {
    30
}

fn default_short_cache_ttl_minutes() -> u64 {
    2
}

fn default_recency_threshold_minutes() -> u64 {
    10
}

fn default_cache_maintenance_interval_secs() -> u64 {
    60
}

fn default_max_tracked_backups() -> u32 {
    10
}
