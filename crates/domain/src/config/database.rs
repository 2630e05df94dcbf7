use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,

    #[serde(default = "default_outcome_channel_capacity")]
    pub outcome_channel_capacity: usize,

    #[serde(default = "default_outcome_max_batch_size")]
    pub outcome_max_batch_size: usize,

    #[serde(default = "default_outcome_flush_interval_ms")]
    pub outcome_flush_interval_ms: u64,

    #[serde(default = "default_write_pool_max_connections")]
    pub write_pool_max_connections: u32,

    #[serde(default = "default_read_pool_max_connections")]
    pub read_pool_max_connections: u32,

    #[serde(default = "default_write_busy_timeout_secs")]
    pub write_busy_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            outcome_channel_capacity: default_outcome_channel_capacity(),
            outcome_max_batch_size: default_outcome_max_batch_size(),
            outcome_flush_interval_ms: default_outcome_flush_interval_ms(),
            write_pool_max_connections: default_write_pool_max_connections(),
            read_pool_max_connections: default_read_pool_max_connections(),
            write_busy_timeout_secs: default_write_busy_timeout_secs(),
        }
    }
}

fn default_db_path() -> String {
    "./ferrous-analytics.db".to_string()
}

fn default_outcome_channel_capacity() -> usize {
    10_000
}

fn default_outcome_max_batch_size() -> usize {
    500
}

fn default_outcome_flush_interval_ms() -> u64 {
    100
}

fn default_write_pool_max_connections() -> u32 {
    3
}

fn default_read_pool_max_connections() -> u32 {
    8
}

fn default_write_busy_timeout_secs() -> u64 {
    30
}
