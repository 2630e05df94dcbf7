use crate::{CategoryCounts, Granularity, TimeRange, TimeSlot};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatencyPoint {
    pub start: DateTime<Utc>,
    pub label: String,
    pub avg_ms: f64,
    pub max_ms: u64,
    pub samples: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    /// `None` groups records without a parseable outcome code.
    pub status_code: Option<u16>,
    pub count: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NodeHealthCounts {
    pub healthy: u64,
    pub unhealthy: u64,
}

impl NodeHealthCounts {
    pub fn total(&self) -> u64 {
        self.healthy + self.unhealthy
    }
}

/// Composite dashboard view assembled from several independent queries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverviewResult {
    /// Normalized window the sub-queries actually ran over.
    pub range: TimeRange,
    pub timeline_granularity: Granularity,
    pub totals: CategoryCounts,
    pub timeline: Vec<TimeSlot>,
    pub latency_timeline: Vec<LatencyPoint>,
    pub status_distribution: Vec<StatusCount>,
    pub node_health: NodeHealthCounts,
    pub generated_at: DateTime<Utc>,
}

impl OverviewResult {
    pub fn total_requests(&self) -> u64 {
        self.totals.total()
    }
}
