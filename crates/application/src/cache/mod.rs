mod maintenance;
mod metrics;
mod overview_cache;
pub mod overview_window;
mod report_cache;
mod single_flight;

pub use maintenance::AnalyticsCacheMaintenance;
pub use metrics::{CacheMetrics, CacheStats};
pub use overview_cache::OverviewCache;
pub use overview_window::{normalize_window, NormalizedWindow};
pub use report_cache::{ReportCache, ReportCachePolicy, ReportKey, RECENT_WINDOW_TTL};
pub use single_flight::{EvictionEvent, EvictionReason, SingleFlightCache};
