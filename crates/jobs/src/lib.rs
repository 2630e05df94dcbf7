pub mod aggregation;
pub mod cache_maintenance;
pub mod runner;

pub use aggregation::AggregationJob;
pub use cache_maintenance::CacheMaintenanceJob;
pub use runner::{JobRunner, RunningJobs};
