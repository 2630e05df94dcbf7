mod aggregate_repository;
mod cache_invalidator;
mod cache_maintenance_port;
mod node_health_repository;
mod outcome_repository;
mod report_repository;

pub use aggregate_repository::AggregateRepository;
pub use cache_invalidator::CacheInvalidator;
pub use cache_maintenance_port::{CacheCompactionOutcome, CacheMaintenancePort};
pub use node_health_repository::NodeHealthRepository;
pub use outcome_repository::{BucketCount, LatencyBucket, OutcomeRepository};
pub use report_repository::ReportRepository;
