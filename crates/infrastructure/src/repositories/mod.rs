pub mod aggregate_repository;
pub mod node_health_repository;
pub mod outcome_repository;

pub use aggregate_repository::SqliteAggregateRepository;
pub use node_health_repository::SqliteNodeHealthRepository;
pub use outcome_repository::SqliteOutcomeRepository;
