pub mod aggregate_outcomes;
pub mod outcomes;

pub use aggregate_outcomes::{AggregateOutcomesUseCase, AggregationOutcome};
pub use outcomes::{GetOutcomePageUseCase, RecordOutcomeUseCase, MAX_PAGE_SIZE};
