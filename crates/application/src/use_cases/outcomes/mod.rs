pub mod get_outcome_page;
pub mod record_outcome;

pub use get_outcome_page::{GetOutcomePageUseCase, MAX_PAGE_SIZE};
pub use record_outcome::RecordOutcomeUseCase;
