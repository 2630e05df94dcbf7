use crate::ports::OutcomeRepository;
use chrono::{DateTime, Utc};
use ferrous_analytics_domain::{DomainError, OutcomePage, ReportFilter, TimeRange};
use std::sync::Arc;

pub const MAX_PAGE_SIZE: u32 = 1000;

pub struct GetOutcomePageUseCase {
    repository: Arc<dyn OutcomeRepository>,
}

impl GetOutcomePageUseCase {
    pub fn new(repository: Arc<dyn OutcomeRepository>) -> Self {
        Self { repository }
    }

    pub async fn execute(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        filter: &ReportFilter,
        limit: u32,
        cursor: Option<i64>,
    ) -> Result<OutcomePage, DomainError> {
        let range = TimeRange::non_empty(from, to)?;
        let limit = limit.clamp(1, MAX_PAGE_SIZE);
        self.repository.get_page(&range, filter, limit, cursor).await
    }
}
