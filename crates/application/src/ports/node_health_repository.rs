use async_trait::async_trait;
use ferrous_analytics_domain::{DomainError, NodeHealthCounts};
use tokio_util::sync::CancellationToken;

/// Read side of the downstream node health poller.
#[async_trait]
pub trait NodeHealthRepository: Send + Sync {
    async fn count_health(&self, cancel: &CancellationToken)
        -> Result<NodeHealthCounts, DomainError>;
}
