use ferrous_analytics_application::use_cases::AggregateOutcomesUseCase;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

const DEFAULT_INTERVAL_SECS: u64 = 300;

/// Periodically rolls raw outcomes up into the aggregate store.
pub struct AggregationJob {
    aggregate: Arc<AggregateOutcomesUseCase>,
    interval_secs: u64,
    shutdown: CancellationToken,
}

impl AggregationJob {
    pub fn new(aggregate: Arc<AggregateOutcomesUseCase>) -> Self {
        Self {
            aggregate,
            interval_secs: DEFAULT_INTERVAL_SECS,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_interval(mut self, interval_secs: u64) -> Self {
        self.interval_secs = interval_secs;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    pub async fn start(self: Arc<Self>) -> JoinHandle<()> {
        info!(interval_secs = self.interval_secs, "Starting aggregation job");

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs));
            loop {
                tokio::select! {
                    _ = self.shutdown.cancelled() => {
                        info!("AggregationJob: shutting down");
                        break;
                    }
                    _ = interval.tick() => {
                        match self.aggregate.execute(&self.shutdown).await {
                            Ok(outcome) if outcome.cancelled => {
                                info!(
                                    buckets = outcome.buckets_processed,
                                    "Aggregation sweep interrupted by shutdown"
                                );
                                break;
                            }
                            Ok(outcome) => {
                                if outcome.buckets_failed > 0 {
                                    warn!(
                                        buckets = outcome.buckets_processed,
                                        failed = outcome.buckets_failed,
                                        "Aggregation sweep completed with failures"
                                    );
                                }
                            }
                            Err(e) => {
                                error!(error = %e, "Aggregation sweep failed");
                            }
                        }
                    }
                }
            }
        })
    }
}
