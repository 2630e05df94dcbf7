use crate::{AggregationJob, CacheMaintenanceJob};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Builder for the background job set.
///
/// Every job shares one shutdown token; [`RunningJobs::shutdown`] cancels it
/// and waits for the loops to exit.
pub struct JobRunner {
    aggregation: Option<AggregationJob>,
    cache_maintenance: Option<CacheMaintenanceJob>,
    shutdown: CancellationToken,
}

impl JobRunner {
    pub fn new() -> Self {
        Self {
            aggregation: None,
            cache_maintenance: None,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_aggregation(mut self, job: AggregationJob) -> Self {
        self.aggregation = Some(job);
        self
    }

    pub fn with_cache_maintenance(mut self, job: CacheMaintenanceJob) -> Self {
        self.cache_maintenance = Some(job);
        self
    }

    /// Ties the jobs to an externally owned token instead of the runner's own.
    pub fn with_shutdown_token(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    pub async fn start(self) -> RunningJobs {
        let mut handles = Vec::new();

        if let Some(job) = self.aggregation {
            let job = Arc::new(job.with_cancellation(self.shutdown.clone()));
            handles.push(("aggregation", job.start().await));
        }
        if let Some(job) = self.cache_maintenance {
            let job = Arc::new(job.with_cancellation(self.shutdown.clone()));
            handles.push(("cache_maintenance", job.start().await));
        }

        info!(jobs = handles.len(), "Background jobs started");
        RunningJobs {
            shutdown: self.shutdown,
            handles,
        }
    }
}

impl Default for JobRunner {
    fn default() -> Self {
        Self::new()
    }
}

/// Handles of the spawned job loops.
pub struct RunningJobs {
    shutdown: CancellationToken,
    handles: Vec<(&'static str, JoinHandle<()>)>,
}

impl RunningJobs {
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn is_finished(&self) -> bool {
        self.handles.iter().all(|(_, handle)| handle.is_finished())
    }

    /// Cancels the shared token and waits for every job loop to return.
    pub async fn shutdown(self) {
        self.shutdown.cancel();
        for (job, handle) in self.handles {
            if let Err(e) = handle.await {
                error!(job, error = %e, "Background job did not stop cleanly");
            }
        }
        info!("Background jobs stopped");
    }
}
