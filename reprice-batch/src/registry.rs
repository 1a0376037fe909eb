use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{JobStatus, RepriceJob};

#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("A reprice job is already running: {0}")]
    AlreadyRunning(Uuid),

    #[error("Job not found: {0}")]
    NotFound(Uuid),

    #[error("Invalid state transition from {from:?} to {to:?}")]
    InvalidTransition { from: JobStatus, to: JobStatus },
}

/// Shared job table. At most one job is pending or running at a time.
#[derive(Clone, Default)]
pub struct JobRegistry {
    jobs: Arc<RwLock<HashMap<Uuid, RepriceJob>>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a pending job unless another one holds the slot.
    /// The check and the insert happen under one write lock.
    pub async fn try_create(&self, triggered_by: &str) -> Result<Uuid, JobError> {
        let mut jobs = self.jobs.write().await;
        if let Some(active) = jobs.values().find(|job| job.status.is_active()) {
            return Err(JobError::AlreadyRunning(active.id));
        }

        let job = RepriceJob::new(triggered_by);
        let id = job.id;
        jobs.insert(id, job);
        Ok(id)
    }

    pub async fn get(&self, id: &Uuid) -> Option<RepriceJob> {
        self.jobs.read().await.get(id).cloned()
    }

    /// Most recently started jobs first
    pub async fn list(&self, limit: usize) -> Vec<RepriceJob> {
        let jobs = self.jobs.read().await;
        let mut list: Vec<RepriceJob> = jobs.values().cloned().collect();
        list.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        list.truncate(limit);
        list
    }

    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }

    /// Apply `f` to a job in place
    pub async fn update<F, R>(&self, id: &Uuid, f: F) -> Result<R, JobError>
    where
        F: FnOnce(&mut RepriceJob) -> R,
    {
        let mut jobs = self.jobs.write().await;
        let job = jobs.get_mut(id).ok_or(JobError::NotFound(*id))?;
        Ok(f(job))
    }

    /// Move a job along Pending → Running → Completed, or to Failed from
    /// any active state.
    pub async fn transition(&self, id: &Uuid, to: JobStatus) -> Result<(), JobError> {
        let mut jobs = self.jobs.write().await;
        let job = jobs.get_mut(id).ok_or(JobError::NotFound(*id))?;

        let allowed = matches!(
            (job.status, to),
            (JobStatus::Pending, JobStatus::Running)
                | (JobStatus::Running, JobStatus::Completed)
                | (JobStatus::Pending, JobStatus::Failed)
                | (JobStatus::Running, JobStatus::Failed)
        );
        if !allowed {
            return Err(JobError::InvalidTransition {
                from: job.status,
                to,
            });
        }

        job.update_status(to);
        Ok(())
    }

    /// Drop finished jobs completed before `cutoff`. Active jobs are kept.
    pub async fn evict_finished_before(&self, cutoff: DateTime<Utc>) -> usize {
        let mut jobs = self.jobs.write().await;
        let before = jobs.len();
        jobs.retain(|_, job| {
            job.status.is_active() || job.completed_at.map_or(true, |done| done >= cutoff)
        });
        before - jobs.len()
    }

    /// Drop finished jobs older than `retention`
    pub async fn evict_expired(&self, retention: Duration) -> usize {
        let Some(cutoff) = chrono::Duration::from_std(retention)
            .ok()
            .and_then(|retention| Utc::now().checked_sub_signed(retention))
        else {
            return 0;
        };
        self.evict_finished_before(cutoff).await
    }

    /// Evict expired jobs every `interval` until the handle is shut down
    /// or dropped.
    pub fn spawn_sweeper(&self, retention: Duration, interval: Duration) -> SweepHandle {
        let registry = self.clone();
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
        let period = interval.max(Duration::from_millis(1));

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // The first tick completes immediately
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => {
                        debug!("Job sweeper stopping");
                        break;
                    }
                    _ = ticker.tick() => {
                        let evicted = registry.evict_expired(retention).await;
                        if evicted > 0 {
                            info!(evicted, "Evicted finished reprice jobs");
                        }
                    }
                }
            }
        });

        SweepHandle {
            shutdown: Some(shutdown_tx),
            task: Some(task),
        }
    }
}

/// Owner of the background sweep task
pub struct SweepHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl SweepHandle {
    /// Signal the sweeper and wait for it to exit
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for SweepHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
