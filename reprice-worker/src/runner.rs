use anyhow::{anyhow, bail, Context};
use std::time::Duration;
use tokio::time::Instant;
use tracing::info;

use reprice_batch::{RepriceJob, RepriceOrchestrator};

/// How a single worker run is driven
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub triggered_by: String,
    pub poll_interval: Duration,
    /// Give up waiting after this long; the job keeps running
    pub timeout: Option<Duration>,
}

impl RunOptions {
    pub fn new(triggered_by: impl Into<String>) -> Self {
        Self {
            triggered_by: triggered_by.into(),
            poll_interval: Duration::from_millis(500),
            timeout: None,
        }
    }
}

/// Start one job and poll it until it finishes
pub async fn run_once(
    orchestrator: &RepriceOrchestrator,
    options: &RunOptions,
) -> anyhow::Result<RepriceJob> {
    let job_id = orchestrator
        .start_job(&options.triggered_by)
        .await
        .context("Failed to start reprice job")?;
    info!(%job_id, "Waiting for reprice job");

    let started = Instant::now();
    loop {
        let job = orchestrator
            .get_job_status(&job_id)
            .await
            .ok_or_else(|| anyhow!("Reprice job {} vanished from the registry", job_id))?;
        if job.status.is_finished() {
            return Ok(job);
        }

        if let Some(timeout) = options.timeout {
            if started.elapsed() >= timeout {
                bail!(
                    "Reprice job {} still {:?} after {:?} ({} rows scanned)",
                    job_id,
                    job.status,
                    timeout,
                    job.scanned
                );
            }
        }
        tokio::time::sleep(options.poll_interval).await;
    }
}
