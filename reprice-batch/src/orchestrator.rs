use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use uuid::Uuid;

use reprice_catalog::{GuardrailSettings, PricingContext, PricingEngine, PricingError};
use reprice_core::{sheet_row, PricingStore, SheetLayout, SheetTable, StoreError};
use reprice_store::app_config::Config;

use crate::models::{JobStatus, RepriceJob, RowFailure, SYSTEM_SKU};
use crate::registry::{JobError, JobRegistry};

/// Knobs of a batch run
#[derive(Debug, Clone)]
pub struct BatchSettings {
    pub product_table: String,
    /// Pause after this many processed rows; 0 disables pausing
    pub pause_every_rows: usize,
    pub pause: Duration,
    pub guardrail: GuardrailSettings,
}

impl BatchSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            product_table: config.store.product_table.clone(),
            pause_every_rows: config.batch.pause_every_rows,
            pause: Duration::from_millis(config.batch.pause_ms),
            guardrail: config.guardrail.clone(),
        }
    }
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Reasons a whole job stops before or after the row loop
#[derive(Debug, thiserror::Error)]
enum JobAbort {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Pricing(#[from] PricingError),
}

/// Runs reprice jobs in the background and reports on them
#[derive(Clone)]
pub struct RepriceOrchestrator {
    store: Arc<dyn PricingStore>,
    registry: JobRegistry,
    settings: Arc<BatchSettings>,
}

impl RepriceOrchestrator {
    pub fn new(
        store: Arc<dyn PricingStore>,
        registry: JobRegistry,
        settings: BatchSettings,
    ) -> Self {
        Self {
            store,
            registry,
            settings: Arc::new(settings),
        }
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    /// Register a job and run it in the background. Returns at once with
    /// the job id, or `AlreadyRunning` when another job holds the slot.
    pub async fn start_job(&self, triggered_by: &str) -> Result<Uuid, JobError> {
        let job_id = self.registry.try_create(triggered_by).await?;
        info!(%job_id, triggered_by, "Reprice job accepted");

        let this = self.clone();
        tokio::spawn(async move {
            let runner = this.clone();
            let outcome = tokio::spawn(async move { runner.run_job(job_id).await }).await;

            // A panicking run must not keep the slot forever
            if let Err(e) = outcome {
                error!(%job_id, error = %e, "Reprice job task aborted");
                this.fail_job(&job_id, format!("job task aborted: {}", e)).await;
            }
        });

        Ok(job_id)
    }

    pub async fn get_job_status(&self, job_id: &Uuid) -> Option<RepriceJob> {
        self.registry.get(job_id).await
    }

    pub async fn list_jobs(&self, limit: usize) -> Vec<RepriceJob> {
        self.registry.list(limit).await
    }

    async fn run_job(&self, job_id: Uuid) {
        if let Err(e) = self.registry.transition(&job_id, JobStatus::Running).await {
            error!(%job_id, error = %e, "Could not start reprice job");
            return;
        }

        let (table, engine) = match self.load_snapshot().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                error!(%job_id, error = %e, "Failed to load pricing snapshot");
                self.fail_job(&job_id, e.to_string()).await;
                return;
            }
        };

        let layout = SheetLayout::new(table.headers).with_output_columns();
        let mut rows = table.rows;
        info!(%job_id, rows = rows.len(), "Repricing catalog");

        let mut processed = 0usize;
        for (index, cells) in rows.iter_mut().enumerate() {
            if SheetLayout::is_blank(cells) {
                continue;
            }

            let priced = layout.parse(index, cells).and_then(|row| {
                let breakdown = engine.price(&row.inputs)?;
                Ok((row, breakdown))
            });

            match priced {
                Ok((row, breakdown)) => {
                    layout.write_priced(cells, &row, &breakdown);
                    let _ = self.registry.update(&job_id, |job| job.record_success()).await;
                }
                Err(e) => {
                    let sku = layout
                        .sku(cells)
                        .unwrap_or_else(|| format!("row {}", sheet_row(index)));
                    warn!(%job_id, sku = %sku, error = %e, "Row skipped");
                    let message = e.to_string();
                    let _ = self
                        .registry
                        .update(&job_id, |job| job.record_failure(sku, message))
                        .await;
                }
            }

            processed += 1;
            if self.settings.pause_every_rows > 0
                && processed % self.settings.pause_every_rows == 0
                && !self.settings.pause.is_zero()
            {
                tokio::time::sleep(self.settings.pause).await;
            }
        }

        let mut grid = Vec::with_capacity(rows.len() + 1);
        grid.push(layout.headers().to_vec());
        grid.extend(rows);

        if let Err(e) = self
            .store
            .bulk_overwrite(&self.settings.product_table, 0, grid)
            .await
        {
            error!(%job_id, error = %e, "Bulk write-back failed");
            self.fail_job(&job_id, e.to_string()).await;
            return;
        }

        if let Err(e) = self.registry.transition(&job_id, JobStatus::Completed).await {
            error!(%job_id, error = %e, "Could not complete reprice job");
            return;
        }

        if let Some(job) = self.registry.get(&job_id).await {
            info!(
                %job_id,
                scanned = job.scanned,
                succeeded = job.succeeded,
                failed = job.failed,
                "Reprice job completed"
            );
        }
    }

    /// Read the product table and the pricing context exactly once
    async fn load_snapshot(&self) -> Result<(SheetTable, PricingEngine), JobAbort> {
        let table = self.store.read_all_rows(&self.settings.product_table).await?;
        let parameters = self.store.read_parameters().await?;
        let partner_tiers = self.store.read_partner_tiers().await?;
        let fees = self.store.read_channel_fee_tables().await?;

        let context = PricingContext::new(
            parameters,
            partner_tiers,
            fees,
            self.settings.guardrail.clone(),
        );
        let engine = PricingEngine::new(context)?;
        Ok((table, engine))
    }

    /// Mark a job failed with a single job-level error
    async fn fail_job(&self, job_id: &Uuid, message: String) {
        let _ = self
            .registry
            .update(job_id, |job| {
                job.errors.push(RowFailure {
                    sku: SYSTEM_SKU.to_string(),
                    error: format!("{}: {}", SYSTEM_SKU, message),
                });
            })
            .await;
        if let Err(e) = self.registry.transition(job_id, JobStatus::Failed).await {
            warn!(%job_id, error = %e, "Could not mark reprice job failed");
        }
    }
}
