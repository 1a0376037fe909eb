use anyhow::{bail, Context};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reprice_batch::{BatchSettings, JobRegistry, JobStatus, RepriceOrchestrator};
use reprice_core::{row::columns, SheetTable};
use reprice_store::{app_config::Config, Snapshot, SnapshotStore};
use reprice_worker::{run_once, Cli, Command, RunOptions};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reprice_worker=info,reprice_batch=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    let store = Arc::new(SnapshotStore::new(&config.store.snapshot_path));

    match cli.command() {
        Command::Run { triggered_by } => run(store, &config, triggered_by).await,
        Command::Init => init(&store, &config).await,
    }
}

/// Reprice the whole product table once and print the job as JSON
async fn run(
    store: Arc<SnapshotStore>,
    config: &Config,
    triggered_by: String,
) -> anyhow::Result<()> {
    tracing::info!(path = %store.path().display(), "Starting reprice worker");

    let registry = JobRegistry::new();
    let sweeper = registry.spawn_sweeper(
        Duration::from_secs(config.batch.retention_secs),
        Duration::from_secs(config.batch.sweep_interval_secs),
    );
    let settings = BatchSettings::from_config(config);
    let orchestrator = RepriceOrchestrator::new(store, registry, settings);

    let outcome = run_once(&orchestrator, &RunOptions::new(triggered_by)).await;
    sweeper.shutdown().await;
    let job = outcome?;

    println!(
        "{}",
        serde_json::to_string_pretty(&job).context("Failed to serialize job summary")?
    );
    if job.status == JobStatus::Failed {
        bail!("Reprice job {} failed", job.id);
    }
    Ok(())
}

/// Write an empty snapshot with default parameters and fee tables
async fn init(store: &SnapshotStore, config: &Config) -> anyhow::Result<()> {
    let path = store.path();
    if path.exists() {
        bail!("Snapshot {} already exists", path.display());
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let mut snapshot = Snapshot::default();
    snapshot.tables.insert(
        config.store.product_table.clone(),
        SheetTable {
            headers: columns::INPUT.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        },
    );
    store
        .save(&snapshot)
        .await
        .with_context(|| format!("Failed to write snapshot {}", path.display()))?;

    tracing::info!(path = %path.display(), "Snapshot initialised");
    Ok(())
}
