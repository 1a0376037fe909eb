use reprice_batch::{
    BatchSettings, JobError, JobRegistry, JobStatus, RepriceJob, RepriceOrchestrator,
};
use reprice_core::SheetTable;
use reprice_store::MemoryStore;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

const TABLE: &str = "Products";

fn cells(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// `count` premium rows priced off a manual factory price, plus a free-form
/// notes column the pricer does not know about
fn catalog(count: usize) -> SheetTable {
    SheetTable {
        headers: cells(&["SKU", "Product Line", "Factory Price Manual", "Net Content ml", "Notes"]),
        rows: (1..=count)
            .map(|i| {
                let sku = format!("SKU-{}", i);
                let note = format!("note {}", i);
                cells(&[&sku, "Premium", "8", "500", &note])
            })
            .collect(),
    }
}

fn settings(pause_ms: u64) -> BatchSettings {
    BatchSettings {
        pause: Duration::from_millis(pause_ms),
        ..BatchSettings::default()
    }
}

fn orchestrator(store: Arc<MemoryStore>, pause_ms: u64) -> RepriceOrchestrator {
    RepriceOrchestrator::new(store, JobRegistry::new(), settings(pause_ms))
}

async fn wait_for_finish(orchestrator: &RepriceOrchestrator, job_id: &Uuid) -> RepriceJob {
    for _ in 0..500 {
        if let Some(job) = orchestrator.get_job_status(job_id).await {
            if job.status.is_finished() {
                return job;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {} did not finish", job_id);
}

fn column(table: &SheetTable, name: &str) -> usize {
    table.headers.iter().position(|h| h == name).unwrap()
}

#[tokio::test]
async fn test_malformed_row_is_isolated() {
    let mut table = catalog(10);
    table.rows[4][2] = "abc".to_string();
    let original_row = table.rows[4].clone();

    let store = Arc::new(MemoryStore::new().with_table(TABLE, table));
    let orchestrator = orchestrator(store.clone(), 0);

    let job_id = orchestrator.start_job("test").await.unwrap();
    let job = wait_for_finish(&orchestrator, &job_id).await;

    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.scanned, 10);
    assert_eq!(job.succeeded, 9);
    assert_eq!(job.failed, 1);
    assert_eq!(job.errors[0].sku, "SKU-5");
    assert!(job.errors[0].error.contains("abc"));

    let written = store.table(TABLE).await.unwrap();
    assert_eq!(written.rows[4], original_row);

    let uvp = column(&written, "UVP Net");
    assert_eq!(written.rows[0][uvp], "20.00");
    assert_eq!(written.rows[5][uvp], "20.00");
    assert_eq!(store.write_count(), 1);
}

#[tokio::test]
async fn test_unknown_columns_survive_write_back() {
    let store = Arc::new(MemoryStore::new().with_table(TABLE, catalog(3)));
    let orchestrator = orchestrator(store.clone(), 0);

    let job_id = orchestrator.start_job("test").await.unwrap();
    wait_for_finish(&orchestrator, &job_id).await;

    let written = store.table(TABLE).await.unwrap();
    let notes = column(&written, "Notes");
    assert_eq!(notes, 4);
    assert_eq!(written.rows[2][notes], "note 3");
    assert_eq!(written.rows[2][column(&written, "Grundpreis")], "€47.60/L");
    // Output columns are appended after the existing ones
    assert!(column(&written, "Pricing Warnings") > notes);
}

#[tokio::test]
async fn test_second_start_is_rejected() {
    // 20 rows pausing 50ms every 10 keeps the first job busy
    let store = Arc::new(MemoryStore::new().with_table(TABLE, catalog(20)));
    let orchestrator = orchestrator(store, 50);

    let first = orchestrator.start_job("cron").await.unwrap();
    match orchestrator.start_job("manual").await {
        Err(JobError::AlreadyRunning(id)) => assert_eq!(id, first),
        other => panic!("expected AlreadyRunning, got {:?}", other),
    }
    assert_eq!(orchestrator.list_jobs(10).await.len(), 1);

    wait_for_finish(&orchestrator, &first).await;
    assert!(orchestrator.start_job("manual").await.is_ok());
}

#[tokio::test]
async fn test_read_failure_fails_job_without_writes() {
    let store = Arc::new(MemoryStore::new().with_table(TABLE, catalog(3)));
    store.set_fail_reads(true);
    let orchestrator = orchestrator(store.clone(), 0);

    let job_id = orchestrator.start_job("test").await.unwrap();
    let job = wait_for_finish(&orchestrator, &job_id).await;

    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.errors.len(), 1);
    assert!(job.errors[0].error.starts_with("SYSTEM: "));
    assert_eq!(job.scanned, 0);
    assert!(job.completed_at.is_some());
    assert_eq!(store.write_count(), 0);
}

#[tokio::test]
async fn test_missing_table_fails_job() {
    let store = Arc::new(MemoryStore::new());
    let orchestrator = orchestrator(store.clone(), 0);

    let job_id = orchestrator.start_job("test").await.unwrap();
    let job = wait_for_finish(&orchestrator, &job_id).await;

    assert_eq!(job.status, JobStatus::Failed);
    assert!(job.errors[0].error.contains(TABLE));
    assert_eq!(store.write_count(), 0);
}

#[tokio::test]
async fn test_write_failure_fails_job() {
    let store = Arc::new(MemoryStore::new().with_table(TABLE, catalog(2)));
    store.set_fail_writes(true);
    let orchestrator = orchestrator(store.clone(), 0);

    let job_id = orchestrator.start_job("test").await.unwrap();
    let job = wait_for_finish(&orchestrator, &job_id).await;

    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.succeeded, 2);
    assert!(job.errors.iter().any(|e| e.sku == "SYSTEM"));

    // Nothing landed
    let table = store.table(TABLE).await.unwrap();
    assert_eq!(table.headers.len(), 5);
}

#[tokio::test]
async fn test_table_read_once_per_job() {
    let store = Arc::new(MemoryStore::new().with_table(TABLE, catalog(25)));
    let orchestrator = orchestrator(store.clone(), 0);

    let job_id = orchestrator.start_job("test").await.unwrap();
    wait_for_finish(&orchestrator, &job_id).await;

    assert_eq!(store.table_read_count(), 1);
    assert_eq!(store.write_count(), 1);
}

#[tokio::test]
async fn test_blank_rows_are_skipped() {
    let mut table = catalog(3);
    table.rows.insert(1, cells(&["", " ", "", "", ""]));
    let store = Arc::new(MemoryStore::new().with_table(TABLE, table));
    let orchestrator = orchestrator(store.clone(), 0);

    let job_id = orchestrator.start_job("test").await.unwrap();
    let job = wait_for_finish(&orchestrator, &job_id).await;

    assert_eq!(job.scanned, 3);
    assert_eq!(job.failed, 0);
    let written = store.table(TABLE).await.unwrap();
    assert_eq!(written.rows.len(), 4);
}

#[tokio::test]
async fn test_row_without_sku_reported_by_position() {
    let mut table = catalog(2);
    table.rows[1][0] = String::new();
    let store = Arc::new(MemoryStore::new().with_table(TABLE, table));
    let orchestrator = orchestrator(store, 0);

    let job_id = orchestrator.start_job("test").await.unwrap();
    let job = wait_for_finish(&orchestrator, &job_id).await;

    assert_eq!(job.failed, 1);
    assert_eq!(job.errors[0].sku, "row 3");
    assert_eq!(job.errors[0].error, "Row 3 has no SKU");
}

#[tokio::test]
async fn test_list_jobs_newest_first() {
    let store = Arc::new(MemoryStore::new().with_table(TABLE, catalog(1)));
    let orchestrator = orchestrator(store, 0);

    let mut ids = Vec::new();
    for _ in 0..3 {
        let id = orchestrator.start_job("test").await.unwrap();
        wait_for_finish(&orchestrator, &id).await;
        ids.push(id);
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let jobs = orchestrator.list_jobs(2).await;
    assert_eq!(jobs.len(), 2);
    assert_eq!(jobs[0].id, ids[2]);
    assert_eq!(jobs[1].id, ids[1]);
}

#[tokio::test]
async fn test_unknown_job_status() {
    let store = Arc::new(MemoryStore::new());
    let orchestrator = orchestrator(store, 0);
    assert!(orchestrator.get_job_status(&Uuid::new_v4()).await.is_none());
}
