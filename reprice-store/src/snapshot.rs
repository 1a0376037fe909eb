use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::info;

use reprice_catalog::{ChannelFeeTables, PartnerTierTable, PricingParameters};
use reprice_core::{PricingStore, SheetTable, StoreError, StoreResult};

/// On-disk layout of the JSON snapshot
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    #[serde(default)]
    pub tables: BTreeMap<String, SheetTable>,
    #[serde(default)]
    pub parameters: PricingParameters,
    #[serde(default)]
    pub partner_tiers: PartnerTierTable,
    #[serde(default)]
    pub fees: ChannelFeeTables,
}

/// File-backed store: every read parses the file, every write replaces it
pub struct SnapshotStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn load(&self) -> StoreResult<Snapshot> {
        let raw = tokio::fs::read_to_string(&self.path).await?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write through a temporary file and rename, so readers never see a
    /// half-written snapshot.
    pub async fn save(&self, snapshot: &Snapshot) -> StoreResult<()> {
        let body = serde_json::to_string_pretty(snapshot)?;
        let staging = self.path.with_extension("json.tmp");
        tokio::fs::write(&staging, body).await?;
        tokio::fs::rename(&staging, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl PricingStore for SnapshotStore {
    async fn read_all_rows(&self, table: &str) -> StoreResult<SheetTable> {
        let mut snapshot = self.load().await?;
        snapshot
            .tables
            .remove(table)
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))
    }

    async fn bulk_overwrite(
        &self,
        table: &str,
        start_row: usize,
        rows: Vec<Vec<String>>,
    ) -> StoreResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut snapshot = self.load().await?;

        let current = snapshot
            .tables
            .remove(table)
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))?;
        let mut grid = current.into_grid();
        if start_row > grid.len() {
            return Err(StoreError::Unavailable(format!(
                "start row {} beyond end of {}",
                start_row, table
            )));
        }

        let written = rows.len();
        for (offset, row) in rows.into_iter().enumerate() {
            let position = start_row + offset;
            if position < grid.len() {
                grid[position] = row;
            } else {
                grid.push(row);
            }
        }

        let mut grid = grid.into_iter();
        let headers = grid.next().unwrap_or_default();
        snapshot.tables.insert(
            table.to_string(),
            SheetTable {
                headers,
                rows: grid.collect(),
            },
        );
        self.save(&snapshot).await?;

        info!("Wrote {} rows to {} in {}", written, table, self.path.display());
        Ok(())
    }

    async fn read_parameters(&self) -> StoreResult<PricingParameters> {
        Ok(self.load().await?.parameters)
    }

    async fn read_partner_tiers(&self) -> StoreResult<PartnerTierTable> {
        Ok(self.load().await?.partner_tiers)
    }

    async fn read_channel_fee_tables(&self) -> StoreResult<ChannelFeeTables> {
        Ok(self.load().await?.fees)
    }
}
