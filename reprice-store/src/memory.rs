use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;

use reprice_catalog::{ChannelFeeTables, PartnerTierTable, PricingParameters};
use reprice_core::{PricingStore, SheetTable, StoreError, StoreResult};

/// In-process store with switchable read/write failures
pub struct MemoryStore {
    /// Grid per table, row 0 is the header
    tables: RwLock<HashMap<String, Vec<Vec<String>>>>,
    parameters: PricingParameters,
    partner_tiers: PartnerTierTable,
    fees: ChannelFeeTables,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
    table_reads: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
            parameters: PricingParameters::default(),
            partner_tiers: PartnerTierTable::default(),
            fees: ChannelFeeTables::default(),
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
            writes: AtomicUsize::new(0),
            table_reads: AtomicUsize::new(0),
        }
    }

    pub fn with_table(mut self, name: &str, table: SheetTable) -> Self {
        self.tables.get_mut().insert(name.to_string(), table.into_grid());
        self
    }

    pub fn with_context(
        mut self,
        parameters: PricingParameters,
        partner_tiers: PartnerTierTable,
        fees: ChannelFeeTables,
    ) -> Self {
        self.parameters = parameters;
        self.partner_tiers = partner_tiers;
        self.fees = fees;
        self
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful `bulk_overwrite` calls
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Number of `read_all_rows` calls
    pub fn table_read_count(&self) -> usize {
        self.table_reads.load(Ordering::SeqCst)
    }

    /// Current content of a table
    pub async fn table(&self, name: &str) -> Option<SheetTable> {
        let tables = self.tables.read().await;
        let mut grid = tables.get(name)?.clone().into_iter();
        let headers = grid.next().unwrap_or_default();
        Some(SheetTable {
            headers,
            rows: grid.collect(),
        })
    }

    fn check_reads(&self) -> StoreResult<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("read quota exceeded".to_string()));
        }
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PricingStore for MemoryStore {
    async fn read_all_rows(&self, table: &str) -> StoreResult<SheetTable> {
        self.table_reads.fetch_add(1, Ordering::SeqCst);
        self.check_reads()?;
        self.table(table)
            .await
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))
    }

    async fn bulk_overwrite(
        &self,
        table: &str,
        start_row: usize,
        rows: Vec<Vec<String>>,
    ) -> StoreResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("write quota exceeded".to_string()));
        }

        let mut tables = self.tables.write().await;
        let grid = tables
            .get_mut(table)
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))?;
        if start_row > grid.len() {
            return Err(StoreError::Unavailable(format!(
                "start row {} beyond end of {} ({} rows)",
                start_row,
                table,
                grid.len()
            )));
        }

        for (offset, row) in rows.into_iter().enumerate() {
            let position = start_row + offset;
            if position < grid.len() {
                grid[position] = row;
            } else {
                grid.push(row);
            }
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn read_parameters(&self) -> StoreResult<PricingParameters> {
        self.check_reads()?;
        Ok(self.parameters.clone())
    }

    async fn read_partner_tiers(&self) -> StoreResult<PartnerTierTable> {
        self.check_reads()?;
        Ok(self.partner_tiers.clone())
    }

    async fn read_channel_fee_tables(&self) -> StoreResult<ChannelFeeTables> {
        self.check_reads()?;
        Ok(self.fees.clone())
    }
}
