use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use reprice_catalog::{ChannelFeeTables, PartnerTierTable, PricingParameters};

use crate::StoreResult;

/// A table as the store returns it: a header row and cells by position
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SheetTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl SheetTable {
    /// Header row followed by the data rows, as written back by `bulk_overwrite`
    pub fn into_grid(self) -> Vec<Vec<String>> {
        let mut grid = Vec::with_capacity(self.rows.len() + 1);
        grid.push(self.headers);
        grid.extend(self.rows);
        grid
    }
}

/// Repository trait for the catalog and pricing tables
#[async_trait]
pub trait PricingStore: Send + Sync {
    async fn read_all_rows(&self, table: &str) -> StoreResult<SheetTable>;

    /// Replace rows starting at `start_row` of the grid, where row 0 is the
    /// header. One call either lands completely or not at all.
    async fn bulk_overwrite(
        &self,
        table: &str,
        start_row: usize,
        rows: Vec<Vec<String>>,
    ) -> StoreResult<()>;

    async fn read_parameters(&self) -> StoreResult<PricingParameters>;

    async fn read_partner_tiers(&self) -> StoreResult<PartnerTierTable>;

    async fn read_channel_fee_tables(&self) -> StoreResult<ChannelFeeTables>;
}
