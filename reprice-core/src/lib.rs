pub mod repository;
pub mod row;

pub use repository::{PricingStore, SheetTable};
pub use row::{sheet_row, ProductRow, RowError, SheetLayout, OUTPUT_COLUMNS};

/// Failures of the external tabular store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Table not found: {0}")]
    TableNotFound(String),
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;
