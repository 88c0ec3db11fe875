use thiserror::Error;

use shelfscan_core::{Barcode, DomainError};
use shelfscan_inventory::{ScannedProduct, StockItem, StockItemUpdate};

/// Stock store operation error.
///
/// These are **infrastructure errors**. "No rows" is not an error: list reads
/// return an empty vector and single-row reads return `None`. Only writes that
/// must hit an existing row report `NotFound`.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The datastore is unreachable or rejected the query.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A write targeted a barcode that has no row.
    #[error("not found")]
    NotFound,

    /// A row came back in a shape the domain cannot represent.
    #[error("failed to decode stock row: {0}")]
    Decode(String),

    /// The write was rejected by domain rules before reaching the store.
    #[error(transparent)]
    Invalid(#[from] DomainError),
}

/// Row-oriented stock datastore.
///
/// Implementations must make `upsert_quantity` atomic per row: two concurrent
/// scans of the same barcode both land.
#[async_trait::async_trait]
pub trait StockStore: Send + Sync {
    /// Short name for logs (`memory`, `postgres`).
    fn backend(&self) -> &'static str;

    /// Every row, in insertion order.
    async fn fetch_all(&self) -> Result<Vec<StockItem>, StoreError>;

    /// Rows whose barcode is in `barcodes`. Unknown barcodes are ignored.
    async fn fetch_by_barcodes(&self, barcodes: &[Barcode]) -> Result<Vec<StockItem>, StoreError>;

    async fn fetch_one(&self, barcode: &Barcode) -> Result<Option<StockItem>, StoreError> {
        let rows = self.fetch_by_barcodes(std::slice::from_ref(barcode)).await?;
        Ok(rows.into_iter().next())
    }

    /// Create the row with `quantity = scan.count`, or add `scan.count` to it.
    async fn upsert_quantity(&self, scan: &ScannedProduct) -> Result<StockItem, StoreError>;

    /// Replace every editable field of an existing row.
    async fn update(&self, barcode: &Barcode, update: &StockItemUpdate) -> Result<StockItem, StoreError>;
}
