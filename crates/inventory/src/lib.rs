//! Inventory domain module.
//!
//! This crate contains business rules for stock bookkeeping and category
//! rollups, implemented purely as deterministic domain logic (no IO, no HTTP,
//! no storage). Every function here works on rows the caller already fetched.

pub mod category;
pub mod item;
pub mod scan;

pub use category::{
    CategoryAggregator, CategoryDetail, CategoryMatch, SubcategoryRollup, TopLevelCategory,
};
pub use item::{ScannedProduct, StockItem, StockItemUpdate, validate_scan_batch};
pub use scan::{ScanHistoryEntry, ScannedProductInfo, merge_scanned_products};
