use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shelfscan_core::{Barcode, DomainError, DomainResult};

/// One stock row, keyed by barcode.
///
/// `quantity` is the only field touched by scanning; everything else changes
/// through a full [`StockItemUpdate`]. `category` is a `>`-separated path and
/// is empty for rows that were created by a scan and never categorised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockItem {
    pub barcode: Barcode,
    pub title: String,
    pub brand: String,
    pub quantity: u64,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub last_edit: Option<DateTime<Utc>>,
}

impl StockItem {
    /// Row created by the first scan of a barcode.
    pub fn from_scan(scan: &ScannedProduct) -> Self {
        Self {
            barcode: scan.barcode.clone(),
            title: scan.title.clone(),
            brand: scan.brand.clone(),
            quantity: scan.count,
            category: String::new(),
            image: scan.image.clone(),
            last_edit: None,
        }
    }

    /// Increment-on-rescan. Display fields of an existing row are left alone.
    pub fn apply_scan(&mut self, scan: &ScannedProduct) -> DomainResult<()> {
        if scan.barcode != self.barcode {
            return Err(DomainError::validation("scan barcode does not match row"));
        }
        self.quantity = self
            .quantity
            .checked_add(scan.count)
            .ok_or_else(|| DomainError::validation("quantity overflow"))?;
        Ok(())
    }

    /// Full-row edit. The barcode itself is immutable.
    pub fn apply_update(&mut self, update: &StockItemUpdate) -> DomainResult<()> {
        update.ensure_targets(&self.barcode)?;

        self.title = update.title.clone();
        self.brand = update.brand.clone();
        self.quantity = update.quantity;
        self.category = update.category.clone();
        self.last_edit = update.last_edit;
        self.image = update.image.clone();
        Ok(())
    }
}

/// Command: record `count` more units of `barcode`.
///
/// `title`, `brand` and `image` come from the client's barcode lookup and are
/// only used when the row does not exist yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScannedProduct {
    pub barcode: Barcode,
    pub count: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub image: Option<String>,
}

impl ScannedProduct {
    pub fn validate(&self) -> DomainResult<()> {
        if self.count == 0 {
            return Err(DomainError::validation(format!(
                "count for {} cannot be zero",
                self.barcode
            )));
        }
        Ok(())
    }
}

/// Validate a whole batch before any of it is written.
pub fn validate_scan_batch(products: &[ScannedProduct]) -> DomainResult<()> {
    if products.is_empty() {
        return Err(DomainError::validation("no products to update"));
    }
    products.iter().try_for_each(ScannedProduct::validate)
}

/// Command: replace every editable field of a row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockItemUpdate {
    /// Echo of the row's barcode; when present it must match the target.
    #[serde(default)]
    pub barcode: Option<Barcode>,
    pub title: String,
    pub brand: String,
    pub quantity: u64,
    pub category: String,
    #[serde(default)]
    pub last_edit: Option<DateTime<Utc>>,
    #[serde(default)]
    pub image: Option<String>,
}

impl StockItemUpdate {
    pub fn ensure_targets(&self, barcode: &Barcode) -> DomainResult<()> {
        match &self.barcode {
            Some(b) if b != barcode => Err(DomainError::validation(format!(
                "barcode is immutable (row {barcode}, body {b})"
            ))),
            _ => Ok(()),
        }
    }
}
