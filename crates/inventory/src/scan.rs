//! Merging a client's scanned barcodes with stored rows.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use shelfscan_core::Barcode;

use crate::item::StockItem;

/// A product the client looked up but has not stored yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanHistoryEntry {
    pub barcode: Barcode,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub image: String,
}

/// Per-barcode answer: either the stored row or the client's own lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScannedProductInfo {
    pub barcode: Barcode,
    pub title: String,
    pub quantity: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub from_scan: bool,
}

impl ScannedProductInfo {
    fn stocked(item: &StockItem) -> Self {
        Self {
            barcode: item.barcode.clone(),
            title: item.title.clone(),
            quantity: item.quantity,
            brand: None,
            image: None,
            from_scan: false,
        }
    }

    fn from_history(entry: &ScanHistoryEntry) -> Self {
        Self {
            barcode: entry.barcode.clone(),
            title: entry.title.clone(),
            quantity: 0,
            brand: Some(entry.brand.clone()),
            image: Some(entry.image.clone()),
            from_scan: true,
        }
    }
}

/// Resolve `barcodes` in request order. Stored rows win over history; barcodes
/// found in neither are dropped. The last history entry for a barcode wins.
pub fn merge_scanned_products(
    barcodes: &[Barcode],
    stocked: &[StockItem],
    history: &[ScanHistoryEntry],
) -> Vec<ScannedProductInfo> {
    let stocked: HashMap<&Barcode, &StockItem> = stocked.iter().map(|i| (&i.barcode, i)).collect();
    let history: HashMap<&Barcode, &ScanHistoryEntry> =
        history.iter().map(|h| (&h.barcode, h)).collect();

    barcodes
        .iter()
        .filter_map(|b| {
            stocked
                .get(b)
                .map(|item| ScannedProductInfo::stocked(item))
                .or_else(|| history.get(b).map(|entry| ScannedProductInfo::from_history(entry)))
        })
        .collect()
}
