use axum::http::StatusCode;
use serde::Deserialize;

use shelfscan_core::Barcode;
use shelfscan_inventory::{ScanHistoryEntry, ScannedProduct};

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct QuantityUpdateRequest {
    #[serde(default)]
    pub products: Vec<ScannedProduct>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScannedProductsInfoRequest {
    #[serde(default)]
    pub barcodes: Vec<Barcode>,
    #[serde(default)]
    pub scan_history: Vec<ScanHistoryEntry>,
}

// -------------------------
// Path helpers
// -------------------------

pub fn parse_barcode(raw: &str) -> Result<Barcode, axum::response::Response> {
    raw.parse::<Barcode>()
        .map_err(|e| errors::json_error(StatusCode::BAD_REQUEST, "invalid_barcode", e.to_string()))
}
