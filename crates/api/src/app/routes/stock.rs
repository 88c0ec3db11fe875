use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};

use shelfscan_inventory::StockItemUpdate;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/item_info/:barcode", get(item_info))
        .route("/quantity_update", post(quantity_update))
        .route("/scanned_products_info", post(scanned_products_info))
        .route("/stock/update/:barcode", put(update_stock_item))
}

pub async fn item_info(
    Extension(services): Extension<Arc<AppServices>>,
    Path(barcode): Path<String>,
) -> axum::response::Response {
    let barcode = match dto::parse_barcode(&barcode) {
        Ok(b) => b,
        Err(resp) => return resp,
    };

    match services.item_info(&barcode).await {
        Ok(Some(item)) => (StatusCode::OK, Json(item)).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "item not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}

/// Increment-on-rescan for a batch of scanned products.
pub async fn quantity_update(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::QuantityUpdateRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    match services.apply_scans(&body.products).await {
        Ok(applied) => {
            tracing::info!(rows = applied.len(), "applied scanned quantities");
            errors::json_message(StatusCode::OK, "Successfully updated quantities")
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn scanned_products_info(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::ScannedProductsInfoRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    match services
        .scanned_products_info(&body.barcodes, &body.scan_history)
        .await
    {
        Ok(products) => (StatusCode::OK, Json(products)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

/// Full-row edit of an existing item. The barcode itself is immutable.
pub async fn update_stock_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path(barcode): Path<String>,
    body: Result<Json<StockItemUpdate>, JsonRejection>,
) -> axum::response::Response {
    let barcode = match dto::parse_barcode(&barcode) {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    let Json(update) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    match services.update_item(&barcode, &update).await {
        Ok(item) => {
            tracing::info!(barcode = %item.barcode, quantity = item.quantity, "stock item updated");
            errors::json_message(StatusCode::OK, "Successfully updated stock item")
        }
        Err(e) => errors::store_error_to_response(e),
    }
}
