use std::sync::Arc;

use shelfscan_core::Barcode;
use shelfscan_infra::config::{AppConfig, StoreBackend};
use shelfscan_infra::stock_store::{InMemoryStockStore, StockStore, StoreError};
use shelfscan_inventory::{
    CategoryAggregator, CategoryDetail, ScanHistoryEntry, ScannedProduct, ScannedProductInfo,
    StockItem, StockItemUpdate, TopLevelCategory, merge_scanned_products, validate_scan_batch,
};

#[cfg(feature = "postgres")]
use shelfscan_infra::stock_store::PostgresStockStore;

/// Everything a request handler needs, built once at startup and shared by
/// `Arc` through an `Extension` layer.
///
/// Holds no request state: every operation reads fresh rows from the store.
#[derive(Clone)]
pub struct AppServices {
    store: Arc<dyn StockStore>,
    aggregator: CategoryAggregator,
}

impl AppServices {
    pub fn new(store: Arc<dyn StockStore>, aggregator: CategoryAggregator) -> Self {
        Self { store, aggregator }
    }

    pub fn store(&self) -> &dyn StockStore {
        self.store.as_ref()
    }

    pub fn aggregator(&self) -> CategoryAggregator {
        self.aggregator
    }

    pub async fn top_level_categories(&self) -> Result<Vec<TopLevelCategory>, StoreError> {
        let rows = self.store.fetch_all().await?;
        Ok(self.aggregator.top_level_categories(&rows))
    }

    pub async fn category_detail(&self, category: &str) -> Result<CategoryDetail, StoreError> {
        let rows = self.store.fetch_all().await?;
        Ok(self.aggregator.category_detail(&rows, category))
    }

    /// `Ok(None)` when the barcode has no row.
    pub async fn item_info(&self, barcode: &Barcode) -> Result<Option<StockItem>, StoreError> {
        self.store.fetch_one(barcode).await
    }

    /// Validate the whole batch, then upsert row by row.
    ///
    /// Each upsert is atomic on its own; a store failure midway leaves the
    /// earlier rows applied.
    pub async fn apply_scans(&self, products: &[ScannedProduct]) -> Result<Vec<StockItem>, StoreError> {
        validate_scan_batch(products)?;

        let mut applied = Vec::with_capacity(products.len());
        for product in products {
            applied.push(self.store.upsert_quantity(product).await?);
        }
        Ok(applied)
    }

    pub async fn update_item(
        &self,
        barcode: &Barcode,
        update: &StockItemUpdate,
    ) -> Result<StockItem, StoreError> {
        self.store.update(barcode, update).await
    }

    pub async fn scanned_products_info(
        &self,
        barcodes: &[Barcode],
        history: &[ScanHistoryEntry],
    ) -> Result<Vec<ScannedProductInfo>, StoreError> {
        if barcodes.is_empty() {
            return Ok(Vec::new());
        }
        let stocked = self.store.fetch_by_barcodes(barcodes).await?;
        Ok(merge_scanned_products(barcodes, &stocked, history))
    }
}

pub async fn build_services(config: &AppConfig) -> Result<AppServices, StoreError> {
    let aggregator = CategoryAggregator::new(config.category_match);

    match config.store {
        StoreBackend::Memory => Ok(build_in_memory_services(aggregator)),
        StoreBackend::Postgres => build_persistent_services(config, aggregator).await,
    }
}

fn build_in_memory_services(aggregator: CategoryAggregator) -> AppServices {
    AppServices::new(Arc::new(InMemoryStockStore::new()), aggregator)
}

#[cfg(feature = "postgres")]
async fn build_persistent_services(
    config: &AppConfig,
    aggregator: CategoryAggregator,
) -> Result<AppServices, StoreError> {
    let database_url = config
        .database_url
        .as_deref()
        .ok_or_else(|| StoreError::Unavailable("DATABASE_URL not configured".to_string()))?;

    let store = PostgresStockStore::connect(database_url, config.db_max_connections).await?;
    store.ensure_schema().await?;

    Ok(AppServices::new(Arc::new(store), aggregator))
}

#[cfg(not(feature = "postgres"))]
async fn build_persistent_services(
    _config: &AppConfig,
    _aggregator: CategoryAggregator,
) -> Result<AppServices, StoreError> {
    Err(StoreError::Unavailable(
        "SHELFSCAN_STORE=postgres but this build lacks the `postgres` feature".to_string(),
    ))
}
