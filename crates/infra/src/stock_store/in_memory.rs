use std::sync::RwLock;

use shelfscan_core::Barcode;
use shelfscan_inventory::{ScannedProduct, StockItem, StockItemUpdate};

use super::r#trait::{StockStore, StoreError};

/// In-memory stock table.
///
/// Intended for tests/dev. Rows keep insertion order, which is the order
/// category listings report first occurrences in.
#[derive(Debug, Default)]
pub struct InMemoryStockStore {
    rows: RwLock<Vec<StockItem>>,
}

impl InMemoryStockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with `rows`. Later duplicates of a barcode are dropped.
    pub fn with_rows(rows: impl IntoIterator<Item = StockItem>) -> Self {
        let mut seeded: Vec<StockItem> = Vec::new();
        for row in rows {
            if !seeded.iter().any(|r| r.barcode == row.barcode) {
                seeded.push(row);
            }
        }
        Self {
            rows: RwLock::new(seeded),
        }
    }

    fn poisoned() -> StoreError {
        StoreError::Unavailable("lock poisoned".to_string())
    }
}

#[async_trait::async_trait]
impl StockStore for InMemoryStockStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn fetch_all(&self) -> Result<Vec<StockItem>, StoreError> {
        let rows = self.rows.read().map_err(|_| Self::poisoned())?;
        Ok(rows.clone())
    }

    async fn fetch_by_barcodes(&self, barcodes: &[Barcode]) -> Result<Vec<StockItem>, StoreError> {
        let rows = self.rows.read().map_err(|_| Self::poisoned())?;
        Ok(rows
            .iter()
            .filter(|r| barcodes.contains(&r.barcode))
            .cloned()
            .collect())
    }

    async fn upsert_quantity(&self, scan: &ScannedProduct) -> Result<StockItem, StoreError> {
        scan.validate()?;

        let mut rows = self.rows.write().map_err(|_| Self::poisoned())?;
        match rows.iter_mut().find(|r| r.barcode == scan.barcode) {
            Some(existing) => {
                existing.apply_scan(scan)?;
                Ok(existing.clone())
            }
            None => {
                let created = StockItem::from_scan(scan);
                rows.push(created.clone());
                Ok(created)
            }
        }
    }

    async fn update(&self, barcode: &Barcode, update: &StockItemUpdate) -> Result<StockItem, StoreError> {
        update.ensure_targets(barcode)?;

        let mut rows = self.rows.write().map_err(|_| Self::poisoned())?;
        let row = rows
            .iter_mut()
            .find(|r| &r.barcode == barcode)
            .ok_or(StoreError::NotFound)?;
        row.apply_update(update)?;
        Ok(row.clone())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn bc(s: &str) -> Barcode {
        s.parse().unwrap()
    }

    fn scan(code: &str, count: u64) -> ScannedProduct {
        ScannedProduct {
            barcode: bc(code),
            count,
            title: format!("title {code}"),
            brand: "Acme".to_string(),
            image: None,
        }
    }

    fn edit(quantity: u64, category: &str) -> StockItemUpdate {
        StockItemUpdate {
            barcode: None,
            title: "Edited".to_string(),
            brand: "Acme".to_string(),
            quantity,
            category: category.to_string(),
            last_edit: None,
            image: Some("edited.png".to_string()),
        }
    }

    #[tokio::test]
    async fn first_scan_creates_then_rescan_increments() {
        let store = InMemoryStockStore::new();

        let created = store.upsert_quantity(&scan("1", 3)).await.unwrap();
        assert_eq!(created.quantity, 3);

        let bumped = store.upsert_quantity(&scan("1", 2)).await.unwrap();
        assert_eq!(bumped.quantity, 5);
        assert_eq!(store.fetch_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn zero_count_is_rejected_without_writing() {
        let store = InMemoryStockStore::new();
        let err = store.upsert_quantity(&scan("1", 0)).await.unwrap_err();
        assert!(matches!(err, StoreError::Invalid(_)));
        assert!(store.fetch_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn fetch_all_preserves_insertion_order() {
        let store = InMemoryStockStore::new();
        for code in ["c", "a", "b"] {
            store.upsert_quantity(&scan(code, 1)).await.unwrap();
        }
        let codes: Vec<_> = store
            .fetch_all()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.barcode.into_inner())
            .collect();
        assert_eq!(codes, vec!["c", "a", "b"]);
    }

    #[tokio::test]
    async fn fetch_by_barcodes_returns_known_subset() {
        let store = InMemoryStockStore::new();
        store.upsert_quantity(&scan("1", 1)).await.unwrap();
        store.upsert_quantity(&scan("2", 1)).await.unwrap();

        let rows = store.fetch_by_barcodes(&[bc("2"), bc("missing")]).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].barcode, bc("2"));

        assert!(store.fetch_one(&bc("missing")).await.unwrap().is_none());
        assert!(store.fetch_one(&bc("1")).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn update_replaces_fields_or_reports_not_found() {
        let store = InMemoryStockStore::new();
        store.upsert_quantity(&scan("1", 1)).await.unwrap();

        let updated = store.update(&bc("1"), &edit(40, "Garden>Tools")).await.unwrap();
        assert_eq!(updated.quantity, 40);
        assert_eq!(updated.category, "Garden>Tools");
        assert_eq!(store.fetch_one(&bc("1")).await.unwrap().unwrap(), updated);

        let missing = store.update(&bc("nope"), &edit(1, "")).await.unwrap_err();
        assert!(matches!(missing, StoreError::NotFound));
    }

    #[tokio::test]
    async fn update_rejects_barcode_change() {
        let store = InMemoryStockStore::new();
        store.upsert_quantity(&scan("1", 1)).await.unwrap();

        let mut upd = edit(9, "A");
        upd.barcode = Some(bc("2"));
        let err = store.update(&bc("1"), &upd).await.unwrap_err();
        assert!(matches!(err, StoreError::Invalid(_)));
        assert_eq!(store.fetch_one(&bc("1")).await.unwrap().unwrap().quantity, 1);
    }

    #[tokio::test]
    async fn seeding_drops_duplicate_barcodes() {
        let first = StockItem::from_scan(&scan("1", 1));
        let dup = StockItem::from_scan(&scan("1", 99));
        let store = InMemoryStockStore::with_rows([first.clone(), dup]);
        assert_eq!(store.fetch_all().await.unwrap(), vec![first]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_rescans_all_land() {
        let store = Arc::new(InMemoryStockStore::new());

        let mut handles = Vec::new();
        for _ in 0..32 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.upsert_quantity(&scan("hot", 1)).await.unwrap();
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        assert_eq!(store.fetch_one(&bc("hot")).await.unwrap().unwrap().quantity, 32);
    }
}
