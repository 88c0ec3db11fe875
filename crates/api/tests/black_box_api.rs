use std::sync::Arc;

use reqwest::StatusCode;
use serde_json::{Value, json};

use shelfscan_api::app::{build_app, services::AppServices};
use shelfscan_core::Barcode;
use shelfscan_infra::stock_store::{InMemoryStockStore, StockStore, StoreError};
use shelfscan_inventory::{CategoryAggregator, CategoryMatch, ScannedProduct, StockItem, StockItemUpdate};

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(rows: Vec<StockItem>, mode: CategoryMatch) -> Self {
        Self::spawn_with_store(Arc::new(InMemoryStockStore::with_rows(rows)), mode).await
    }

    async fn spawn_with_store(store: Arc<dyn StockStore>, mode: CategoryMatch) -> Self {
        // Same router as prod, ephemeral port.
        let services = AppServices::new(store, CategoryAggregator::new(mode));
        let app = build_app(Arc::new(services));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            client: reqwest::Client::new(),
            handle,
        }
    }

    async fn get(&self, path: &str) -> (StatusCode, Value) {
        let res = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
            .unwrap();
        let status = res.status();
        (status, res.json().await.unwrap())
    }

    async fn send(&self, method: reqwest::Method, path: &str, body: Value) -> (StatusCode, Value) {
        let res = self
            .client
            .request(method, format!("{}{}", self.base_url, path))
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = res.status();
        (status, res.json().await.unwrap())
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Store whose every call fails the way a broken backend would.
enum BrokenStore {
    Unreachable,
    Corrupt,
}

impl BrokenStore {
    fn error(&self) -> StoreError {
        match self {
            BrokenStore::Unreachable => StoreError::Unavailable("connection refused".to_string()),
            BrokenStore::Corrupt => StoreError::Decode("negative quantity -3".to_string()),
        }
    }
}

#[async_trait::async_trait]
impl StockStore for BrokenStore {
    fn backend(&self) -> &'static str {
        "broken"
    }

    async fn fetch_all(&self) -> Result<Vec<StockItem>, StoreError> {
        Err(self.error())
    }

    async fn fetch_by_barcodes(&self, _barcodes: &[Barcode]) -> Result<Vec<StockItem>, StoreError> {
        Err(self.error())
    }

    async fn upsert_quantity(&self, _scan: &ScannedProduct) -> Result<StockItem, StoreError> {
        Err(self.error())
    }

    async fn update(&self, _barcode: &Barcode, _update: &StockItemUpdate) -> Result<StockItem, StoreError> {
        Err(self.error())
    }
}

fn row(code: &str, category: &str, quantity: u64) -> StockItem {
    StockItem {
        barcode: code.parse().unwrap(),
        title: format!("item {code}"),
        brand: "Acme".to_string(),
        quantity,
        category: category.to_string(),
        image: None,
        last_edit: None,
    }
}

fn nested_rows() -> Vec<StockItem> {
    vec![row("a", "A", 5), row("ab", "A>B", 3), row("abc", "A>B>C", 2)]
}

#[tokio::test]
async fn health_reports_healthy() {
    let srv = TestServer::spawn(Vec::new(), CategoryMatch::Prefix).await;

    let (status, body) = srv.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "healthy" }));

    let (status, body) = srv.get("/api/test").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "API is working!");
}

#[tokio::test]
async fn categories_roll_up_nested_quantities() {
    let mut rows = nested_rows();
    rows.push(row("t", "Tools>Hand", 4));
    rows.push(row("loose", "", 9));
    let srv = TestServer::spawn(rows, CategoryMatch::Prefix).await;

    let (status, body) = srv.get("/api/categories").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([
            { "name": "A", "itemCount": 10 },
            { "name": "Tools", "itemCount": 4 },
        ])
    );
}

#[tokio::test]
async fn category_info_lists_direct_items_and_children() {
    let srv = TestServer::spawn(nested_rows(), CategoryMatch::Prefix).await;

    let (status, body) = srv.get("/api/category_info/A").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "categories": [{ "categoryName": "A>B", "sumQuantity": 5 }],
            "items": ["a"],
            "subTotalQuantity": 10,
        })
    );
}

#[tokio::test]
async fn category_info_accepts_percent_encoded_paths() {
    let srv = TestServer::spawn(nested_rows(), CategoryMatch::Prefix).await;

    let (status, body) = srv.get("/api/category_info/A%3EB").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"], json!(["ab"]));
    assert_eq!(body["categories"], json!([{ "categoryName": "A>B>C", "sumQuantity": 2 }]));
    assert_eq!(body["subTotalQuantity"], 5);
}

#[tokio::test]
async fn category_info_on_empty_store_has_no_subtotal() {
    let srv = TestServer::spawn(Vec::new(), CategoryMatch::Prefix).await;

    let (status, body) = srv.get("/api/category_info/A").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "categories": [], "items": [] }));
}

#[tokio::test]
async fn unknown_category_is_empty_but_totalled() {
    let srv = TestServer::spawn(nested_rows(), CategoryMatch::Prefix).await;

    let (status, body) = srv.get("/api/category_info/Nope").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "categories": [], "items": [], "subTotalQuantity": 0 })
    );
}

#[tokio::test]
async fn segment_mode_ignores_name_prefix_collisions() {
    let rows = vec![row("a", "A", 1), row("ab", "AB", 7), row("abx", "AB>X", 2)];

    let prefix = TestServer::spawn(rows.clone(), CategoryMatch::Prefix).await;
    let (_, body) = prefix.get("/api/category_info/A").await;
    assert_eq!(body["subTotalQuantity"], 10);
    assert_eq!(body["categories"], json!([{ "categoryName": "AB>X", "sumQuantity": 2 }]));

    let segment = TestServer::spawn(rows, CategoryMatch::Segment).await;
    let (_, body) = segment.get("/api/category_info/A").await;
    assert_eq!(body["subTotalQuantity"], 1);
    assert_eq!(body["categories"], json!([]));
}

#[tokio::test]
async fn quantity_update_creates_then_increments() {
    let srv = TestServer::spawn(Vec::new(), CategoryMatch::Prefix).await;

    let scan = json!({
        "products": [
            { "barcode": "5000", "count": 2, "title": "Fuse", "brand": "Acme" }
        ]
    });

    let (status, body) = srv
        .send(reqwest::Method::POST, "/api/quantity_update", scan.clone())
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Successfully updated quantities");

    let (status, _) = srv
        .send(reqwest::Method::POST, "/api/quantity_update", scan)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, item) = srv.get("/api/item_info/5000").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(item["quantity"], 4);
    assert_eq!(item["title"], "Fuse");
    assert_eq!(item["category"], "");
}

#[tokio::test]
async fn quantity_update_rejects_empty_and_zero_batches() {
    let srv = TestServer::spawn(Vec::new(), CategoryMatch::Prefix).await;

    let (status, body) = srv
        .send(reqwest::Method::POST, "/api/quantity_update", json!({ "products": [] }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "malformed_input");

    let (status, _) = srv
        .send(reqwest::Method::POST, "/api/quantity_update", json!({}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = srv
        .send(
            reqwest::Method::POST,
            "/api/quantity_update",
            json!({ "products": [{ "barcode": "1", "count": 0 }] }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = srv.get("/api/item_info/1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn item_info_unknown_barcode_is_not_found() {
    let srv = TestServer::spawn(nested_rows(), CategoryMatch::Prefix).await;

    let (status, body) = srv.get("/api/item_info/missing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn stock_update_replaces_row_fields() {
    let srv = TestServer::spawn(nested_rows(), CategoryMatch::Prefix).await;

    let (status, body) = srv
        .send(
            reqwest::Method::PUT,
            "/api/stock/update/abc",
            json!({
                "barcode": "abc",
                "title": "Renamed",
                "brand": "Other",
                "quantity": 11,
                "category": "Z",
                "last_edit": "2024-08-10T12:00:00Z",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Successfully updated stock item");

    let (_, item) = srv.get("/api/item_info/abc").await;
    assert_eq!(item["title"], "Renamed");
    assert_eq!(item["quantity"], 11);
    assert_eq!(item["category"], "Z");

    let (_, categories) = srv.get("/api/categories").await;
    assert_eq!(
        categories,
        json!([
            { "name": "A", "itemCount": 8 },
            { "name": "Z", "itemCount": 11 },
        ])
    );
}

#[tokio::test]
async fn stock_update_errors() {
    let srv = TestServer::spawn(nested_rows(), CategoryMatch::Prefix).await;
    let update = |barcode: &str| {
        json!({
            "barcode": barcode,
            "title": "t",
            "brand": "b",
            "quantity": 1,
            "category": "A",
        })
    };

    let (status, _) = srv
        .send(reqwest::Method::PUT, "/api/stock/update/missing", update("missing"))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = srv
        .send(reqwest::Method::PUT, "/api/stock/update/a", update("other"))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "malformed_input");

    let (status, _) = srv
        .send(reqwest::Method::PUT, "/api/stock/update/a", json!({ "title": "only" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn scanned_products_info_prefers_stored_rows() {
    let srv = TestServer::spawn(nested_rows(), CategoryMatch::Prefix).await;

    let (status, body) = srv
        .send(
            reqwest::Method::POST,
            "/api/scanned_products_info",
            json!({
                "barcodes": ["new", "a", "gone"],
                "scanHistory": [
                    { "barcode": "new", "title": "Looked up", "brand": "B", "image": "i.png" },
                    { "barcode": "a", "title": "Stale", "brand": "B", "image": "" },
                ],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([
            {
                "barcode": "new",
                "title": "Looked up",
                "quantity": 0,
                "brand": "B",
                "image": "i.png",
                "fromScan": true,
            },
            { "barcode": "a", "title": "item a", "quantity": 5, "fromScan": false },
        ])
    );

    let (status, body) = srv
        .send(reqwest::Method::POST, "/api/scanned_products_info", json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn unavailable_store_surfaces_as_server_error() {
    let srv = TestServer::spawn_with_store(Arc::new(BrokenStore::Unreachable), CategoryMatch::Prefix).await;

    for path in ["/api/categories", "/api/category_info/A", "/api/item_info/a"] {
        let (status, body) = srv.get(path).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{path}");
        assert_eq!(body["error"], "store_unavailable", "{path}");
        assert!(body["message"].as_str().unwrap().contains("connection refused"));
    }

    let (status, body) = srv
        .send(
            reqwest::Method::POST,
            "/api/quantity_update",
            json!({ "products": [{ "barcode": "1", "count": 1 }] }),
        )
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "store_unavailable");

    // Empty lookups never reach the store.
    let (status, body) = srv
        .send(reqwest::Method::POST, "/api/scanned_products_info", json!({ "barcodes": [] }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn undecodable_rows_surface_as_server_error() {
    let srv = TestServer::spawn_with_store(Arc::new(BrokenStore::Corrupt), CategoryMatch::Segment).await;

    let (status, body) = srv.get("/api/categories").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "decode_error");
}
