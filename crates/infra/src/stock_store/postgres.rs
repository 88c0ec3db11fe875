//! Postgres-backed stock store.
//!
//! ## Error Mapping
//!
//! | SQLx Error | StoreError |
//! |------------|------------|
//! | Database (any code) | `Unavailable` |
//! | PoolClosed / PoolTimedOut / Io / Tls | `Unavailable` |
//! | ColumnDecode / Decode / ColumnNotFound | `Decode` |
//! | Other | `Unavailable` |
//!
//! ## Atomicity
//!
//! Rescans use a single `INSERT .. ON CONFLICT DO UPDATE` so the increment is
//! computed by Postgres under the row lock; there is no read-modify-write in
//! this process.

use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use tracing::instrument;

use shelfscan_core::{Barcode, DomainError};
use shelfscan_inventory::{ScannedProduct, StockItem, StockItemUpdate};

use super::r#trait::{StockStore, StoreError};

const SCHEMA: &str = include_str!("../../migrations/0001_stock.sql");

const COLUMNS: &str = "barcode, title, brand, quantity, category, image, last_edit";

/// Postgres stock table adapter.
///
/// `PgPool` is internally reference counted, so cloning the store is cheap and
/// all clones share one pool.
#[derive(Debug, Clone)]
pub struct PostgresStockStore {
    pool: PgPool,
}

impl PostgresStockStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool against `database_url`.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create the `stock` table if it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        Ok(())
    }
}

fn decode_row(row: &PgRow) -> Result<StockItem, StoreError> {
    let decode = |e: sqlx::Error| map_sqlx_error("decode_row", e);

    let barcode: String = row.try_get("barcode").map_err(decode)?;
    let quantity: i64 = row.try_get("quantity").map_err(decode)?;

    Ok(StockItem {
        barcode: Barcode::try_from(barcode).map_err(|e| StoreError::Decode(e.to_string()))?,
        title: row.try_get("title").map_err(decode)?,
        brand: row.try_get("brand").map_err(decode)?,
        quantity: u64::try_from(quantity)
            .map_err(|_| StoreError::Decode(format!("negative quantity {quantity}")))?,
        category: row
            .try_get::<Option<String>, _>("category")
            .map_err(decode)?
            .unwrap_or_default(),
        image: row.try_get("image").map_err(decode)?,
        last_edit: row
            .try_get::<Option<DateTime<Utc>>, _>("last_edit")
            .map_err(decode)?,
    })
}

fn to_db_quantity(quantity: u64) -> Result<i64, StoreError> {
    i64::try_from(quantity)
        .map_err(|_| StoreError::Invalid(DomainError::validation("quantity out of range")))
}

#[async_trait::async_trait]
impl StockStore for PostgresStockStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    #[instrument(skip(self))]
    async fn fetch_all(&self) -> Result<Vec<StockItem>, StoreError> {
        let sql = format!("SELECT {COLUMNS} FROM stock ORDER BY created_at ASC, barcode ASC");
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("fetch_all", e))?;

        rows.iter().map(decode_row).collect()
    }

    #[instrument(skip(self, barcodes), fields(count = barcodes.len()))]
    async fn fetch_by_barcodes(&self, barcodes: &[Barcode]) -> Result<Vec<StockItem>, StoreError> {
        if barcodes.is_empty() {
            return Ok(Vec::new());
        }

        let keys: Vec<String> = barcodes.iter().map(|b| b.as_str().to_string()).collect();
        let sql = format!(
            "SELECT {COLUMNS} FROM stock WHERE barcode = ANY($1) ORDER BY created_at ASC, barcode ASC"
        );
        let rows = sqlx::query(&sql)
            .bind(keys)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("fetch_by_barcodes", e))?;

        rows.iter().map(decode_row).collect()
    }

    #[instrument(skip(self, barcode), fields(barcode = %barcode))]
    async fn fetch_one(&self, barcode: &Barcode) -> Result<Option<StockItem>, StoreError> {
        let sql = format!("SELECT {COLUMNS} FROM stock WHERE barcode = $1");
        let row = sqlx::query(&sql)
            .bind(barcode.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("fetch_one", e))?;

        row.as_ref().map(decode_row).transpose()
    }

    #[instrument(skip(self, scan), fields(barcode = %scan.barcode, count = scan.count))]
    async fn upsert_quantity(&self, scan: &ScannedProduct) -> Result<StockItem, StoreError> {
        scan.validate()?;

        let sql = format!(
            r#"
            INSERT INTO stock (barcode, title, brand, quantity, image)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (barcode)
            DO UPDATE SET quantity = stock.quantity + EXCLUDED.quantity
            RETURNING {COLUMNS}
            "#
        );
        let row = sqlx::query(&sql)
            .bind(scan.barcode.as_str())
            .bind(&scan.title)
            .bind(&scan.brand)
            .bind(to_db_quantity(scan.count)?)
            .bind(scan.image.as_deref())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("upsert_quantity", e))?;

        decode_row(&row)
    }

    #[instrument(skip(self, barcode, update), fields(barcode = %barcode))]
    async fn update(&self, barcode: &Barcode, update: &StockItemUpdate) -> Result<StockItem, StoreError> {
        update.ensure_targets(barcode)?;

        let sql = format!(
            r#"
            UPDATE stock
            SET title = $2,
                brand = $3,
                quantity = $4,
                category = $5,
                last_edit = $6,
                image = $7
            WHERE barcode = $1
            RETURNING {COLUMNS}
            "#
        );
        let row = sqlx::query(&sql)
            .bind(barcode.as_str())
            .bind(&update.title)
            .bind(&update.brand)
            .bind(to_db_quantity(update.quantity)?)
            .bind(&update.category)
            .bind(update.last_edit)
            .bind(update.image.as_deref())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("update", e))?;

        match row {
            Some(row) => decode_row(&row),
            None => Err(StoreError::NotFound),
        }
    }
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => StoreError::Unavailable(format!(
            "database error in {}: {}",
            operation,
            db_err.message()
        )),
        sqlx::Error::PoolClosed => {
            StoreError::Unavailable(format!("connection pool closed in {}", operation))
        }
        sqlx::Error::PoolTimedOut => {
            StoreError::Unavailable(format!("connection pool timed out in {}", operation))
        }
        sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::ColumnNotFound(_) => {
            StoreError::Decode(format!("{} in {}", err, operation))
        }
        other => StoreError::Unavailable(format!("{} in {}", other, operation)),
    }
}
