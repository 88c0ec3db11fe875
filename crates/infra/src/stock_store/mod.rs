//! Stock datastore boundary.
//!
//! The store is the only source of truth for stock rows. Nothing above this
//! module caches rows; every read goes back to the store.

pub mod in_memory;
#[cfg(feature = "postgres")]
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemoryStockStore;
#[cfg(feature = "postgres")]
pub use postgres::PostgresStockStore;
pub use r#trait::{StockStore, StoreError};
