//! Infrastructure layer: stock datastore adapters and configuration.

pub mod config;
pub mod stock_store;
