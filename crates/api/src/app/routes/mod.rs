use axum::{Router, routing::get};

pub mod categories;
pub mod stock;
pub mod system;

/// Router for everything under `/api`.
pub fn router() -> Router {
    let api = Router::new()
        .route("/test", get(system::ping))
        .merge(categories::router())
        .merge(stock::router());

    Router::new().nest("/api", api)
}
