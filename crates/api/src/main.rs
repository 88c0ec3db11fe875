use std::sync::Arc;

use anyhow::Context;

use shelfscan_api::app::{build_app, services};
use shelfscan_api::shutdown::shutdown_signal;
use shelfscan_infra::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("loading configuration")?;
    shelfscan_observability::init(config.log_format);

    let services = services::build_services(&config)
        .await
        .context("building stock store")?;

    tracing::info!(
        backend = services.store().backend(),
        category_match = services.aggregator().mode().as_str(),
        "services ready"
    );

    let app = build_app(Arc::new(services));

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}
