//! GeoSentience — Binary Entrypoint
//! Boots the Axum HTTP server, wiring routes, shared state, and middleware.
//! The browser dashboard (globe + chart) talks JSON to /api; see README.md.

use anyhow::Context;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use geosentience::api;
use geosentience::config::AppConfig;
use geosentience::metrics::Metrics;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("geosentience=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();

    init_tracing();

    let cfg = AppConfig::load_default().context("loading configuration")?;

    let metrics = Metrics::init(cfg.server.cache_ttl_secs);
    let state = api::AppState::from_config(&cfg).context("building app state")?;
    let router = api::router(state).merge(metrics.router());

    let listener = tokio::net::TcpListener::bind(&cfg.server.bind)
        .await
        .with_context(|| format!("binding {}", cfg.server.bind))?;
    tracing::info!(addr = %cfg.server.bind, "listening");

    axum::serve(listener, router).await.context("serving http")?;
    Ok(())
}
