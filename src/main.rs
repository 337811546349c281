//! KYC Site Scan Engine - host binary
//!
//! Boots a [`kyc_screen::engine::ScanEngine`] and exposes it over HTTP.

use anyhow::{Context, Result};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kyc_screen::api::{self, AppState};
use kyc_screen::config::Config;
use kyc_screen::ScanEngine;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = Config::from_env().context("loading configuration")?;
    let addr = format!("{}:{}", config.host, config.port);

    let engine = ScanEngine::new(config).with_browser().await;
    let state = AppState::new(engine);

    let app = api::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("KYC scan engine listening on {}", addr);

    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kyc_screen=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
