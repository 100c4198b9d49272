//! # trustcart-api — Binary Entry Point
//!
//! Starts the Axum HTTP server for the Trustcart escrow backend.
//! Binds to a configurable port (default 8080) and optionally seeds the
//! product catalog from a JSON file.

use trustcart_api::state::{AppConfig, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Build configuration from environment.
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    let state = AppState::with_config(AppConfig { port });

    // Seed the product catalog if a listing file is configured.
    match std::env::var("PRODUCT_CATALOG") {
        Ok(path) => {
            let count = state.seed_catalog_from_file(&path).map_err(|e| {
                tracing::error!("catalog seeding failed: {e}");
                e
            })?;
            tracing::info!(count, "catalog ready");
        }
        Err(_) => {
            tracing::warn!(
                "PRODUCT_CATALOG not set; catalog is empty and order creation will return 404"
            );
        }
    }

    let app = trustcart_api::app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Trustcart escrow API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
