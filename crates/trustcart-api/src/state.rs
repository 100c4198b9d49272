//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers
//! via the `State` extractor. Holds the transition engine, the
//! maintenance sweeper and the product catalog handle; the ledger store
//! itself is reachable through the engine.

use std::sync::Arc;

use trustcart_escrow::{
    MaintenanceSweeper, MemoryCatalog, MemoryLedgerStore, Product, TransitionEngine,
};

/// Runtime configuration, built from the environment in `main`.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// TCP port the server binds to.
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self { port: 8080 }
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Runtime configuration.
    pub config: AppConfig,
    /// The only writer of escrow ledgers.
    pub engine: TransitionEngine,
    /// Deadline-driven maintenance, triggered via the scheduler route.
    pub sweeper: MaintenanceSweeper,
    /// Product catalog handle, kept for seeding.
    pub catalog: Arc<MemoryCatalog>,
}

impl AppState {
    /// Create state with default configuration and empty stores.
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    /// Create state with the given configuration and empty stores.
    pub fn with_config(config: AppConfig) -> Self {
        let store = Arc::new(MemoryLedgerStore::new());
        let catalog = Arc::new(MemoryCatalog::new());
        let catalog_dyn: Arc<dyn trustcart_escrow::ProductCatalog> = Arc::clone(&catalog) as Arc<dyn trustcart_escrow::ProductCatalog>;
        let engine = TransitionEngine::new(store, catalog_dyn);
        let sweeper = MaintenanceSweeper::new(engine.clone());
        Self {
            config,
            engine,
            sweeper,
            catalog,
        }
    }

    /// Seed the product catalog from a JSON file containing an array of
    /// products. Returns the number of products loaded.
    pub fn seed_catalog_from_file(&self, path: &str) -> Result<usize, Box<dyn std::error::Error>> {
        let raw = std::fs::read_to_string(path)?;
        let products: Vec<Product> = serde_json::from_str(&raw)?;
        let count = products.len();
        for product in products {
            self.catalog.insert(product);
        }
        tracing::info!(count, path, "product catalog seeded");
        Ok(count)
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
