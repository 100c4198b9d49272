//! # Product Catalog Collaborator
//!
//! The escrow engine consumes the product catalog through a single
//! lookup at ledger-creation time. The catalog itself is an external
//! system; this module defines the seam and an in-memory implementation
//! used by the API binary and by tests.

use std::collections::HashMap;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// A marketplace product as seen by the escrow subsystem.
///
/// Only the fields the escrow ledger snapshots at creation. Listing
/// management (images, descriptions, pricing suggestions) lives in the
/// catalog service and never crosses this boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Catalog identifier for the listing.
    pub id: String,
    /// Listing title, denormalized onto the ledger at creation.
    pub title: String,
}

/// Read-only lookup into the product catalog.
pub trait ProductCatalog: Send + Sync {
    /// Resolve a product by its catalog identifier.
    fn find_product_by_id(&self, id: &str) -> Option<Product>;
}

/// In-memory product catalog.
///
/// The API binary seeds it from a JSON file at startup; tests insert
/// products directly.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    products: RwLock<HashMap<String, Product>>,
}

impl MemoryCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a catalog pre-populated with the given products.
    pub fn with_products(products: impl IntoIterator<Item = Product>) -> Self {
        let catalog = Self::new();
        for product in products {
            catalog.insert(product);
        }
        catalog
    }

    /// Insert or replace a product.
    pub fn insert(&self, product: Product) {
        self.products.write().insert(product.id.clone(), product);
    }

    /// Number of products in the catalog.
    pub fn len(&self) -> usize {
        self.products.read().len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ProductCatalog for MemoryCatalog {
    fn find_product_by_id(&self, id: &str) -> Option<Product> {
        self.products.read().get(id).cloned()
    }
}
