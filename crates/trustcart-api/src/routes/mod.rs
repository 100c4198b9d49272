//! # API Route Modules
//!
//! - `escrow` — the escrow payment surface: order creation, guarded
//!   transition actions, administrative locking, scheduled maintenance,
//!   and ledger queries.
//!
//! Catalog listings, image similarity search, price prediction, logo
//! verification, and messaging live in separate services; the escrow
//! routes consume the product catalog only through the lookup seam in
//! `trustcart-escrow`.

pub mod escrow;
