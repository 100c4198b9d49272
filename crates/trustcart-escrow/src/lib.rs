#![deny(missing_docs)]

//! # trustcart-escrow — Escrow Ledger Core
//!
//! The escrow subsystem of the Trustcart marketplace backend:
//!
//! - **Ledger** ([`ledger`]): the persisted escrow record, the status
//!   state machine with its transition table, and the guarded
//!   transition function.
//!
//! - **Store** ([`store`]): the persistence seam, a keyed record store
//!   whose one hard requirement is an atomic per-key read-modify-write
//!   transaction, plus the in-memory implementation.
//!
//! - **Engine** ([`engine`]): opens ledgers and applies transitions,
//!   one store transaction per call.
//!
//! - **Sweeper** ([`sweeper`]): deadline-driven automatic refunds and
//!   releases, best-effort per record.
//!
//! - **Catalog** ([`catalog`]): the product-catalog collaborator
//!   interface consumed once at ledger creation.
//!
//! ## Design Principles
//!
//! 1. **One writer discipline.** `status`, the mirrored payment and
//!    shipment legs, and the closed/locked flags change only inside the
//!    engine's store transaction. Callers never assemble their own
//!    record mutations.
//!
//! 2. **Guards are pure.** The transition function is a function of the
//!    current record, the requested action and a timestamp; a rejection
//!    aborts the transaction and the stored record is untouched.
//!
//! 3. **Closed role and status enums.** No string comparison against
//!    `"ADMIN"` or free-form status names; unknown values fail at the
//!    serialization boundary.

pub mod catalog;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod store;
pub mod sweeper;

// Re-export primary types at crate root for ergonomic imports.
pub use catalog::{MemoryCatalog, Product, ProductCatalog};
pub use engine::{OpenLedger, TransitionEngine};
pub use error::EscrowError;
pub use ledger::{
    ActorRole, AuditEntry, EscrowId, EscrowLedger, PaymentStatus, ShipmentStatus, Status,
    TransitionAction,
};
pub use store::{LedgerStore, MemoryLedgerStore};
pub use sweeper::{MaintenanceReport, MaintenanceSweeper};
