//! # Escrow Error Types
//!
//! Structured error hierarchy for the escrow subsystem. Every variant
//! carries the context an operator needs to diagnose the failure without
//! inspecting logs: guard rejections name the ledger and the states
//! involved, authorization rejections say what relationship was missing.

use thiserror::Error;

use crate::ledger::Status;

/// Errors arising from escrow ledger operations.
///
/// Guard failures ([`LedgerClosed`](EscrowError::LedgerClosed),
/// [`IllegalTransition`](EscrowError::IllegalTransition),
/// [`LedgerLocked`](EscrowError::LedgerLocked),
/// [`Unauthorized`](EscrowError::Unauthorized)) abort the enclosing store
/// transaction and leave the persisted record untouched.
#[derive(Error, Debug)]
pub enum EscrowError {
    /// Request-level validation failed before any store access.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The referenced product does not exist in the catalog.
    #[error("product {product_id} not found")]
    ProductNotFound {
        /// The product identifier that failed to resolve.
        product_id: String,
    },

    /// No escrow ledger exists under the given identifier.
    #[error("escrow ledger {ledger_id} not found")]
    LedgerNotFound {
        /// The ledger identifier.
        ledger_id: String,
    },

    /// The ledger reached a terminal state and rejects all further
    /// transitions.
    #[error("escrow ledger {ledger_id} is closed in terminal state {status}")]
    LedgerClosed {
        /// The ledger identifier.
        ledger_id: String,
        /// The terminal status the ledger is resting in.
        status: Status,
    },

    /// The target state is not reachable from the current state.
    #[error("illegal transition from {from} to {to}")]
    IllegalTransition {
        /// The current ledger status.
        from: Status,
        /// The attempted target status.
        to: Status,
    },

    /// A non-admin actor attempted a non-dispute transition on a locked
    /// ledger.
    #[error("escrow ledger {ledger_id} is locked pending administrative review")]
    LedgerLocked {
        /// The ledger identifier.
        ledger_id: String,
    },

    /// The actor does not hold the relationship the transition requires.
    #[error("unauthorized: {reason}")]
    Unauthorized {
        /// What relationship or role was missing.
        reason: String,
    },

    /// The store's conditional update could not be committed even after
    /// internal retry. The caller may retry the whole operation.
    #[error("store conflict on escrow ledger {ledger_id}")]
    StoreConflict {
        /// The ledger identifier.
        ledger_id: String,
    },
}
