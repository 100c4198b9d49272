//! # Transition Engine
//!
//! The only writer of escrow ledgers. Every mutation other than opening
//! is one call to [`LedgerStore::transact`]: the guard-and-apply logic
//! on [`EscrowLedger`] runs as a pure function of the current record and
//! a timestamp captured once per call, so a guard failure aborts the
//! write and concurrent callers on the same ledger serialize cleanly.

use std::sync::Arc;

use chrono::Utc;

use crate::catalog::ProductCatalog;
use crate::error::EscrowError;
use crate::ledger::{ActorRole, EscrowId, EscrowLedger, TransitionAction};
use crate::store::LedgerStore;

/// Parameters for opening a new escrow ledger.
#[derive(Debug, Clone)]
pub struct OpenLedger {
    /// The product the escrow covers.
    pub product_id: String,
    /// The buyer initiating the escrow.
    pub buyer_id: String,
    /// The seller of the product.
    pub seller_id: String,
    /// Amount to hold, in smallest currency units.
    pub amount: i64,
    /// Currency code; defaults to `INR` when absent.
    pub currency: Option<String>,
}

/// Applies guarded transitions to escrow ledgers through the store's
/// atomic primitive.
#[derive(Clone)]
pub struct TransitionEngine {
    store: Arc<dyn LedgerStore>,
    catalog: Arc<dyn ProductCatalog>,
}

impl TransitionEngine {
    /// Create an engine over the given store and product catalog.
    pub fn new(store: Arc<dyn LedgerStore>, catalog: Arc<dyn ProductCatalog>) -> Self {
        Self { store, catalog }
    }

    /// Access the underlying ledger store (reads and sweeper queries).
    pub fn store(&self) -> &Arc<dyn LedgerStore> {
        &self.store
    }

    /// Open a new escrow ledger in `PENDING_PAYMENT`.
    ///
    /// Validates the request fields, resolves the product against the
    /// catalog, and writes the initial record. This is a plain insert,
    /// not a transition: there is no prior record to guard against.
    ///
    /// # Errors
    ///
    /// [`EscrowError::Validation`] for empty ids or a non-positive
    /// amount; [`EscrowError::ProductNotFound`] when the catalog cannot
    /// resolve the product.
    pub fn open_ledger(&self, request: OpenLedger) -> Result<EscrowLedger, EscrowError> {
        for (field, value) in [
            ("productId", &request.product_id),
            ("buyerId", &request.buyer_id),
            ("sellerId", &request.seller_id),
        ] {
            if value.trim().is_empty() {
                return Err(EscrowError::Validation(format!("{field} must not be empty")));
            }
        }
        if request.amount <= 0 {
            return Err(EscrowError::Validation(
                "amount must be a positive number of minor units".to_string(),
            ));
        }

        let product = self
            .catalog
            .find_product_by_id(&request.product_id)
            .ok_or_else(|| EscrowError::ProductNotFound {
                product_id: request.product_id.clone(),
            })?;

        let ledger = EscrowLedger::open(
            &product,
            request.buyer_id,
            request.seller_id,
            request.amount,
            request.currency.unwrap_or_else(|| "INR".to_string()),
            Utc::now(),
        );
        tracing::info!(ledger_id = %ledger.id, product_id = %ledger.product_id, "escrow ledger opened");
        self.store.insert(ledger.clone());
        Ok(ledger)
    }

    /// Apply one status transition as a single atomic store transaction.
    ///
    /// # Errors
    ///
    /// [`EscrowError::LedgerNotFound`] for an unknown id, otherwise
    /// whatever guard inside [`EscrowLedger::apply_action`] rejected the
    /// transition. Either way the stored record is unchanged on error.
    pub fn apply_transition(
        &self,
        id: &EscrowId,
        action: TransitionAction,
    ) -> Result<EscrowLedger, EscrowError> {
        let now = Utc::now();
        let updated = self
            .store
            .transact(id, &|ledger| ledger.apply_action(&action, now))?;
        tracing::info!(
            ledger_id = %id,
            target = %action.target,
            role = %action.role,
            "escrow transition committed"
        );
        Ok(updated)
    }

    /// Lock or unlock a ledger. Administrative action only.
    ///
    /// # Errors
    ///
    /// [`EscrowError::Unauthorized`] for non-admin roles,
    /// [`EscrowError::LedgerClosed`] on a terminal record,
    /// [`EscrowError::LedgerNotFound`] for an unknown id.
    pub fn set_locked(
        &self,
        id: &EscrowId,
        locked: bool,
        role: ActorRole,
    ) -> Result<EscrowLedger, EscrowError> {
        let now = Utc::now();
        let updated = self
            .store
            .transact(id, &|ledger| ledger.set_locked(locked, role, now))?;
        tracing::info!(ledger_id = %id, locked, "escrow ledger lock changed");
        Ok(updated)
    }
}
