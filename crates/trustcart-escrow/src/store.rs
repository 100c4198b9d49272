//! # Ledger Store
//!
//! The persistence seam for escrow ledgers. The engine only requires a
//! keyed record store with one atomic primitive: [`LedgerStore::transact`]
//! reads the current record, applies a guard-and-mutate closure, and
//! commits the result such that no two transactions on the same key can
//! interleave. Any store with compare-and-swap or serializable
//! transactions can sit behind this trait; the in-memory implementation
//! here backs the API binary and the test suite.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::EscrowError;
use crate::ledger::{EscrowId, EscrowLedger};

/// Keyed escrow ledger storage with a per-key atomic transaction.
pub trait LedgerStore: Send + Sync {
    /// Store a freshly created ledger under its own id.
    fn insert(&self, ledger: EscrowLedger);

    /// Retrieve a ledger by id.
    fn get(&self, id: &EscrowId) -> Option<EscrowLedger>;

    /// List all ledgers.
    fn list(&self) -> Vec<EscrowLedger>;

    /// Atomically read-validate-update one ledger.
    ///
    /// The closure receives the current record and may inspect, validate
    /// and mutate it. Transactions on the same key are strictly
    /// serialized: the closure never observes a stale read. An `Err`
    /// from the closure aborts the write entirely, leaving the stored
    /// record byte-for-byte unchanged.
    ///
    /// # Errors
    ///
    /// [`EscrowError::LedgerNotFound`] for an unknown id; whatever the
    /// closure returned on a guard failure; [`EscrowError::StoreConflict`]
    /// from implementations whose conditional update can fail after
    /// internal retry.
    fn transact(
        &self,
        id: &EscrowId,
        apply: &dyn Fn(&mut EscrowLedger) -> Result<(), EscrowError>,
    ) -> Result<EscrowLedger, EscrowError>;
}

/// Thread-safe, cloneable in-memory ledger store.
///
/// All operations are synchronous (the RwLock is `parking_lot`, not
/// `tokio::sync`) because the lock is never held across an `.await`
/// point. Holding the write lock for the whole of [`transact`] trivially
/// serializes transactions per key, and applying the closure to a clone
/// that is only committed on `Ok` guarantees the abort-discards-writes
/// contract. This store never emits [`EscrowError::StoreConflict`].
///
/// [`transact`]: LedgerStore::transact
#[derive(Debug, Default)]
pub struct MemoryLedgerStore {
    data: Arc<RwLock<HashMap<EscrowId, EscrowLedger>>>,
}

impl Clone for MemoryLedgerStore {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
        }
    }
}

impl MemoryLedgerStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of ledgers in the store.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LedgerStore for MemoryLedgerStore {
    fn insert(&self, ledger: EscrowLedger) {
        self.data.write().insert(ledger.id.clone(), ledger);
    }

    fn get(&self, id: &EscrowId) -> Option<EscrowLedger> {
        self.data.read().get(id).cloned()
    }

    fn list(&self) -> Vec<EscrowLedger> {
        self.data.read().values().cloned().collect()
    }

    fn transact(
        &self,
        id: &EscrowId,
        apply: &dyn Fn(&mut EscrowLedger) -> Result<(), EscrowError>,
    ) -> Result<EscrowLedger, EscrowError> {
        let mut guard = self.data.write();
        let current = guard.get(id).ok_or_else(|| EscrowError::LedgerNotFound {
            ledger_id: id.to_string(),
        })?;
        let mut draft = current.clone();
        apply(&mut draft)?;
        guard.insert(id.clone(), draft.clone());
        Ok(draft)
    }
}
