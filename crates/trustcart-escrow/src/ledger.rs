//! # Escrow Ledger Records
//!
//! The persisted state of one escrow transaction between a buyer and a
//! seller, plus the status machinery that governs it.
//!
//! ## Status machine
//!
//! ```text
//! PENDING_PAYMENT ─▶ FUNDED ─▶ SHIPPED ─▶ DELIVERED ─▶ RELEASED
//!        │              │         │            │
//!        ▼              ├─────────┴────────────┤
//!    CANCELLED          ▼                      ▼
//!                   DISPUTED ─────────▶ RELEASED | REFUNDED
//! ```
//!
//! Terminal states: `RELEASED`, `REFUNDED`, `CANCELLED`. A ledger in a
//! terminal state is closed and rejects every further transition.
//!
//! ## Invariants
//!
//! - `status` only ever moves along [`Status::valid_transitions`] edges.
//! - `is_closed` is true exactly when `status` is terminal.
//! - `auto_release_at` is `Some` iff the ledger has passed through
//!   `SHIPPED`.
//! - `audit_trail` is append-only: one entry per successful transition,
//!   plus the creation entry.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::Product;
use crate::error::EscrowError;

/// Grace period the seller has to ship after the escrow is opened.
pub const SHIP_GRACE_DAYS: i64 = 3;

/// Safety window after shipment before funds auto-release to the seller.
pub const AUTO_RELEASE_WINDOW_DAYS: i64 = 7;

// ── Identifiers ────────────────────────────────────────────────────────

/// A unique identifier for an escrow ledger.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EscrowId(Uuid);

impl EscrowId {
    /// Create a new random ledger identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for EscrowId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EscrowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Actor Roles ────────────────────────────────────────────────────────

/// The closed set of roles a caller can act under.
///
/// Roles arrive already authenticated from the upstream layer; unknown
/// role strings are rejected at the API boundary by deserialization
/// rather than being treated as an anonymous catch-all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActorRole {
    /// Marketplace administrator. Bypasses the authorization guard.
    Admin,
    /// The buyer side of a transaction.
    Buyer,
    /// The seller side of a transaction.
    Seller,
    /// Automated maintenance. May only auto-release or auto-refund.
    System,
    /// Authenticated but otherwise unprivileged caller.
    Guest,
}

impl ActorRole {
    /// The canonical string name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Buyer => "BUYER",
            Self::Seller => "SELLER",
            Self::System => "SYSTEM",
            Self::Guest => "GUEST",
        }
    }
}

impl std::fmt::Display for ActorRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Status Enums ───────────────────────────────────────────────────────

/// The primary lifecycle status of an escrow ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    /// Escrow opened, awaiting payment capture.
    PendingPayment,
    /// Payment captured and held.
    Funded,
    /// Seller confirmed shipment; auto-release window is running.
    Shipped,
    /// Buyer confirmed delivery.
    Delivered,
    /// Either party raised a dispute; awaiting resolution.
    Disputed,
    /// Funds transferred to the seller. Terminal.
    Released,
    /// Funds returned to the buyer. Terminal.
    Refunded,
    /// Escrow abandoned before funding completed. Terminal.
    Cancelled,
}

impl Status {
    /// All statuses, in lifecycle order.
    pub const ALL: [Status; 8] = [
        Self::PendingPayment,
        Self::Funded,
        Self::Shipped,
        Self::Delivered,
        Self::Disputed,
        Self::Released,
        Self::Refunded,
        Self::Cancelled,
    ];

    /// The canonical string name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PendingPayment => "PENDING_PAYMENT",
            Self::Funded => "FUNDED",
            Self::Shipped => "SHIPPED",
            Self::Delivered => "DELIVERED",
            Self::Disputed => "DISPUTED",
            Self::Released => "RELEASED",
            Self::Refunded => "REFUNDED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Convert a canonical status name back to a `Status`.
    ///
    /// Returns `None` for any other input.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.as_str() == name)
    }

    /// Whether this status is terminal (no outgoing transitions).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Released | Self::Refunded | Self::Cancelled)
    }

    /// The set of statuses reachable from this one.
    pub fn valid_transitions(&self) -> &'static [Status] {
        match self {
            Self::PendingPayment => &[Self::Funded, Self::Cancelled],
            Self::Funded => &[Self::Shipped, Self::Disputed, Self::Refunded],
            Self::Shipped => &[Self::Delivered, Self::Disputed],
            Self::Delivered => &[Self::Released, Self::Disputed, Self::Refunded],
            Self::Disputed => &[Self::Released, Self::Refunded],
            Self::Released | Self::Refunded | Self::Cancelled => &[],
        }
    }

    /// Whether `target` is reachable from this status in one step.
    pub fn can_transition_to(&self, target: Status) -> bool {
        self.valid_transitions().contains(&target)
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment leg of the escrow, derived from [`Status`] transitions.
///
/// Never independently settable; the transition engine is the only
/// writer, which keeps it from drifting out of sync with `status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    /// No payment captured yet.
    Pending,
    /// Payment captured and held in escrow.
    Completed,
    /// Held funds transferred to the seller.
    Transferred,
    /// Held funds returned to the buyer.
    Refunded,
}

/// Shipment leg of the escrow, derived from [`Status`] transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShipmentStatus {
    /// Nothing shipped yet.
    Pending,
    /// Seller confirmed shipment.
    Shipped,
    /// Buyer confirmed delivery.
    Delivered,
}

// ── Audit Trail ────────────────────────────────────────────────────────

/// One entry in a ledger's append-only audit trail.
///
/// Entries are never mutated or removed; insertion order is significant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    /// Unique identifier for this entry.
    pub id: Uuid,
    /// Status before the transition; `None` for the creation entry.
    pub previous_status: Option<Status>,
    /// Status after the transition.
    pub new_status: Status,
    /// The actor that drove the transition.
    pub actor_id: String,
    /// The role the actor acted under.
    pub role: ActorRole,
    /// Caller-supplied reason for the transition.
    pub reason: String,
    /// When the transition was committed.
    pub timestamp: DateTime<Utc>,
}

// ── Transition Action ──────────────────────────────────────────────────

/// A requested status transition, as validated by the engine.
#[derive(Debug, Clone)]
pub struct TransitionAction {
    /// The status to move the ledger into.
    pub target: Status,
    /// The acting user (or `"SYSTEM"` for sweeper-driven transitions).
    pub actor_id: String,
    /// The role the actor acts under.
    pub role: ActorRole,
    /// Free-form reason recorded in the audit trail.
    pub reason: String,
}

// ── The Ledger ─────────────────────────────────────────────────────────

/// One escrow transaction between a buyer and a seller.
///
/// Created via [`EscrowLedger::open`] and mutated exclusively through
/// [`EscrowLedger::apply_action`] and [`EscrowLedger::set_locked`], both
/// of which the engine runs inside a single store transaction. A ledger
/// is never deleted; reaching a terminal state closes it permanently and
/// the record persists as an audit artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EscrowLedger {
    /// Unique ledger identifier.
    pub id: EscrowId,
    /// The product the escrow covers. Existence is checked against the
    /// catalog at creation only.
    pub product_id: String,
    /// Snapshot of the product title at creation time.
    pub product_title: String,
    /// The buyer. Immutable.
    pub buyer_id: String,
    /// The seller. Immutable.
    pub seller_id: String,
    /// Amount held, in smallest currency units. Immutable.
    pub amount: i64,
    /// ISO 4217-style currency code. Immutable.
    pub currency: String,
    /// Current lifecycle status.
    pub status: Status,
    /// Payment leg, mirrored from status transitions.
    pub payment_status: PaymentStatus,
    /// Shipment leg, mirrored from status transitions.
    pub shipment_status: ShipmentStatus,
    /// While true, only an admin or a transition into `DISPUTED` may
    /// proceed. Settable only through [`EscrowLedger::set_locked`].
    pub is_locked: bool,
    /// True exactly when `status` is terminal.
    pub is_closed: bool,
    /// Deadline for the seller to ship; the sweeper auto-refunds a
    /// `FUNDED` ledger past it.
    pub ship_by: DateTime<Utc>,
    /// Deadline for the buyer to confirm or dispute; set when the ledger
    /// enters `SHIPPED`, `None` before that.
    pub auto_release_at: Option<DateTime<Utc>>,
    /// Append-only transition history, oldest first.
    pub audit_trail: Vec<AuditEntry>,
    /// When the ledger was created.
    pub created_at: DateTime<Utc>,
    /// Refreshed on every successful mutation.
    pub updated_at: DateTime<Utc>,
}

impl EscrowLedger {
    /// Create a new ledger in `PENDING_PAYMENT` for a resolved product.
    ///
    /// Field validation and product resolution happen in the engine;
    /// this constructor only assembles the record, including the
    /// creation audit entry and the `ship_by` deadline.
    pub fn open(
        product: &Product,
        buyer_id: String,
        seller_id: String,
        amount: i64,
        currency: String,
        now: DateTime<Utc>,
    ) -> Self {
        let creation_entry = AuditEntry {
            id: Uuid::new_v4(),
            previous_status: None,
            new_status: Status::PendingPayment,
            actor_id: buyer_id.clone(),
            role: ActorRole::Buyer,
            reason: "Escrow opened".to_string(),
            timestamp: now,
        };
        Self {
            id: EscrowId::new(),
            product_id: product.id.clone(),
            product_title: product.title.clone(),
            buyer_id,
            seller_id,
            amount,
            currency,
            status: Status::PendingPayment,
            payment_status: PaymentStatus::Pending,
            shipment_status: ShipmentStatus::Pending,
            is_locked: false,
            is_closed: false,
            ship_by: now + Duration::days(SHIP_GRACE_DAYS),
            auto_release_at: None,
            audit_trail: vec![creation_entry],
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply one guarded status transition.
    ///
    /// Guard order: closed-record, transition table, authorization
    /// (skipped entirely for [`ActorRole::Admin`]), then the
    /// deterministic side effects for the target status. The engine runs
    /// this inside the store's atomic transaction, so an `Err` from any
    /// guard leaves the persisted record untouched.
    ///
    /// # Errors
    ///
    /// [`EscrowError::LedgerClosed`] on a terminal record;
    /// [`EscrowError::IllegalTransition`] for a target outside the
    /// table; [`EscrowError::LedgerLocked`] for a non-admin, non-dispute
    /// transition while locked; [`EscrowError::Unauthorized`] when the
    /// actor lacks the required relationship.
    pub fn apply_action(
        &mut self,
        action: &TransitionAction,
        now: DateTime<Utc>,
    ) -> Result<(), EscrowError> {
        if self.is_closed {
            return Err(EscrowError::LedgerClosed {
                ledger_id: self.id.to_string(),
                status: self.status,
            });
        }
        if !self.status.can_transition_to(action.target) {
            return Err(EscrowError::IllegalTransition {
                from: self.status,
                to: action.target,
            });
        }
        if action.role != ActorRole::Admin {
            if self.is_locked && action.target != Status::Disputed {
                return Err(EscrowError::LedgerLocked {
                    ledger_id: self.id.to_string(),
                });
            }
            if self.status == Status::Funded
                && action.target == Status::Shipped
                && action.actor_id != self.seller_id
            {
                return Err(EscrowError::Unauthorized {
                    reason: "only the seller may confirm shipment".to_string(),
                });
            }
            if self.status == Status::Shipped
                && action.target == Status::Delivered
                && action.actor_id != self.buyer_id
            {
                return Err(EscrowError::Unauthorized {
                    reason: "only the buyer may confirm delivery".to_string(),
                });
            }
            // Enforced by role, not by the actor id string: a caller
            // whose declared role is SYSTEM is restricted to automatic
            // completions whatever its id says.
            if action.role == ActorRole::System
                && !matches!(action.target, Status::Released | Status::Refunded)
            {
                return Err(EscrowError::Unauthorized {
                    reason: "system actors may only release or refund".to_string(),
                });
            }
        }

        match action.target {
            Status::Funded => self.payment_status = PaymentStatus::Completed,
            Status::Shipped => {
                self.shipment_status = ShipmentStatus::Shipped;
                self.auto_release_at = Some(now + Duration::days(AUTO_RELEASE_WINDOW_DAYS));
            }
            Status::Delivered => self.shipment_status = ShipmentStatus::Delivered,
            Status::Released => {
                self.payment_status = PaymentStatus::Transferred;
                self.is_closed = true;
            }
            Status::Refunded => {
                self.payment_status = PaymentStatus::Refunded;
                self.is_closed = true;
            }
            Status::Cancelled => self.is_closed = true,
            Status::Disputed => {}
            // Never a target in the transition table.
            Status::PendingPayment => {}
        }

        let previous = self.status;
        self.status = action.target;
        self.updated_at = now;
        self.audit_trail.push(AuditEntry {
            id: Uuid::new_v4(),
            previous_status: Some(previous),
            new_status: action.target,
            actor_id: action.actor_id.clone(),
            role: action.role,
            reason: action.reason.clone(),
            timestamp: now,
        });
        Ok(())
    }

    /// Lock or unlock the ledger. Administrative action only.
    ///
    /// # Errors
    ///
    /// [`EscrowError::Unauthorized`] for non-admin roles;
    /// [`EscrowError::LedgerClosed`] on a terminal record.
    pub fn set_locked(
        &mut self,
        locked: bool,
        role: ActorRole,
        now: DateTime<Utc>,
    ) -> Result<(), EscrowError> {
        if role != ActorRole::Admin {
            return Err(EscrowError::Unauthorized {
                reason: "only an admin may lock or unlock a ledger".to_string(),
            });
        }
        if self.is_closed {
            return Err(EscrowError::LedgerClosed {
                ledger_id: self.id.to_string(),
                status: self.status,
            });
        }
        self.is_locked = locked;
        self.updated_at = now;
        Ok(())
    }
}
