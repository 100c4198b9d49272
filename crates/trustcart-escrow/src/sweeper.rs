//! # Maintenance Sweeper
//!
//! Drives time-based automatic transitions without per-record client
//! action: funded ledgers whose ship-by deadline passed are refunded to
//! the buyer, shipped ledgers whose safety window closed are released to
//! the seller.
//!
//! The sweep is best-effort and idempotent by policy: a per-record
//! failure (typically a race where another actor already moved the
//! record) is skipped and not counted, never aborting the rest of the
//! sweep. A record that lost eligibility simply no longer matches the
//! query on the next pass. Because every mutation goes through the
//! engine's atomic transaction, concurrent sweeps or a sweep racing a
//! manual action cannot double-refund or double-release a ledger.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::engine::TransitionEngine;
use crate::ledger::{ActorRole, Status, TransitionAction};

/// Actor id recorded in the audit trail for sweeper-driven transitions.
pub const SYSTEM_ACTOR: &str = "SYSTEM";

/// Counts of automatic transitions committed by one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceReport {
    /// Funded ledgers auto-refunded past their ship-by deadline.
    pub auto_refunded: usize,
    /// Shipped ledgers auto-released past their safety window.
    pub auto_released: usize,
}

/// Periodic/triggered scan applying deadline-driven transitions.
#[derive(Clone)]
pub struct MaintenanceSweeper {
    engine: TransitionEngine,
}

impl MaintenanceSweeper {
    /// Create a sweeper over the given engine.
    pub fn new(engine: TransitionEngine) -> Self {
        Self { engine }
    }

    /// Run one maintenance sweep to completion and report the counts.
    pub fn run(&self) -> MaintenanceReport {
        let now = Utc::now();
        let mut report = MaintenanceReport::default();

        for ledger in self.engine.store().list() {
            let (target, reason) = match ledger.status {
                Status::Funded if ledger.ship_by < now => {
                    (Status::Refunded, "Auto-refund: deadline exceeded")
                }
                Status::Shipped if ledger.auto_release_at.is_some_and(|at| at < now) => {
                    (Status::Released, "Auto-release: window closed")
                }
                _ => continue,
            };

            let action = TransitionAction {
                target,
                actor_id: SYSTEM_ACTOR.to_string(),
                role: ActorRole::System,
                reason: reason.to_string(),
            };
            match self.engine.apply_transition(&ledger.id, action) {
                Ok(_) if target == Status::Refunded => report.auto_refunded += 1,
                Ok(_) => report.auto_released += 1,
                Err(err) => {
                    tracing::debug!(ledger_id = %ledger.id, %err, "sweep skipped ledger");
                }
            }
        }

        tracing::info!(
            auto_refunded = report.auto_refunded,
            auto_released = report.auto_released,
            "maintenance sweep complete"
        );
        report
    }
}
