//! # Escrow Payment API
//!
//! HTTP surface over the escrow transition engine.
//!
//! ## Endpoints
//!
//! - `POST /escrow/order` — open an escrow for a product
//! - `POST /escrow/process-action` — request a status transition
//! - `POST /escrow/:id/lock` — admin lock/unlock
//! - `POST /escrow/scheduler/maintenance` — run the deadline sweep
//! - `GET /escrow/:id` — fetch one ledger
//! - `GET /escrow/user/:user_id` — ledgers where the user is a party
//!
//! ## Response convention
//!
//! Guard failures on `process-action` are business outcomes, not
//! transport errors: the endpoint answers `200` with `success: false`
//! and a human-readable message (the message text is not a stable
//! contract, only the boolean is). Request-shape problems, unknown
//! ids, and the administrative surface use conventional status codes
//! through [`AppError`].

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use trustcart_escrow::{
    ActorRole, EscrowError, EscrowId, EscrowLedger, MaintenanceReport, OpenLedger, Status,
    TransitionAction,
};

use crate::error::AppError;
use crate::state::AppState;

/// Reason recorded when the caller does not supply one.
const DEFAULT_REASON: &str = "No reason provided";

// ── Request/Response DTOs ───────────────────────────────────────────

/// Request to open an escrow order.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OpenOrderRequest {
    /// The product being purchased.
    pub product_id: String,
    /// The buyer opening the escrow.
    pub buyer_id: String,
    /// The seller of the product.
    pub seller_id: String,
    /// Amount to hold, in smallest currency units.
    pub amount: i64,
    /// Currency code; defaults to INR.
    #[serde(default)]
    pub currency: Option<String>,
}

impl OpenOrderRequest {
    /// Business-rule validation beyond what serde checks structurally.
    fn validate(&self) -> Result<(), AppError> {
        for (field, value) in [
            ("productId", &self.product_id),
            ("buyerId", &self.buyer_id),
            ("sellerId", &self.seller_id),
        ] {
            if value.trim().is_empty() {
                return Err(AppError::Validation(format!("{field} must not be empty")));
            }
        }
        if self.amount <= 0 {
            return Err(AppError::Validation(
                "amount must be a positive number of minor units".to_string(),
            ));
        }
        Ok(())
    }
}

/// Response to a successful order creation.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OpenOrderResponse {
    /// Identifier of the newly opened escrow ledger.
    pub escrow_id: Uuid,
}

/// Request to apply a status transition.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProcessActionRequest {
    /// The escrow ledger to act on.
    pub escrow_id: Uuid,
    /// Target status name (e.g., `"SHIPPED"`); unknown names are
    /// rejected at deserialization.
    #[schema(value_type = String)]
    pub target_state: Status,
    /// The acting user.
    pub user_id: String,
    /// Role the actor acts under; defaults to GUEST. Unknown role
    /// strings are rejected at deserialization.
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub role: Option<ActorRole>,
    /// Free-form reason recorded in the audit trail.
    #[serde(default)]
    pub reason: Option<String>,
}

impl ProcessActionRequest {
    /// An empty actor id would defeat the seller/buyer relationship
    /// checks in the engine.
    fn validate(&self) -> Result<(), AppError> {
        if self.user_id.trim().is_empty() {
            return Err(AppError::Validation("userId must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Outcome envelope for transition actions.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ActionResponse {
    /// Whether the transition committed.
    pub success: bool,
    /// Human-readable outcome description. Not a stable contract.
    pub message: String,
}

/// Request to lock or unlock a ledger (administrative).
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LockRequest {
    /// The acting administrator.
    pub user_id: String,
    /// Role the actor acts under; must be ADMIN.
    #[schema(value_type = String)]
    pub role: ActorRole,
    /// Desired lock state.
    pub locked: bool,
}

impl LockRequest {
    /// The acting administrator is recorded in the log line; require it.
    fn validate(&self) -> Result<(), AppError> {
        if self.user_id.trim().is_empty() {
            return Err(AppError::Validation("userId must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Response carrying one escrow ledger.
#[derive(Debug, Serialize, ToSchema)]
pub struct EscrowResponse {
    /// The ledger record.
    #[schema(value_type = Object)]
    pub escrow: EscrowLedger,
}

/// Response carrying all ledgers a user is party to.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserEscrowsResponse {
    /// Ledgers where the user is buyer or seller.
    #[schema(value_type = Vec<Object>)]
    pub escrows: Vec<EscrowLedger>,
}

/// Response to a maintenance run.
#[derive(Debug, Serialize, ToSchema)]
pub struct MaintenanceResponse {
    /// Always true; the sweep itself is best-effort per record.
    pub success: bool,
    /// Counts of automatic transitions committed.
    #[schema(value_type = Object)]
    pub report: MaintenanceReport,
}

// ── Router ──────────────────────────────────────────────────────────

/// Build the escrow router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/escrow/order", post(open_order))
        .route("/escrow/process-action", post(process_action))
        .route("/escrow/scheduler/maintenance", post(run_maintenance))
        .route("/escrow/user/:user_id", get(list_for_user))
        .route("/escrow/:id", get(get_escrow))
        .route("/escrow/:id/lock", post(set_lock))
}

// ── Handlers ────────────────────────────────────────────────────────

/// POST /escrow/order — Open an escrow for a product.
#[utoipa::path(
    post,
    path = "/escrow/order",
    request_body = OpenOrderRequest,
    responses(
        (status = 201, description = "Escrow opened", body = OpenOrderResponse),
        (status = 404, description = "Product not found", body = crate::error::ErrorBody),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    tag = "escrow"
)]
async fn open_order(
    State(state): State<AppState>,
    body: Result<Json<OpenOrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<OpenOrderResponse>), AppError> {
    // Malformed JSON is a 400; a well-formed body failing the business
    // rules is a 422.
    let Json(req) = body.map_err(|err| AppError::BadRequest(err.body_text()))?;
    req.validate()?;
    let ledger = state.engine.open_ledger(OpenLedger {
        product_id: req.product_id,
        buyer_id: req.buyer_id,
        seller_id: req.seller_id,
        amount: req.amount,
        currency: req.currency,
    })?;
    Ok((
        StatusCode::CREATED,
        Json(OpenOrderResponse {
            escrow_id: *ledger.id.as_uuid(),
        }),
    ))
}

/// POST /escrow/process-action — Request a status transition.
#[utoipa::path(
    post,
    path = "/escrow/process-action",
    request_body = ProcessActionRequest,
    responses(
        (status = 200, description = "Transition outcome", body = ActionResponse),
        (status = 404, description = "Escrow not found", body = crate::error::ErrorBody),
        (status = 400, description = "Malformed request", body = crate::error::ErrorBody),
    ),
    tag = "escrow"
)]
async fn process_action(
    State(state): State<AppState>,
    body: Result<Json<ProcessActionRequest>, JsonRejection>,
) -> Result<Json<ActionResponse>, AppError> {
    let Json(req) = body.map_err(|err| AppError::BadRequest(err.body_text()))?;
    req.validate()?;
    let id = EscrowId::from_uuid(req.escrow_id);
    let action = TransitionAction {
        target: req.target_state,
        actor_id: req.user_id,
        role: req.role.unwrap_or(ActorRole::Guest),
        reason: req.reason.unwrap_or_else(|| DEFAULT_REASON.to_string()),
    };

    match state.engine.apply_transition(&id, action) {
        Ok(ledger) => Ok(Json(ActionResponse {
            success: true,
            message: format!("escrow moved to {}", ledger.status),
        })),
        Err(
            err @ (EscrowError::LedgerClosed { .. }
            | EscrowError::IllegalTransition { .. }
            | EscrowError::LedgerLocked { .. }
            | EscrowError::Unauthorized { .. }),
        ) => Ok(Json(ActionResponse {
            success: false,
            message: err.to_string(),
        })),
        Err(other) => Err(other.into()),
    }
}

/// POST /escrow/:id/lock — Lock or unlock a ledger (admin only).
#[utoipa::path(
    post,
    path = "/escrow/{id}/lock",
    params(("id" = Uuid, Path, description = "Escrow ledger ID")),
    request_body = LockRequest,
    responses(
        (status = 200, description = "Lock state updated", body = EscrowResponse),
        (status = 403, description = "Not an admin", body = crate::error::ErrorBody),
        (status = 404, description = "Escrow not found", body = crate::error::ErrorBody),
        (status = 409, description = "Ledger closed", body = crate::error::ErrorBody),
    ),
    tag = "escrow"
)]
async fn set_lock(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Result<Json<LockRequest>, JsonRejection>,
) -> Result<Json<EscrowResponse>, AppError> {
    let Json(req) = body.map_err(|err| AppError::BadRequest(err.body_text()))?;
    req.validate()?;
    let id = EscrowId::from_uuid(id);
    tracing::info!(ledger_id = %id, actor = %req.user_id, locked = req.locked, "lock requested");
    let escrow = state.engine.set_locked(&id, req.locked, req.role)?;
    Ok(Json(EscrowResponse { escrow }))
}

/// POST /escrow/scheduler/maintenance — Run the deadline sweep.
#[utoipa::path(
    post,
    path = "/escrow/scheduler/maintenance",
    responses(
        (status = 200, description = "Sweep report", body = MaintenanceResponse),
    ),
    tag = "escrow"
)]
async fn run_maintenance(State(state): State<AppState>) -> Json<MaintenanceResponse> {
    let report = state.sweeper.run();
    Json(MaintenanceResponse {
        success: true,
        report,
    })
}

/// GET /escrow/:id — Fetch one escrow ledger.
#[utoipa::path(
    get,
    path = "/escrow/{id}",
    params(("id" = Uuid, Path, description = "Escrow ledger ID")),
    responses(
        (status = 200, description = "Escrow found", body = EscrowResponse),
        (status = 404, description = "Escrow not found", body = crate::error::ErrorBody),
    ),
    tag = "escrow"
)]
async fn get_escrow(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<EscrowResponse>, AppError> {
    let id = EscrowId::from_uuid(id);
    state
        .engine
        .store()
        .get(&id)
        .map(|escrow| Json(EscrowResponse { escrow }))
        .ok_or_else(|| AppError::NotFound(format!("escrow ledger {id} not found")))
}

/// GET /escrow/user/:user_id — Ledgers where the user is a party.
#[utoipa::path(
    get,
    path = "/escrow/user/{user_id}",
    params(("user_id" = String, Path, description = "Buyer or seller ID")),
    responses(
        (status = 200, description = "Ledgers for the user", body = UserEscrowsResponse),
    ),
    tag = "escrow"
)]
async fn list_for_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Json<UserEscrowsResponse> {
    let escrows = state
        .engine
        .store()
        .list()
        .into_iter()
        .filter(|l| l.buyer_id == user_id || l.seller_id == user_id)
        .collect();
    Json(UserEscrowsResponse { escrows })
}
