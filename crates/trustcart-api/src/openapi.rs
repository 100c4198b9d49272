//! # OpenAPI Specification Assembly
//!
//! Assembles all utoipa-documented escrow routes into a single OpenAPI
//! spec. Serves at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

/// Assembled OpenAPI spec for the escrow API surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Trustcart Escrow API",
        version = "0.3.2",
        description = "Escrow payment ledger for the Trustcart marketplace: order creation, guarded status transitions, administrative locking, scheduled maintenance, and ledger queries.",
        license(name = "MIT")
    ),
    paths(
        crate::routes::escrow::open_order,
        crate::routes::escrow::process_action,
        crate::routes::escrow::set_lock,
        crate::routes::escrow::run_maintenance,
        crate::routes::escrow::get_escrow,
        crate::routes::escrow::list_for_user,
    ),
    components(schemas(
        // Error types
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
        // Escrow DTOs
        crate::routes::escrow::OpenOrderRequest,
        crate::routes::escrow::OpenOrderResponse,
        crate::routes::escrow::ProcessActionRequest,
        crate::routes::escrow::ActionResponse,
        crate::routes::escrow::LockRequest,
        crate::routes::escrow::EscrowResponse,
        crate::routes::escrow::UserEscrowsResponse,
        crate::routes::escrow::MaintenanceResponse,
    )),
    tags(
        (name = "escrow", description = "Escrow payment ledger — transitions, locking, maintenance, queries"),
    )
)]
pub struct ApiDoc;

/// Build the OpenAPI router.
///
/// Serves the OpenAPI JSON spec at `/openapi.json`.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

/// GET /openapi.json — Return the generated OpenAPI specification.
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
