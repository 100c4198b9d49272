#![deny(missing_docs)]

//! # trustcart-api — Axum HTTP Surface
//!
//! HTTP layer over the `trustcart-escrow` core. Request handlers parse
//! and validate input, invoke the transition engine or the maintenance
//! sweeper, and map outcomes to responses. Actor ids and roles are
//! assumed already authenticated upstream; this layer enforces no
//! credentials of its own.
//!
//! ## API Surface
//!
//! | Route                            | Module            |
//! |----------------------------------|-------------------|
//! | `POST /escrow/order`             | [`routes::escrow`] |
//! | `POST /escrow/process-action`    | [`routes::escrow`] |
//! | `POST /escrow/:id/lock`          | [`routes::escrow`] |
//! | `POST /escrow/scheduler/maintenance` | [`routes::escrow`] |
//! | `GET /escrow/:id`                | [`routes::escrow`] |
//! | `GET /escrow/user/:user_id`      | [`routes::escrow`] |
//! | `GET /openapi.json`              | [`openapi`]        |

pub mod error;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Assemble the full application router.
///
/// Health probes (`/health/*`) are mounted alongside the API routes and
/// carry no state.
pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .merge(routes::escrow::router())
        .merge(openapi::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let health = Router::new()
        .route("/health/liveness", axum::routing::get(liveness))
        .route("/health/readiness", axum::routing::get(readiness));

    Router::new().merge(health).merge(api)
}

/// Liveness probe — always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe — returns 200 when the application is ready to serve.
async fn readiness() -> &'static str {
    "ready"
}
