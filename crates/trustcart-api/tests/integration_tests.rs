//! # Integration Tests for trustcart-api
//!
//! Exercises the escrow surface end to end through the router: order
//! creation, the guarded transition action endpoint and its
//! success-false envelope, administrative locking, the maintenance
//! sweep, and ledger queries.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use trustcart_api::state::AppState;
use trustcart_escrow::{EscrowId, Product};

/// Helper: state with one product seeded.
fn test_state() -> AppState {
    let state = AppState::new();
    state.catalog.insert(Product {
        id: "prod-1".to_string(),
        title: "Mountain bike".to_string(),
    });
    state
}

/// Helper: run one request against a fresh router over `state`.
async fn request(
    state: &AppState,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let app = trustcart_api::app(state.clone());
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(value) => builder
            .header("content-type", "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

/// Helper: open an escrow and return its id.
async fn open_escrow(state: &AppState) -> String {
    let (status, body) = request(
        state,
        "POST",
        "/escrow/order",
        Some(json!({
            "productId": "prod-1",
            "buyerId": "buyer-1",
            "sellerId": "seller-1",
            "amount": 250_000
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["escrowId"].as_str().unwrap().to_string()
}

/// Helper: drive one transition through the action endpoint.
async fn act(
    state: &AppState,
    escrow_id: &str,
    target: &str,
    user_id: &str,
    role: &str,
) -> (StatusCode, Value) {
    request(
        state,
        "POST",
        "/escrow/process-action",
        Some(json!({
            "escrowId": escrow_id,
            "targetState": target,
            "userId": user_id,
            "role": role
        })),
    )
    .await
}

// -- Health Probes ------------------------------------------------------------

#[tokio::test]
async fn test_liveness_probe() {
    let state = test_state();
    let app = trustcart_api::app(state);
    let response = app
        .oneshot(
            Request::builder()
                .uri("/health/liveness")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_readiness_probe() {
    let state = test_state();
    let (status, _) = request(&state, "GET", "/health/readiness", None).await;
    assert_eq!(status, StatusCode::OK);
}

// -- Order Creation -----------------------------------------------------------

#[tokio::test]
async fn test_open_order_creates_ledger() {
    let state = test_state();
    let escrow_id = open_escrow(&state).await;

    let (status, body) = request(&state, "GET", &format!("/escrow/{escrow_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let escrow = &body["escrow"];
    assert_eq!(escrow["status"], "PENDING_PAYMENT");
    assert_eq!(escrow["productTitle"], "Mountain bike");
    assert_eq!(escrow["currency"], "INR");
    assert_eq!(escrow["auditTrail"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_open_order_unknown_product_is_404() {
    let state = test_state();
    let (status, body) = request(
        &state,
        "POST",
        "/escrow/order",
        Some(json!({
            "productId": "ghost",
            "buyerId": "buyer-1",
            "sellerId": "seller-1",
            "amount": 1000
        })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_open_order_missing_field_is_400() {
    let state = test_state();
    let (status, _) = request(
        &state,
        "POST",
        "/escrow/order",
        Some(json!({ "productId": "prod-1", "buyerId": "buyer-1" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_open_order_empty_buyer_is_422() {
    let state = test_state();
    let (status, body) = request(
        &state,
        "POST",
        "/escrow/order",
        Some(json!({
            "productId": "prod-1",
            "buyerId": "  ",
            "sellerId": "seller-1",
            "amount": 1000
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_open_order_non_positive_amount_is_422() {
    let state = test_state();
    let (status, _) = request(
        &state,
        "POST",
        "/escrow/order",
        Some(json!({
            "productId": "prod-1",
            "buyerId": "buyer-1",
            "sellerId": "seller-1",
            "amount": 0
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

// -- Process Action -----------------------------------------------------------

#[tokio::test]
async fn test_full_lifecycle_through_action_endpoint() {
    let state = test_state();
    let id = open_escrow(&state).await;

    for (target, user, role) in [
        ("FUNDED", "admin-1", "ADMIN"),
        ("SHIPPED", "seller-1", "SELLER"),
        ("DELIVERED", "buyer-1", "BUYER"),
        ("RELEASED", "buyer-1", "BUYER"),
    ] {
        let (status, body) = act(&state, &id, target, user, role).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true, "transition to {target}: {body}");
    }

    let (_, body) = request(&state, "GET", &format!("/escrow/{id}"), None).await;
    let escrow = &body["escrow"];
    assert_eq!(escrow["status"], "RELEASED");
    assert_eq!(escrow["isClosed"], true);
    assert_eq!(escrow["paymentStatus"], "TRANSFERRED");
    assert_eq!(escrow["auditTrail"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn test_illegal_transition_is_success_false() {
    let state = test_state();
    let id = open_escrow(&state).await;

    let (status, body) = act(&state, &id, "DELIVERED", "buyer-1", "BUYER").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().unwrap().contains("illegal transition"));
}

#[tokio::test]
async fn test_wrong_actor_is_success_false() {
    let state = test_state();
    let id = open_escrow(&state).await;
    act(&state, &id, "FUNDED", "admin-1", "ADMIN").await;

    let (status, body) = act(&state, &id, "SHIPPED", "buyer-1", "BUYER").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);

    // The rejection must not have moved the record.
    let (_, body) = request(&state, "GET", &format!("/escrow/{id}"), None).await;
    assert_eq!(body["escrow"]["status"], "FUNDED");
}

#[tokio::test]
async fn test_closed_ledger_is_success_false() {
    let state = test_state();
    let id = open_escrow(&state).await;
    act(&state, &id, "CANCELLED", "buyer-1", "BUYER").await;

    let (status, body) = act(&state, &id, "FUNDED", "admin-1", "ADMIN").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().unwrap().contains("closed"));
}

#[tokio::test]
async fn test_unknown_role_is_400() {
    let state = test_state();
    let id = open_escrow(&state).await;
    let (status, _) = act(&state, &id, "FUNDED", "admin-1", "SUPERUSER").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_target_state_is_400() {
    let state = test_state();
    let id = open_escrow(&state).await;
    let (status, _) = act(&state, &id, "TELEPORTED", "admin-1", "ADMIN").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_escrow_is_404() {
    let state = test_state();
    let (status, _) = act(
        &state,
        "00000000-0000-0000-0000-000000000000",
        "FUNDED",
        "admin-1",
        "ADMIN",
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_omitted_role_defaults_to_guest() {
    let state = test_state();
    let id = open_escrow(&state).await;
    act(&state, &id, "FUNDED", "admin-1", "ADMIN").await;

    // A guest with the seller's id may still ship: authorization checks
    // the actor relationship, and the role carries no extra privilege.
    let (status, body) = request(
        &state,
        "POST",
        "/escrow/process-action",
        Some(json!({
            "escrowId": id,
            "targetState": "SHIPPED",
            "userId": "seller-1"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (_, body) = request(&state, "GET", &format!("/escrow/{id}"), None).await;
    let last = body["escrow"]["auditTrail"].as_array().unwrap().last().unwrap().clone();
    assert_eq!(last["role"], "GUEST");
    assert_eq!(last["reason"], "No reason provided");
}

// -- Administrative Lock ------------------------------------------------------

#[tokio::test]
async fn test_lock_requires_admin() {
    let state = test_state();
    let id = open_escrow(&state).await;

    let (status, body) = request(
        &state,
        "POST",
        &format!("/escrow/{id}/lock"),
        Some(json!({ "userId": "seller-1", "role": "SELLER", "locked": true })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "FORBIDDEN");
}

#[tokio::test]
async fn test_locked_ledger_allows_only_disputes() {
    let state = test_state();
    let id = open_escrow(&state).await;
    act(&state, &id, "FUNDED", "admin-1", "ADMIN").await;

    let (status, body) = request(
        &state,
        "POST",
        &format!("/escrow/{id}/lock"),
        Some(json!({ "userId": "admin-1", "role": "ADMIN", "locked": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["escrow"]["isLocked"], true);

    let (_, body) = act(&state, &id, "SHIPPED", "seller-1", "SELLER").await;
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().unwrap().contains("locked"));

    let (_, body) = act(&state, &id, "DISPUTED", "seller-1", "SELLER").await;
    assert_eq!(body["success"], true);
}

// -- Maintenance --------------------------------------------------------------

#[tokio::test]
async fn test_maintenance_auto_refunds_expired_ledger() {
    let state = test_state();
    let id = open_escrow(&state).await;
    act(&state, &id, "FUNDED", "admin-1", "ADMIN").await;

    // Force the ship-by deadline into the past.
    let ledger_id = EscrowId::from_uuid(id.parse().unwrap());
    state
        .engine
        .store()
        .transact(&ledger_id, &|ledger| {
            ledger.ship_by = Utc::now() - Duration::hours(1);
            Ok(())
        })
        .unwrap();

    let (status, body) = request(&state, "POST", "/escrow/scheduler/maintenance", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["report"]["autoRefunded"], 1);
    assert_eq!(body["report"]["autoReleased"], 0);

    let (_, body) = request(&state, "GET", &format!("/escrow/{id}"), None).await;
    assert_eq!(body["escrow"]["status"], "REFUNDED");
    assert_eq!(body["escrow"]["isClosed"], true);

    // Second sweep finds nothing: the sweep is idempotent.
    let (_, body) = request(&state, "POST", "/escrow/scheduler/maintenance", None).await;
    assert_eq!(body["report"]["autoRefunded"], 0);
}

// -- OpenAPI ------------------------------------------------------------------

#[tokio::test]
async fn test_openapi_spec_generation() {
    let state = test_state();
    let (status, spec) = request(&state, "GET", "/openapi.json", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(spec["openapi"].is_string());
    assert_eq!(spec["info"]["title"], "Trustcart Escrow API");
    let paths = spec["paths"].as_object().unwrap();
    assert!(paths.contains_key("/escrow/order"));
    assert!(paths.contains_key("/escrow/process-action"));
    assert!(paths.contains_key("/escrow/scheduler/maintenance"));
    assert!(paths.contains_key("/escrow/{id}"));
    assert!(paths.contains_key("/escrow/{id}/lock"));
    assert!(paths.contains_key("/escrow/user/{user_id}"));
}

// -- Queries ------------------------------------------------------------------

#[tokio::test]
async fn test_get_unknown_escrow_is_404() {
    let state = test_state();
    let (status, _) = request(
        &state,
        "GET",
        "/escrow/00000000-0000-0000-0000-000000000000",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_for_user_filters_by_party() {
    let state = test_state();
    let first = open_escrow(&state).await;
    let (status, _) = request(
        &state,
        "POST",
        "/escrow/order",
        Some(json!({
            "productId": "prod-1",
            "buyerId": "buyer-2",
            "sellerId": "seller-1",
            "amount": 9_000
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = request(&state, "GET", "/escrow/user/buyer-1", None).await;
    let escrows = body["escrows"].as_array().unwrap();
    assert_eq!(escrows.len(), 1);
    assert_eq!(escrows[0]["id"], first.as_str());

    // The seller is party to both.
    let (_, body) = request(&state, "GET", "/escrow/user/seller-1", None).await;
    assert_eq!(body["escrows"].as_array().unwrap().len(), 2);

    let (_, body) = request(&state, "GET", "/escrow/user/stranger", None).await;
    assert_eq!(body["escrows"].as_array().unwrap().len(), 0);
}
