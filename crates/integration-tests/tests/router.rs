//! Router-level tests through the full middleware stack.
//!
//! None of these requests reach the database.

#![allow(clippy::unwrap_used)]

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use tower::ServiceExt;

use inkdrop_integration_tests::{TEST_WEBHOOK_SECRET, body_json, test_app};
use inkdrop_storefront::stripe::webhook::sign;

#[tokio::test]
async fn test_health() {
    let response = test_app()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_admin_api_requires_session() {
    let response = test_app()
        .oneshot(
            Request::get("/api/admin/dashboard")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_admin_page_redirects_to_login() {
    let response = test_app()
        .oneshot(Request::get("/admin").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert!(response.status().is_redirection());
    assert_eq!(response.headers()["location"], "/admin/login");
}

#[tokio::test]
async fn test_printful_webhook_acknowledges_malformed_payload() {
    let response = test_app()
        .oneshot(
            Request::post("/api/webhooks/printful")
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["success"], true);
}

#[tokio::test]
async fn test_stripe_webhook_rejects_bad_signature() {
    let response = test_app()
        .oneshot(
            Request::post("/api/webhooks/stripe")
                .header("stripe-signature", "t=1,v1=deadbeef")
                .body(Body::from(r#"{"id":"evt_1","type":"ping","data":{"object":{}}}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["success"], false);
}

#[tokio::test]
async fn test_stripe_webhook_accepts_signed_ignored_event() {
    let payload = r#"{"id":"evt_2","type":"customer.created","data":{"object":{}}}"#;
    let timestamp = chrono::Utc::now().timestamp();
    let signature = sign(payload.as_bytes(), TEST_WEBHOOK_SECRET, timestamp);

    let response = test_app()
        .oneshot(
            Request::post("/api/webhooks/stripe")
                .header("stripe-signature", format!("t={timestamp},v1={signature}"))
                .body(Body::from(payload))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_category_is_bad_request() {
    let response = test_app()
        .oneshot(
            Request::get("/api/products?category=spaceships")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["success"], false);
}

#[tokio::test]
async fn test_malformed_json_body_uses_error_envelope() {
    let response = test_app()
        .oneshot(
            Request::post("/api/cart/items")
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_missing_content_type_uses_error_envelope() {
    let response = test_app()
        .oneshot(
            Request::post("/api/checkout/confirm")
                .header("x-forwarded-for", "198.51.100.9")
                .body(Body::from(r#"{"payment_intent_id":"pi_1"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["success"], false);
}

#[tokio::test]
async fn test_unknown_sort_uses_error_envelope() {
    let response = test_app()
        .oneshot(
            Request::get("/api/products?sort=bogus")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["success"], false);
}

#[tokio::test]
async fn test_bad_path_parameter_uses_error_envelope() {
    let response = test_app()
        .oneshot(
            Request::patch("/api/cart/items/not-a-line-id")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"quantity":1}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["success"], false);
}
