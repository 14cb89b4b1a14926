//! Integration tests for the dashboard page, health checks and headers.

use axum::http::{StatusCode, header};
use serde_json::json;
use storedesk_integration_tests::{StoreOp, TestApp};

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new();
    let response = app.get("/health").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, "ok");
}

#[tokio::test]
async fn test_readiness_follows_store() {
    let app = TestApp::new();
    assert_eq!(app.get("/health/ready").await.status, StatusCode::OK);

    app.store.set_failing(StoreOp::Ping, true).await;
    assert_eq!(
        app.get("/health/ready").await.status,
        StatusCode::SERVICE_UNAVAILABLE
    );
}

#[tokio::test]
async fn test_security_headers_on_pages() {
    let app = TestApp::new();
    let response = app.get("/").await;

    assert_eq!(
        response.headers.get("x-frame-options").unwrap(),
        "DENY"
    );
    assert_eq!(
        response.headers.get("x-content-type-options").unwrap(),
        "nosniff"
    );
    assert!(response.headers.contains_key("content-security-policy"));
    assert_eq!(
        response.headers.get(header::CACHE_CONTROL).unwrap(),
        "no-store, max-age=0"
    );
}

#[tokio::test]
async fn test_dashboard_totals() {
    let app = TestApp::new();
    app.insert("products", "p1", json!({"name": "Widget", "price": 10, "quantity": 2}))
        .await;
    app.insert("products", "p2", json!({"name": "Gadget", "price": 4, "quantity": 50}))
        .await;
    app.insert("categories", "c1", json!({"name": "Tools"})).await;
    app.insert("users", "u1", json!({"firstName": "Ada"})).await;
    app.insert(
        "orders",
        "o1",
        json!({
            "productId": "p1",
            "quantity": 3,
            "totalPrice": 30,
            "status": "delivered",
            "customerName": "Ada",
            "createdAt": "2026-10-01T09:00:00Z"
        }),
    )
    .await;
    app.insert(
        "orders",
        "o2",
        json!({
            "productId": "p2",
            "quantity": 1,
            "totalPrice": 4,
            "status": "cancelled",
            "customerName": "Grace",
            "createdAt": "2026-10-03T09:00:00Z"
        }),
    )
    .await;

    let response = app.get("/").await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("memory store"));
    // Cancelled orders do not count toward revenue.
    assert!(response.body.contains("$30.00"));
    assert!(!response.body.contains("$34.00"));
    assert!(response.body.contains("1 low on stock"));
    assert!(response.body.contains("Widget"));
    assert!(response.body.contains("Grace"));

    // Newest order first.
    let grace = response.body.find("Grace").unwrap();
    let ada = response.body.find("<td>Ada</td>").unwrap();
    assert!(grace < ada);
}

#[tokio::test]
async fn test_dashboard_reports_failed_fetches() {
    let app = TestApp::new();
    app.store.set_failing(StoreOp::List, true).await;

    let response = app.get("/").await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Failed to fetch products"));
    assert!(response.body.contains("Failed to fetch orders"));
    assert!(response.body.contains("No orders yet."));
}

#[tokio::test]
async fn test_dashboard_survives_revenue_overflow() {
    let app = TestApp::new();
    for id in ["o1", "o2"] {
        app.insert(
            "orders",
            id,
            json!({
                "productId": "p1",
                "quantity": 1,
                "totalPrice": 5e28,
                "status": "pending",
                "customerName": "Ada",
                "createdAt": "2026-10-01T09:00:00Z"
            }),
        )
        .await;
    }

    let response = app.get("/").await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Out of range"));
    assert!(!response.body.contains("Failed to fetch orders"));
}

#[tokio::test]
async fn test_unknown_route() {
    let app = TestApp::new();
    assert_eq!(app.get("/nowhere").await.status, StatusCode::NOT_FOUND);
}
