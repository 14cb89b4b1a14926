//! Integration tests for the product screens.

use axum::http::StatusCode;
use serde_json::json;
use storedesk_integration_tests::{StoreOp, TestApp};

async fn app_with_catalog() -> TestApp {
    let app = TestApp::new();
    app.insert("categories", "c1", json!({"name": "Coffee"})).await;
    app.insert(
        "products",
        "p1",
        json!({
            "name": "House Blend",
            "images": ["https://img.test/blend.jpg"],
            "price": 12.5,
            "quantity": 40,
            "categoryId": "c1"
        }),
    )
    .await;
    app
}

// =============================================================================
// Listing
// =============================================================================

#[tokio::test]
async fn test_product_list_shows_records_with_category_names() {
    let app = app_with_catalog().await;

    let response = app.get("/products").await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("House Blend"));
    assert!(response.body.contains("Coffee"));
    assert!(response.body.contains("$12.50"));
    assert!(response.body.contains("https://img.test/blend.jpg"));
}

#[tokio::test]
async fn test_product_list_reads_legacy_image_field() {
    let app = TestApp::new();
    app.insert(
        "products",
        "old",
        json!({"name": "Old Mug", "image": "https://img.test/old.jpg", "price": 3}),
    )
    .await;

    let response = app.get("/products").await;
    assert!(response.body.contains("https://img.test/old.jpg"));
}

#[tokio::test]
async fn test_product_search_by_name() {
    let app = app_with_catalog().await;
    app.insert("products", "p2", json!({"name": "Enamel Mug", "price": 14}))
        .await;

    let response = app.get("/products?q=mug").await;

    assert!(response.body.contains("Enamel Mug"));
    assert!(!response.body.contains("House Blend"));
}

#[tokio::test]
async fn test_empty_catalog() {
    let app = TestApp::new();
    let response = app.get("/products").await;
    assert!(response.body.contains("No products found."));
}

// =============================================================================
// Create
// =============================================================================

#[tokio::test]
async fn test_create_product() {
    let app = app_with_catalog().await;

    let response = app
        .post_form(
            "/products",
            &[
                ("name", "Cold Brew"),
                ("image_url", ""),
                ("price", "3.75"),
                ("quantity", "12"),
                ("description", ""),
                ("category_id", "c1"),
            ],
        )
        .await;

    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), Some("/products?success=created"));
    assert_eq!(app.store.count("products").await, 2);

    let snapshot = app.state.products().snapshot();
    let created = snapshot
        .items
        .iter()
        .find(|p| p.name == "Cold Brew")
        .unwrap();
    assert_eq!(created.id.as_str().len(), 20);
    assert!(created.images.is_empty());
    assert_eq!(created.category_id.as_ref().map(|c| c.as_str()), Some("c1"));

    let page = app.get("/products?success=created").await;
    assert!(page.body.contains("Product added successfully"));
    assert!(page.body.contains("Cold Brew"));
}

#[tokio::test]
async fn test_create_product_rejects_bad_price() {
    let app = TestApp::new();

    let response = app
        .post_form(
            "/products",
            &[("name", "Mug"), ("price", "cheap"), ("quantity", "1")],
        )
        .await;

    assert_eq!(response.location(), Some("/products/new?error=invalid_form"));
    assert_eq!(app.store.count("products").await, 0);
}

#[tokio::test]
async fn test_create_product_store_failure() {
    let app = TestApp::new();
    app.store.set_failing(StoreOp::Add, true).await;

    let response = app
        .post_form(
            "/products",
            &[("name", "Mug"), ("price", "4"), ("quantity", "1")],
        )
        .await;

    assert_eq!(response.location(), Some("/products?error=create_failed"));
    assert_eq!(
        app.state.products().snapshot().error.as_deref(),
        Some("Failed to add product")
    );

    let page = app.get("/products?error=create_failed").await;
    assert!(page.body.contains("Failed to add product"));
}

// =============================================================================
// Edit
// =============================================================================

#[tokio::test]
async fn test_edit_form_prefills_values() {
    let app = app_with_catalog().await;

    let response = app.get("/products/p1/edit").await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("value=\"House Blend\""));
    assert!(response.body.contains("value=\"12.5\""));
    assert!(response.body.contains("value=\"40\""));
}

#[tokio::test]
async fn test_edit_unknown_product_redirects() {
    let app = TestApp::new();
    let response = app.get("/products/ghost/edit").await;
    assert_eq!(response.location(), Some("/products?error=not_found"));
}

#[tokio::test]
async fn test_update_product_keeps_untouched_images() {
    let app = app_with_catalog().await;
    app.get("/products").await;

    let response = app
        .post_form(
            "/products/p1",
            &[
                ("name", "House Blend"),
                ("image_url", "https://img.test/blend.jpg"),
                ("current_image", "https://img.test/blend.jpg"),
                ("price", "13"),
                ("quantity", "38"),
                ("description", "Medium roast"),
                ("category_id", "c1"),
            ],
        )
        .await;

    assert_eq!(response.location(), Some("/products?success=updated"));

    let stored = app.store.get("products", "p1").await.unwrap();
    assert_eq!(stored.get("price"), Some(&json!(13.0)));
    assert_eq!(stored.get("quantity"), Some(&json!(38)));
    assert_eq!(
        stored.get("images"),
        Some(&json!(["https://img.test/blend.jpg"]))
    );

    let local = app.state.products().snapshot().find("p1").cloned().unwrap();
    assert_eq!(local.description.as_deref(), Some("Medium roast"));
    assert_eq!(local.quantity, 38);
}

#[tokio::test]
async fn test_update_product_replaces_changed_image() {
    let app = app_with_catalog().await;

    app.post_form(
        "/products/p1",
        &[
            ("name", "House Blend"),
            ("image_url", "https://img.test/new.jpg"),
            ("current_image", "https://img.test/blend.jpg"),
            ("price", "12.5"),
            ("quantity", "40"),
        ],
    )
    .await;

    let stored = app.store.get("products", "p1").await.unwrap();
    assert_eq!(stored.get("images"), Some(&json!(["https://img.test/new.jpg"])));
}

#[tokio::test]
async fn test_update_missing_product_fails() {
    let app = TestApp::new();

    let response = app
        .post_form(
            "/products/ghost",
            &[("name", "Ghost"), ("price", "1"), ("quantity", "1")],
        )
        .await;

    assert_eq!(response.location(), Some("/products?error=update_failed"));
    assert_eq!(app.store.count("products").await, 0);
}

// =============================================================================
// Delete
// =============================================================================

#[tokio::test]
async fn test_delete_product() {
    let app = app_with_catalog().await;
    app.get("/products").await;

    let response = app.post_form("/products/p1/delete", &[]).await;

    assert_eq!(response.location(), Some("/products?success=deleted"));
    assert_eq!(app.store.count("products").await, 0);
    assert!(app.state.products().snapshot().find("p1").is_none());
}

#[tokio::test]
async fn test_delete_product_failure_keeps_record() {
    let app = app_with_catalog().await;
    app.get("/products").await;
    app.store.set_failing(StoreOp::Delete, true).await;

    let response = app.post_form("/products/p1/delete", &[]).await;

    assert_eq!(response.location(), Some("/products?error=delete_failed"));
    assert!(app.state.products().snapshot().find("p1").is_some());
}
