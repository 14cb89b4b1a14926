//! Entity containers running against the Firestore client.

use std::sync::Arc;

use serde_json::json;
use storedesk_admin::containers::EntityHandle;
use storedesk_admin::store::SharedStore;
use storedesk_core::{Category, CategoryDraft, Price, Product, ProductPatch, User};
use storedesk_integration_tests::FakeFirestore;

fn store(fake: &FakeFirestore) -> SharedStore {
    Arc::new(fake.client())
}

fn widget() -> serde_json::Value {
    json!({
        "name": {"stringValue": "Widget"},
        "images": {"arrayValue": {"values": [{"stringValue": "https://img.test/w.png"}]}},
        "price": {"integerValue": "10"},
        "quantity": {"integerValue": "5"}
    })
}

#[tokio::test]
async fn test_list_decodes_wire_documents() {
    let fake = FakeFirestore::start().await;
    fake.put("products", "w1", widget());
    fake.put(
        "products",
        "legacy",
        json!({
            "name": {"stringValue": "Old Mug"},
            "image": {"stringValue": "https://img.test/old.png"},
            "price": {"doubleValue": 3.5}
        }),
    );

    let products = EntityHandle::<Product>::spawn(store(&fake));
    products.list().await.unwrap();

    let state = products.snapshot();
    assert_eq!(state.items.len(), 2);
    assert!(state.error.is_none());

    let widget = state.find("w1").unwrap();
    assert_eq!(widget.price, Price::from_units(10));
    assert_eq!(widget.quantity, 5);
    assert_eq!(widget.thumbnail(), Some("https://img.test/w.png"));

    let legacy = state.find("legacy").unwrap();
    assert_eq!(legacy.images, vec!["https://img.test/old.png".to_string()]);
    assert_eq!(legacy.quantity, 0);
}

#[tokio::test]
async fn test_list_follows_pages() {
    let fake = FakeFirestore::start().await;
    fake.set_page_size(2);
    for i in 0..5 {
        fake.put(
            "categories",
            &format!("c{i}"),
            json!({"name": {"stringValue": format!("Category {i}")}}),
        );
    }

    let categories = EntityHandle::<Category>::spawn(store(&fake));
    categories.list().await.unwrap();

    assert_eq!(categories.snapshot().items.len(), 5);
    let lists = fake
        .requests()
        .iter()
        .filter(|r| r.method == "GET")
        .count();
    assert_eq!(lists, 3);
}

#[tokio::test]
async fn test_price_update_writes_only_patched_fields() {
    let fake = FakeFirestore::start().await;
    fake.put("products", "w1", widget());

    let products = EntityHandle::<Product>::spawn(store(&fake));
    products.list().await.unwrap();

    let patch = ProductPatch {
        price: Some(Price::from_units(12)),
        ..ProductPatch::default()
    };
    products.update("w1", &patch).await.unwrap();

    let stored = fake.get("products", "w1").unwrap();
    assert_eq!(stored["price"]["doubleValue"].as_f64(), Some(12.0));
    assert_eq!(stored["name"]["stringValue"], "Widget");
    assert_eq!(stored["quantity"]["integerValue"], "5");

    let local = products.snapshot().find("w1").cloned().unwrap();
    assert_eq!(local.price, Price::from_units(12));
    assert_eq!(local.name, "Widget");

    let patch_request = fake
        .requests()
        .into_iter()
        .find(|r| r.method == "PATCH")
        .unwrap();
    let mask: Vec<&str> = patch_request
        .query
        .iter()
        .filter(|(k, _)| k == "updateMask.fieldPaths")
        .map(|(_, v)| v.as_str())
        .collect();
    assert_eq!(mask, vec!["price"]);
    assert!(
        patch_request
            .query
            .contains(&("currentDocument.exists".to_string(), "true".to_string()))
    );
}

#[tokio::test]
async fn test_update_of_missing_document_fails() {
    let fake = FakeFirestore::start().await;
    let products = EntityHandle::<Product>::spawn(store(&fake));

    let patch = ProductPatch {
        quantity: Some(1),
        ..ProductPatch::default()
    };
    assert!(products.update("ghost", &patch).await.is_err());

    assert_eq!(fake.count("products"), 0);
    assert_eq!(
        products.snapshot().error.as_deref(),
        Some("Failed to update product")
    );
}

#[tokio::test]
async fn test_create_uses_server_identifier() {
    let fake = FakeFirestore::start().await;
    let categories = EntityHandle::<Category>::spawn(store(&fake));

    let created = categories
        .create(&CategoryDraft {
            name: "Tea".to_string(),
            description: Some("Loose leaf".to_string()),
        })
        .await
        .unwrap();

    assert_eq!(created.id.as_str(), "doc0001");
    assert_eq!(
        fake.get("categories", "doc0001").unwrap()["description"]["stringValue"],
        "Loose leaf"
    );
    assert!(categories.snapshot().find("doc0001").is_some());
}

#[tokio::test]
async fn test_failed_list_keeps_items_and_reports() {
    let fake = FakeFirestore::start().await;
    fake.put("users", "u1", json!({"firstName": {"stringValue": "Ada"}}));

    let users = EntityHandle::<User>::spawn(store(&fake));
    users.list().await.unwrap();

    fake.fail_with(
        axum::http::StatusCode::SERVICE_UNAVAILABLE,
        json!({"error": {"code": 503, "message": "backend down", "status": "UNAVAILABLE"}}),
    );
    assert!(users.list().await.is_err());

    let state = users.snapshot();
    assert_eq!(state.items.len(), 1);
    assert_eq!(state.error.as_deref(), Some("Failed to fetch users"));

    fake.recover();
    users.reset_error().await.unwrap();
    users.delete("u1").await.unwrap();

    let state = users.snapshot();
    assert!(state.items.is_empty());
    assert!(state.error.is_none());
    assert_eq!(fake.count("users"), 0);
}
