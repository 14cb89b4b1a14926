//! Firestore REST client against the in-process fake.

use axum::http::StatusCode;
use secrecy::SecretString;
use serde_json::json;
use storedesk_admin::config::FirestoreConfig;
use storedesk_admin::firestore::{FirestoreClient, FirestoreError};
use storedesk_integration_tests::{FakeFirestore, fields};

#[tokio::test]
async fn test_list_documents_across_pages() {
    let fake = FakeFirestore::start().await;
    fake.set_page_size(1);
    fake.put("orders", "a", json!({"quantity": {"integerValue": "1"}}));
    fake.put("orders", "b", json!({"quantity": {"integerValue": "2"}}));

    let documents = fake.client().list_documents("orders").await.unwrap();

    let ids: Vec<&str> = documents.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b"]);
    assert_eq!(documents[1].fields.get("quantity"), Some(&json!(2)));

    let tokens: Vec<Option<String>> = fake
        .requests()
        .iter()
        .map(|r| {
            r.query
                .iter()
                .find(|(k, _)| k == "pageToken")
                .map(|(_, v)| v.clone())
        })
        .collect();
    assert_eq!(tokens, vec![None, Some("1".to_string())]);
}

#[tokio::test]
async fn test_list_empty_collection() {
    let fake = FakeFirestore::start().await;
    let documents = fake.client().list_documents("orders").await.unwrap();
    assert!(documents.is_empty());
}

#[tokio::test]
async fn test_create_document_returns_id() {
    let fake = FakeFirestore::start().await;

    let id = fake
        .client()
        .create_document(
            "products",
            &fields(json!({"name": "Mug", "price": 4.5, "quantity": 3})),
        )
        .await
        .unwrap();

    assert_eq!(id, "doc0001");
    let stored = fake.get("products", &id).unwrap();
    assert_eq!(stored["name"]["stringValue"], "Mug");
    assert_eq!(stored["price"]["doubleValue"].as_f64(), Some(4.5));
    assert_eq!(stored["quantity"]["integerValue"], "3");
}

#[tokio::test]
async fn test_patch_quotes_unusual_field_names() {
    let fake = FakeFirestore::start().await;
    fake.put("users", "u1", json!({"firstName": {"stringValue": "Ada"}}));

    fake.client()
        .patch_document("users", "u1", &fields(json!({"last-name": "Lovelace"})))
        .await
        .unwrap();

    let request = fake.requests().pop().unwrap();
    assert!(
        request
            .query
            .contains(&("updateMask.fieldPaths".to_string(), "`last-name`".to_string()))
    );
    let stored = fake.get("users", "u1").unwrap();
    assert_eq!(stored["firstName"]["stringValue"], "Ada");
    assert_eq!(stored["last-name"]["stringValue"], "Lovelace");
}

#[tokio::test]
async fn test_empty_patch_sends_nothing() {
    let fake = FakeFirestore::start().await;

    fake.client()
        .patch_document("users", "u1", &fields(json!({})))
        .await
        .unwrap();

    assert!(fake.requests().is_empty());
}

#[tokio::test]
async fn test_patch_missing_document_is_not_found() {
    let fake = FakeFirestore::start().await;

    let err = fake
        .client()
        .patch_document("orders", "ghost", &fields(json!({"status": "shipped"})))
        .await
        .unwrap_err();

    assert!(matches!(err, FirestoreError::NotFound(message) if message.contains("ghost")));
    assert_eq!(fake.count("orders"), 0);
}

#[tokio::test]
async fn test_delete_document() {
    let fake = FakeFirestore::start().await;
    fake.put("orders", "o1", json!({}));

    let client = fake.client();
    client.delete_document("orders", "o1").await.unwrap();
    client.delete_document("orders", "o1").await.unwrap();

    assert_eq!(fake.count("orders"), 0);
}

#[tokio::test]
async fn test_rate_limit_reads_retry_after() {
    let fake = FakeFirestore::start().await;
    fake.fail_with(StatusCode::TOO_MANY_REQUESTS, json!({}));

    let err = fake.client().list_documents("orders").await.unwrap_err();
    assert!(matches!(err, FirestoreError::RateLimited(7)));
}

#[tokio::test]
async fn test_permission_denied_is_unauthorized() {
    let fake = FakeFirestore::start().await;
    fake.fail_with(
        StatusCode::FORBIDDEN,
        json!({"error": {"code": 403, "message": "Missing or insufficient permissions.", "status": "PERMISSION_DENIED"}}),
    );

    let err = fake.client().list_collection_ids().await.unwrap_err();
    assert!(
        matches!(err, FirestoreError::Unauthorized(message) if message == "Missing or insufficient permissions.")
    );
}

#[tokio::test]
async fn test_other_errors_carry_envelope() {
    let fake = FakeFirestore::start().await;
    fake.fail_with(
        StatusCode::BAD_REQUEST,
        json!({"error": {"code": 400, "message": "Invalid field path", "status": "INVALID_ARGUMENT"}}),
    );

    let err = fake
        .client()
        .create_document("orders", &fields(json!({"quantity": 1})))
        .await
        .unwrap_err();

    match err {
        FirestoreError::Api {
            code,
            status,
            message,
        } => {
            assert_eq!(code, 400);
            assert_eq!(status, "INVALID_ARGUMENT");
            assert_eq!(message, "Invalid field path");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_ping_and_credentials() {
    let fake = FakeFirestore::start().await;
    let client = FirestoreClient::new(&FirestoreConfig {
        api_key: Some(SecretString::from("web-key".to_string())),
        access_token: Some(SecretString::from("ya29.token".to_string())),
        ..fake.config()
    })
    .unwrap();

    client.list_collection_ids().await.unwrap();

    let request = fake.requests().pop().unwrap();
    assert_eq!(request.method, "POST");
    assert!(request.path.ends_with("/documents:listCollectionIds"));
    assert_eq!(request.authorization.as_deref(), Some("Bearer ya29.token"));
    assert!(
        request
            .query
            .contains(&("key".to_string(), "web-key".to_string()))
    );
}
