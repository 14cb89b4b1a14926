//! Integration tests for StoreDesk.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p storedesk-integration-tests
//! ```
//!
//! Nothing external is required: the dashboard runs in-process over a
//! [`MemoryStore`], and the Firestore client talks to [`FakeFirestore`], a
//! small axum server bound to a loopback port.
//!
//! # Test Categories
//!
//! - `admin_*` - Dashboard screens and mutations
//! - `containers` - Entity containers over the Firestore client
//! - `firestore_client` - REST calls and error mapping

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    body::{Body, to_bytes},
    extract::State,
    http::{HeaderMap, Method, Request, StatusCode, Uri, header},
    middleware::from_fn,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use storedesk_admin::config::{AdminConfig, FirestoreConfig};
use storedesk_admin::firestore::FirestoreClient;
use storedesk_admin::middleware::security_headers_middleware;
use storedesk_admin::routes;
use storedesk_admin::state::AppState;
use storedesk_admin::store::MemoryStore;
use storedesk_core::Fields;
use tower::ServiceExt;

pub use storedesk_admin::store::StoreOp;

// =============================================================================
// Dashboard harness
// =============================================================================

/// The dashboard router over a fresh in-memory store.
pub struct TestApp {
    pub store: Arc<MemoryStore>,
    pub state: AppState,
    router: Router,
}

/// A buffered response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    /// Target of a redirect.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }
}

impl TestApp {
    /// Build the app. Must be called from within a Tokio runtime.
    #[must_use]
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(AdminConfig::local(), store.clone());
        let router = Router::new()
            .merge(routes::routes())
            .layer(from_fn(security_headers_middleware))
            .with_state(state.clone());

        Self {
            store,
            state,
            router,
        }
    }

    /// Insert a document directly into the store.
    pub async fn insert(&self, collection: &str, id: &str, value: Value) {
        self.store.insert(collection, id, fields(value)).await;
    }

    /// Issue a GET request.
    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    /// Issue a form POST.
    pub async fn post_form(&self, uri: &str, form: &[(&str, &str)]) -> TestResponse {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(form)
            .finish();
        self.send(
            Request::post(uri)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();

        TestResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// Unwrap a JSON object literal into a field map.
#[must_use]
pub fn fields(value: Value) -> Fields {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

// =============================================================================
// Fake Firestore
// =============================================================================

const DOCUMENTS_PREFIX: &str = "/v1/projects/demo-shop/databases/(default)/documents";

#[derive(Default)]
struct FakeState {
    /// collection -> id -> wire `fields`
    collections: HashMap<String, BTreeMap<String, Value>>,
    next_id: usize,
    page_size: Option<usize>,
    fail_with: Option<(StatusCode, Value)>,
    requests: Vec<RecordedRequest>,
}

/// A request seen by the fake.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub authorization: Option<String>,
}

/// In-process stand-in for the Firestore REST API.
///
/// Supports list (with page tokens), create, masked patch with
/// `currentDocument.exists`, delete and `listCollectionIds` for project
/// `demo-shop` on the default database.
#[derive(Clone)]
pub struct FakeFirestore {
    addr: SocketAddr,
    state: Arc<Mutex<FakeState>>,
}

impl FakeFirestore {
    /// Bind to a loopback port and start serving.
    pub async fn start() -> Self {
        let state = Arc::new(Mutex::new(FakeState::default()));
        let app = Router::new().fallback(handle).with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    /// Client configuration pointing at this fake.
    #[must_use]
    pub fn config(&self) -> FirestoreConfig {
        FirestoreConfig {
            base_url: format!("http://{}", self.addr),
            ..FirestoreConfig::new("demo-shop")
        }
    }

    /// A client pointing at this fake.
    #[must_use]
    pub fn client(&self) -> FirestoreClient {
        FirestoreClient::new(&self.config()).unwrap()
    }

    /// Store a document given in wire format (`{"name": {"stringValue": ..}}`).
    pub fn put(&self, collection: &str, id: &str, wire_fields: Value) {
        self.state
            .lock()
            .unwrap()
            .collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), wire_fields);
    }

    /// Wire fields of a stored document.
    #[must_use]
    pub fn get(&self, collection: &str, id: &str) -> Option<Value> {
        self.state
            .lock()
            .unwrap()
            .collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned()
    }

    /// Number of documents in a collection.
    #[must_use]
    pub fn count(&self, collection: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .collections
            .get(collection)
            .map_or(0, BTreeMap::len)
    }

    /// Serve lists in pages of `size` documents.
    pub fn set_page_size(&self, size: usize) {
        self.state.lock().unwrap().page_size = Some(size);
    }

    /// Answer every request with `status` and `body` until cleared.
    pub fn fail_with(&self, status: StatusCode, body: Value) {
        self.state.lock().unwrap().fail_with = Some((status, body));
    }

    /// Stop failing requests.
    pub fn recover(&self) {
        self.state.lock().unwrap().fail_with = None;
    }

    /// Every request received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().unwrap().requests.clone()
    }
}

fn document_json(collection: &str, id: &str, fields: &Value) -> Value {
    json!({
        "name": format!("projects/demo-shop/databases/(default)/documents/{collection}/{id}"),
        "fields": fields,
        "createTime": "2026-10-01T00:00:00Z",
        "updateTime": "2026-10-01T00:00:00Z",
    })
}

fn google_error(status: StatusCode, name: &str, message: &str) -> Response {
    (
        status,
        Json(json!({"error": {"code": status.as_u16(), "message": message, "status": name}})),
    )
        .into_response()
}

async fn handle(
    State(state): State<Arc<Mutex<FakeState>>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Response {
    let query: Vec<(String, String)> = uri
        .query()
        .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default();
    let path = uri.path().to_string();

    let mut state = state.lock().unwrap();
    state.requests.push(RecordedRequest {
        method: method.clone(),
        path: path.clone(),
        query: query.clone(),
        authorization: headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    });

    if let Some((status, body)) = state.fail_with.clone() {
        let mut response = (status, Json(body)).into_response();
        if status == StatusCode::TOO_MANY_REQUESTS {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, "7".parse().unwrap());
        }
        return response;
    }

    if path == format!("{DOCUMENTS_PREFIX}:listCollectionIds") && method == Method::POST {
        let ids: Vec<&String> = state.collections.keys().collect();
        return Json(json!({"collectionIds": ids})).into_response();
    }

    let Some(rest) = path.strip_prefix(DOCUMENTS_PREFIX) else {
        return google_error(StatusCode::NOT_FOUND, "NOT_FOUND", "unknown database");
    };
    let segments: Vec<&str> = rest.trim_start_matches('/').split('/').collect();
    let param = |key: &str| {
        query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    };

    match (method, segments.as_slice()) {
        (Method::GET, [collection]) => {
            let docs = state
                .collections
                .get(*collection)
                .cloned()
                .unwrap_or_default();
            let start: usize = param("pageToken").and_then(|t| t.parse().ok()).unwrap_or(0);
            let size = state.page_size.unwrap_or(usize::MAX);

            let page: Vec<Value> = docs
                .iter()
                .skip(start)
                .take(size)
                .map(|(id, fields)| document_json(collection, id, fields))
                .collect();
            let next = start.saturating_add(size);

            let mut response = json!({});
            if !page.is_empty() {
                response["documents"] = Value::Array(page);
            }
            if next < docs.len() {
                response["nextPageToken"] = Value::String(next.to_string());
            }
            Json(response).into_response()
        }
        (Method::POST, [collection]) => {
            let body: Value = serde_json::from_str(&body).unwrap_or_default();
            let fields = body.get("fields").cloned().unwrap_or_else(|| json!({}));
            state.next_id += 1;
            let id = format!("doc{:04}", state.next_id);
            state
                .collections
                .entry((*collection).to_string())
                .or_default()
                .insert(id.clone(), fields.clone());
            Json(document_json(collection, &id, &fields)).into_response()
        }
        (Method::PATCH, [collection, id]) => {
            let body: Value = serde_json::from_str(&body).unwrap_or_default();
            let mask: Vec<String> = query
                .iter()
                .filter(|(k, _)| k == "updateMask.fieldPaths")
                .map(|(_, v)| v.trim_matches('`').to_string())
                .collect();
            let must_exist = param("currentDocument.exists").as_deref() == Some("true");

            let docs = state
                .collections
                .entry((*collection).to_string())
                .or_default();
            if must_exist && !docs.contains_key(*id) {
                return google_error(
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    &format!("No document to update: {id}"),
                );
            }

            let stored = docs.entry((*id).to_string()).or_insert_with(|| json!({}));
            for path in &mask {
                match body["fields"].get(path) {
                    Some(value) => stored[path.as_str()] = value.clone(),
                    None => {
                        if let Some(map) = stored.as_object_mut() {
                            map.remove(path);
                        }
                    }
                }
            }
            let stored = stored.clone();
            Json(document_json(collection, id, &stored)).into_response()
        }
        (Method::DELETE, [collection, id]) => {
            if let Some(docs) = state.collections.get_mut(*collection) {
                docs.remove(*id);
            }
            Json(json!({})).into_response()
        }
        _ => google_error(StatusCode::BAD_REQUEST, "INVALID_ARGUMENT", "unsupported request"),
    }
}
