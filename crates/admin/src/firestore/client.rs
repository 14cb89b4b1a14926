//! HTTP client for the Firestore REST API.

use std::sync::Arc;

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use storedesk_core::{Document, Fields};
use tracing::instrument;
use url::Url;

use crate::config::FirestoreConfig;

use super::FirestoreError;
use super::types::{
    ErrorEnvelope, ListCollectionIdsBody, ListDocumentsResponse, RawDocument, WriteBody,
};
use super::value::encode_fields;

/// Documents requested per list page.
const PAGE_SIZE: u32 = 300;

/// Retry hint used when a 429 response carries no `Retry-After` header.
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Firestore REST client.
///
/// Cheap to clone; all clones share one connection pool.
#[derive(Clone)]
pub struct FirestoreClient {
    inner: Arc<FirestoreClientInner>,
}

struct FirestoreClientInner {
    client: reqwest::Client,
    /// `{base}/v1/projects/{project}/databases/{database}/documents`
    documents_url: Url,
    api_key: Option<SecretString>,
    access_token: Option<SecretString>,
}

impl FirestoreClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns `FirestoreError::InvalidUrl` if the base URL cannot be parsed
    /// or cannot carry a path.
    pub fn new(config: &FirestoreConfig) -> Result<Self, FirestoreError> {
        let mut documents_url = Url::parse(&config.base_url)?;
        documents_url
            .path_segments_mut()
            .map_err(|()| FirestoreError::InvalidUrl(config.base_url.clone()))?
            .pop_if_empty()
            .extend([
                "v1",
                "projects",
                config.project_id.as_str(),
                "databases",
                config.database.as_str(),
                "documents",
            ]);

        Ok(Self {
            inner: Arc::new(FirestoreClientInner {
                client: reqwest::Client::new(),
                documents_url,
                api_key: config.api_key.clone(),
                access_token: config.access_token.clone(),
            }),
        })
    }

    /// Root of the document tree this client addresses.
    #[must_use]
    pub fn documents_url(&self) -> &Url {
        &self.inner.documents_url
    }

    /// List every document in a collection, following page tokens.
    ///
    /// Documents are returned in server order.
    ///
    /// # Errors
    ///
    /// Returns `FirestoreError` if any page request fails or a document
    /// cannot be parsed.
    #[instrument(skip(self))]
    pub async fn list_documents(&self, collection: &str) -> Result<Vec<Document>, FirestoreError> {
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut url = self.collection_url(collection);
            {
                let mut query = url.query_pairs_mut();
                query.append_pair("pageSize", &PAGE_SIZE.to_string());
                if let Some(token) = &page_token {
                    query.append_pair("pageToken", token);
                }
            }

            let response = self.send(self.request(Method::GET, url)).await?;
            let page: ListDocumentsResponse = response.json().await?;

            for raw in page.documents {
                documents.push(raw.into_document()?);
            }

            match page.next_page_token.filter(|token| !token.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        tracing::debug!(count = documents.len(), "Listed documents");
        Ok(documents)
    }

    /// Create a document with a server-assigned identifier.
    ///
    /// # Errors
    ///
    /// Returns `FirestoreError` if the request fails or the response carries
    /// no usable document name.
    #[instrument(skip(self, fields))]
    pub async fn create_document(
        &self,
        collection: &str,
        fields: &Fields,
    ) -> Result<String, FirestoreError> {
        let wire = encode_fields(fields);
        let request = self
            .request(Method::POST, self.collection_url(collection))
            .json(&WriteBody { fields: &wire });

        let created: RawDocument = self.send(request).await?.json().await?;
        let id = created.id()?.to_string();

        tracing::info!(id = %id, "Created document");
        Ok(id)
    }

    /// Overwrite the given fields of an existing document.
    ///
    /// Fields not named in `fields` are left untouched. The document must
    /// already exist; Firestore answers `NOT_FOUND` rather than creating it.
    ///
    /// # Errors
    ///
    /// Returns `FirestoreError::NotFound` if the document does not exist, or
    /// another `FirestoreError` if the request fails.
    #[instrument(skip(self, fields), fields(field_count = fields.len()))]
    pub async fn patch_document(
        &self,
        collection: &str,
        id: &str,
        fields: &Fields,
    ) -> Result<(), FirestoreError> {
        if fields.is_empty() {
            // An empty mask would replace the whole document.
            tracing::debug!("Empty patch, nothing to send");
            return Ok(());
        }

        let mut url = self.document_url(collection, id);
        {
            let mut query = url.query_pairs_mut();
            for key in fields.keys() {
                query.append_pair("updateMask.fieldPaths", &field_path(key));
            }
            query.append_pair("currentDocument.exists", "true");
        }

        let wire = encode_fields(fields);
        self.send(
            self.request(Method::PATCH, url)
                .json(&WriteBody { fields: &wire }),
        )
        .await?;

        tracing::info!("Patched document");
        Ok(())
    }

    /// Delete a document. Deleting a missing document succeeds.
    ///
    /// # Errors
    ///
    /// Returns `FirestoreError` if the request fails.
    #[instrument(skip(self))]
    pub async fn delete_document(&self, collection: &str, id: &str) -> Result<(), FirestoreError> {
        self.send(self.request(Method::DELETE, self.document_url(collection, id)))
            .await?;

        tracing::info!("Deleted document");
        Ok(())
    }

    /// Cheap round trip that checks reachability and credentials.
    ///
    /// # Errors
    ///
    /// Returns `FirestoreError` if the database cannot be reached or rejects
    /// the credentials.
    #[instrument(skip(self))]
    pub async fn list_collection_ids(&self) -> Result<(), FirestoreError> {
        let mut url = self.inner.documents_url.clone();
        let path = format!("{}:listCollectionIds", url.path());
        url.set_path(&path);

        self.send(
            self.request(Method::POST, url)
                .json(&ListCollectionIdsBody { page_size: 1 }),
        )
        .await?;
        Ok(())
    }

    fn collection_url(&self, collection: &str) -> Url {
        let mut url = self.inner.documents_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push(collection);
        }
        url
    }

    fn document_url(&self, collection: &str, id: &str) -> Url {
        let mut url = self.inner.documents_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push(collection).push(id);
        }
        url
    }

    /// Build a request carrying the configured credentials.
    fn request(&self, method: Method, mut url: Url) -> RequestBuilder {
        if let Some(key) = &self.inner.api_key {
            url.query_pairs_mut().append_pair("key", key.expose_secret());
        }

        let builder = self.inner.client.request(method, url);
        match &self.inner.access_token {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }

    /// Send a request and map error statuses.
    async fn send(&self, request: RequestBuilder) -> Result<Response, FirestoreError> {
        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        // Check for rate limiting
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
            return Err(FirestoreError::RateLimited(retry_after));
        }

        let body = response.text().await.unwrap_or_default();
        let (code, status_name, message) = match serde_json::from_str::<ErrorEnvelope>(&body) {
            Ok(envelope) => (
                envelope.error.code,
                envelope.error.status,
                envelope.error.message,
            ),
            Err(_) => (
                status.as_u16(),
                status.canonical_reason().unwrap_or_default().to_string(),
                body,
            ),
        };

        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                FirestoreError::Unauthorized(message)
            }
            StatusCode::NOT_FOUND => FirestoreError::NotFound(message),
            _ => FirestoreError::Api {
                code,
                status: status_name,
                message,
            },
        })
    }
}

/// Quote a field name for use in a field mask.
///
/// Simple names pass through; anything else is backquoted with `` ` `` and
/// `\` escaped.
fn field_path(name: &str) -> String {
    let simple = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');

    if simple {
        name.to_string()
    } else {
        format!("`{}`", name.replace('\\', "\\\\").replace('`', "\\`"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base_url: &str) -> FirestoreClient {
        FirestoreClient::new(&FirestoreConfig {
            base_url: base_url.to_string(),
            ..FirestoreConfig::new("demo-shop")
        })
        .unwrap()
    }

    #[test]
    fn test_documents_url() {
        let client = client("https://firestore.googleapis.com");
        assert_eq!(
            client.documents_url().as_str(),
            "https://firestore.googleapis.com/v1/projects/demo-shop/databases/(default)/documents"
        );
    }

    #[test]
    fn test_emulator_base_url_with_trailing_slash() {
        let client = client("http://localhost:8080/");
        assert_eq!(
            client.document_url("orders", "abc").as_str(),
            "http://localhost:8080/v1/projects/demo-shop/databases/(default)/documents/orders/abc"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let result = FirestoreClient::new(&FirestoreConfig {
            base_url: "not a url".to_string(),
            ..FirestoreConfig::new("demo-shop")
        });
        assert!(matches!(result, Err(FirestoreError::InvalidUrl(_))));
    }

    #[test]
    fn test_field_path_quoting() {
        assert_eq!(field_path("totalPrice"), "totalPrice");
        assert_eq!(field_path("_private"), "_private");
        assert_eq!(field_path("first name"), "`first name`");
        assert_eq!(field_path("2fa"), "`2fa`");
        assert_eq!(field_path("a`b"), "`a\\`b`");
    }

    #[test]
    fn test_api_key_added_to_query() {
        let client = FirestoreClient::new(&FirestoreConfig {
            api_key: Some(SecretString::from("AIzaTestKey".to_string())),
            ..FirestoreConfig::new("demo-shop")
        })
        .unwrap();

        let request = client
            .request(Method::GET, client.collection_url("products"))
            .build()
            .unwrap();
        assert_eq!(request.url().query(), Some("key=AIzaTestKey"));
    }
}
