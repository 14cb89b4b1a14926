//! Firestore REST request and response bodies.

use serde::{Deserialize, Serialize};
use storedesk_core::Document;

use super::FirestoreError;
use super::value::{WireFields, decode_fields};

/// A document as returned by the REST API.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDocument {
    /// Full resource name:
    /// `projects/{p}/databases/{d}/documents/{collection}/{id}`.
    pub name: String,
    #[serde(default)]
    pub fields: WireFields,
    #[serde(default)]
    pub create_time: Option<String>,
    #[serde(default)]
    pub update_time: Option<String>,
}

impl RawDocument {
    /// Document identifier: the last segment of the resource name.
    ///
    /// # Errors
    ///
    /// Returns `FirestoreError::MalformedName` if the name has no identifier.
    pub fn id(&self) -> Result<&str, FirestoreError> {
        self.name
            .rsplit('/')
            .next()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| FirestoreError::MalformedName(self.name.clone()))
    }

    /// Convert into a plain JSON document.
    ///
    /// # Errors
    ///
    /// Returns `FirestoreError::MalformedName` if the name has no identifier.
    pub fn into_document(self) -> Result<Document, FirestoreError> {
        let id = self.id()?.to_string();
        Ok(Document::new(id, decode_fields(self.fields)))
    }
}

/// Response of `documents.list`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDocumentsResponse {
    /// Absent when the collection is empty.
    #[serde(default)]
    pub documents: Vec<RawDocument>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// Body of `documents.createDocument` and `documents.patch`.
#[derive(Debug, Serialize)]
pub struct WriteBody<'a> {
    pub fields: &'a WireFields,
}

/// Body of `documents.listCollectionIds`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCollectionIdsBody {
    pub page_size: u32,
}

/// Google API error envelope.
#[derive(Debug, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorStatus,
}

/// Body of the error envelope.
#[derive(Debug, Deserialize)]
pub struct ErrorStatus {
    #[serde(default)]
    pub code: u16,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: String,
}
