//! Document store abstraction.
//!
//! The entity containers only need five calls from the outside world, so
//! they depend on [`DocumentStore`] rather than on a concrete client. Two
//! implementations exist:
//!
//! - [`FirestoreClient`](crate::firestore::FirestoreClient): the production
//!   store.
//! - [`MemoryStore`]: process-local, used for demos and tests.

mod memory;

pub use memory::{MemoryStore, StoreOp};

use std::sync::Arc;

use async_trait::async_trait;
use storedesk_core::{Document, Fields};
use thiserror::Error;

use crate::config::StoreBackend;
use crate::firestore::{FirestoreClient, FirestoreError};

/// Errors returned by a document store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The document addressed by an update does not exist.
    #[error("document {collection}/{id} not found")]
    NotFound { collection: String, id: String },

    /// Firestore request failed.
    #[error(transparent)]
    Firestore(#[from] FirestoreError),

    /// The store refused the request.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Shared handle to a document store.
pub type SharedStore = Arc<dyn DocumentStore>;

/// A remote collection/document store with server-assigned identifiers.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// All documents of a collection, in the store's order.
    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError>;

    /// Add a document and return the identifier the store assigned.
    async fn add(&self, collection: &str, fields: Fields) -> Result<String, StoreError>;

    /// Overwrite the given fields of an existing document.
    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError>;

    /// Remove a document. Removing a missing document is not an error.
    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;

    /// Check that the store is reachable.
    async fn ping(&self) -> Result<(), StoreError>;
}

#[async_trait]
impl DocumentStore for FirestoreClient {
    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        Ok(self.list_documents(collection).await?)
    }

    async fn add(&self, collection: &str, fields: Fields) -> Result<String, StoreError> {
        Ok(self.create_document(collection, &fields).await?)
    }

    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError> {
        match self.patch_document(collection, id, &fields).await {
            Err(FirestoreError::NotFound(_)) => Err(StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            }),
            other => Ok(other?),
        }
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        Ok(self.delete_document(collection, id).await?)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(self.list_collection_ids().await?)
    }
}

/// Build the store selected by configuration.
///
/// # Errors
///
/// Returns `StoreError::Firestore` if the Firestore client cannot be built.
pub fn connect(backend: &StoreBackend) -> Result<SharedStore, StoreError> {
    Ok(match backend {
        StoreBackend::Firestore(config) => Arc::new(FirestoreClient::new(config)?),
        StoreBackend::Memory => Arc::new(MemoryStore::new()),
    })
}
