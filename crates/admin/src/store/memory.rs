//! In-memory document store.
//!
//! Behaves like Firestore where the dashboard can tell the difference:
//! identifiers are 20 random alphanumerics, listing returns documents ordered
//! by identifier, updating a missing document fails and deleting one does not.
//!
//! Tests can make individual operations fail ([`MemoryStore::set_failing`])
//! or park them until released ([`MemoryStore::hold`] /
//! [`MemoryStore::release`]) to observe in-flight state.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use rand::Rng;
use rand::distr::Alphanumeric;
use storedesk_core::{Document, Fields, merge_fields};
use tokio::sync::{RwLock, Semaphore};

use super::{DocumentStore, StoreError};

const DOCUMENT_ID_LENGTH: usize = 20;

/// Store operations that can be failed or held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    List,
    Add,
    Update,
    Delete,
    Ping,
}

/// Process-local document store.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, BTreeMap<String, Fields>>>,
    failing: RwLock<HashSet<StoreOp>>,
    gates: RwLock<HashMap<StoreOp, Arc<Semaphore>>>,
    requests: AtomicUsize,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `op` fail (or succeed again).
    pub async fn set_failing(&self, op: StoreOp, fail: bool) {
        let mut failing = self.failing.write().await;
        if fail {
            failing.insert(op);
        } else {
            failing.remove(&op);
        }
    }

    /// Park every subsequent `op` until [`release`](Self::release) is called.
    pub async fn hold(&self, op: StoreOp) {
        self.gates
            .write()
            .await
            .entry(op)
            .or_insert_with(|| Arc::new(Semaphore::new(0)));
    }

    /// Let parked `op` calls (and future ones) proceed.
    pub async fn release(&self, op: StoreOp) {
        if let Some(gate) = self.gates.write().await.remove(&op) {
            gate.close();
        }
    }

    /// Insert a document under a known identifier.
    pub async fn insert(&self, collection: &str, id: impl Into<String>, fields: Fields) {
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .insert(id.into(), fields);
    }

    /// Fields of a stored document.
    pub async fn get(&self, collection: &str, id: &str) -> Option<Fields> {
        self.collections
            .read()
            .await
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned()
    }

    /// Number of documents in a collection.
    pub async fn count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, BTreeMap::len)
    }

    /// Number of requests served (including failed ones).
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Count the request, wait at the gate, then apply failure injection.
    async fn enter(&self, op: StoreOp) -> Result<(), StoreError> {
        self.requests.fetch_add(1, Ordering::SeqCst);

        let gate = self.gates.read().await.get(&op).cloned();
        if let Some(gate) = gate {
            // Closed on release; the error is the wake-up signal.
            let _ = gate.acquire().await;
        }

        if self.failing.read().await.contains(&op) {
            return Err(StoreError::Unavailable(format!("injected {op:?} failure")));
        }
        Ok(())
    }
}

fn new_document_id() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(DOCUMENT_ID_LENGTH)
        .map(char::from)
        .collect()
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        self.enter(StoreOp::List).await?;
        Ok(self
            .collections
            .read()
            .await
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, fields)| Document::new(id.clone(), fields.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn add(&self, collection: &str, fields: Fields) -> Result<String, StoreError> {
        self.enter(StoreOp::Add).await?;
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();

        let mut id = new_document_id();
        while docs.contains_key(&id) {
            id = new_document_id();
        }
        docs.insert(id.clone(), fields);
        Ok(id)
    }

    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError> {
        self.enter(StoreOp::Update).await?;
        let mut collections = self.collections.write().await;
        let existing = collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;
        merge_fields(existing, fields);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        self.enter(StoreOp::Delete).await?;
        if let Some(docs) = self.collections.write().await.get_mut(collection) {
            docs.remove(id);
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.enter(StoreOp::Ping).await
    }
}
