//! Application state shared across handlers.

use std::sync::Arc;

use storedesk_core::{Category, Order, Product, User};

use crate::config::AdminConfig;
use crate::containers::EntityHandle;
use crate::store::SharedStore;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and gives handlers the
/// configuration, the document store and one container per entity.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    store: SharedStore,
    products: EntityHandle<Product>,
    categories: EntityHandle<Category>,
    orders: EntityHandle<Order>,
    users: EntityHandle<User>,
}

impl AppState {
    /// Create the application state and start the entity containers.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn new(config: AdminConfig, store: SharedStore) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                products: EntityHandle::spawn(store.clone()),
                categories: EntityHandle::spawn(store.clone()),
                orders: EntityHandle::spawn(store.clone()),
                users: EntityHandle::spawn(store.clone()),
                config,
                store,
            }),
        }
    }

    /// Get a reference to the admin configuration.
    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    /// Get a reference to the document store.
    #[must_use]
    pub fn store(&self) -> &SharedStore {
        &self.inner.store
    }

    /// Product container.
    #[must_use]
    pub fn products(&self) -> &EntityHandle<Product> {
        &self.inner.products
    }

    /// Category container.
    #[must_use]
    pub fn categories(&self) -> &EntityHandle<Category> {
        &self.inner.categories
    }

    /// Order container.
    #[must_use]
    pub fn orders(&self) -> &EntityHandle<Order> {
        &self.inner.orders
    }

    /// User container.
    #[must_use]
    pub fn users(&self) -> &EntityHandle<User> {
        &self.inner.users
    }
}
