//! Listing and deleting records.
//!
//! # Usage
//!
//! ```bash
//! sd-cli list orders
//! sd-cli delete products 3fJx...
//! ```

use storedesk_admin::containers::{ContainerError, EntityHandle};
use storedesk_admin::store::SharedStore;
use storedesk_core::{Category, Entity, Order, Product, User};

use super::EntityKind;

/// One-line summary of a record for terminal output.
pub trait Summary {
    fn summary(&self) -> String;
}

impl Summary for Product {
    fn summary(&self) -> String {
        format!(
            "{}\t{}\t{}\tqty {}",
            self.id, self.name, self.price, self.quantity
        )
    }
}

impl Summary for Category {
    fn summary(&self) -> String {
        format!(
            "{}\t{}\t{}",
            self.id,
            self.name,
            self.description.as_deref().unwrap_or("")
        )
    }
}

impl Summary for Order {
    fn summary(&self) -> String {
        format!(
            "{}\t{}\t{} x {}\t{}\t{}\t{}",
            self.id,
            self.customer_name,
            self.quantity,
            self.product_id,
            self.total_price,
            self.status,
            self.created_at.to_rfc3339()
        )
    }
}

impl Summary for User {
    fn summary(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}",
            self.uid,
            self.display_name(),
            self.username.as_deref().unwrap_or(""),
            self.balance_or_zero()
        )
    }
}

/// Fetch a collection through its container and return the summary lines.
///
/// # Errors
///
/// Returns `ContainerError` if the store request fails.
pub async fn summaries<E: Entity + Summary>(
    store: SharedStore,
) -> Result<Vec<String>, ContainerError> {
    let container = EntityHandle::<E>::spawn(store);
    container.list().await?;
    Ok(container.snapshot().items.iter().map(Summary::summary).collect())
}

/// Print every record of a collection.
///
/// # Errors
///
/// Returns `ContainerError` if the store request fails.
#[allow(clippy::print_stdout)]
pub async fn list(store: SharedStore, entity: EntityKind) -> Result<(), ContainerError> {
    let lines = match entity {
        EntityKind::Products => summaries::<Product>(store).await?,
        EntityKind::Categories => summaries::<Category>(store).await?,
        EntityKind::Orders => summaries::<Order>(store).await?,
        EntityKind::Users => summaries::<User>(store).await?,
    };

    for line in &lines {
        println!("{line}");
    }
    tracing::info!(count = lines.len(), "Listed records");
    Ok(())
}

async fn delete_one<E: Entity>(store: SharedStore, id: &str) -> Result<(), ContainerError> {
    EntityHandle::<E>::spawn(store).delete(id).await
}

/// Delete one record.
///
/// # Errors
///
/// Returns `ContainerError` if the store request fails.
pub async fn delete(store: SharedStore, entity: EntityKind, id: &str) -> Result<(), ContainerError> {
    match entity {
        EntityKind::Products => delete_one::<Product>(store, id).await?,
        EntityKind::Categories => delete_one::<Category>(store, id).await?,
        EntityKind::Orders => delete_one::<Order>(store, id).await?,
        EntityKind::Users => delete_one::<User>(store, id).await?,
    }
    tracing::info!(?entity, id, "Deleted record");
    Ok(())
}
