//! Seed the store with categories, products and orders from YAML.
//!
//! Products name their category and orders name their product; names are
//! resolved to the IDs assigned while seeding (or to records already in the
//! store). Records are created through the entity containers, in file order.
//!
//! ```yaml
//! categories:
//!   - name: Coffee
//! products:
//!   - name: Cold Brew
//!     price: 4.5
//!     quantity: 20
//!     category: Coffee
//! orders:
//!   - product: Cold Brew
//!     quantity: 2
//!     customer_name: Ada Lovelace
//! ```

use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use storedesk_admin::containers::{ContainerError, EntityHandle};
use storedesk_admin::store::SharedStore;
use storedesk_core::{
    Category, CategoryDraft, CategoryId, Order, OrderDraft, OrderStatus, Price, Product,
    ProductDraft, ProductId, UNKNOWN_CUSTOMER,
};
use thiserror::Error;
use tracing::info;

/// Errors that can occur while seeding.
#[derive(Debug, Error)]
pub enum SeedError {
    /// The file could not be read.
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    /// The file is not valid seed YAML.
    #[error("Invalid seed file: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// A product names a category that does not exist.
    #[error("Product {product} references unknown category {category}")]
    UnknownCategory { product: String, category: String },

    /// An order names a product that does not exist.
    #[error("Order for {customer} references unknown product {product}")]
    UnknownProduct { customer: String, product: String },

    /// An order without a total whose computed total is out of range.
    #[error("Order for {customer} of {product} has a total out of range")]
    TotalOutOfRange { customer: String, product: String },

    /// A store request failed.
    #[error(transparent)]
    Container(#[from] ContainerError),
}

/// Contents of a seed file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SeedFile {
    pub categories: Vec<CategoryDraft>,
    pub products: Vec<SeedProduct>,
    pub orders: Vec<SeedOrder>,
}

/// A product whose category is given by name.
#[derive(Debug, Deserialize)]
pub struct SeedProduct {
    pub name: String,
    #[serde(default)]
    pub images: Vec<String>,
    pub price: Price,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

/// An order whose product is given by name.
///
/// A missing total is the product's price times the quantity.
#[derive(Debug, Deserialize)]
pub struct SeedOrder {
    pub product: String,
    #[serde(default = "one")]
    pub quantity: i64,
    #[serde(default)]
    pub total_price: Option<Price>,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

const fn one() -> i64 {
    1
}

/// Number of records created per collection.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub categories: usize,
    pub products: usize,
    pub orders: usize,
}

/// Seed from a YAML file on disk.
///
/// # Errors
///
/// Returns `SeedError` if the file cannot be read or parsed, a reference
/// cannot be resolved, or a store request fails.
pub async fn from_file(store: SharedStore, path: &str) -> Result<SeedSummary, SeedError> {
    info!(path = %path, "Loading seed file");

    let content = tokio::fs::read_to_string(Path::new(path))
        .await
        .map_err(|source| SeedError::Read {
            path: path.to_string(),
            source,
        })?;
    let file: SeedFile = serde_yaml::from_str(&content)?;

    info!(
        categories = file.categories.len(),
        products = file.products.len(),
        orders = file.orders.len(),
        "Parsed seed file"
    );

    seed(store, file).await
}

/// Create every record in `file`.
///
/// Records created before a failure are kept.
///
/// # Errors
///
/// Returns `SeedError` if a reference cannot be resolved or a store request
/// fails.
pub async fn seed(store: SharedStore, file: SeedFile) -> Result<SeedSummary, SeedError> {
    let categories = EntityHandle::<Category>::spawn(store.clone());
    let products = EntityHandle::<Product>::spawn(store.clone());
    let orders = EntityHandle::<Order>::spawn(store);

    categories.list().await?;
    products.list().await?;

    let mut summary = SeedSummary::default();

    let mut category_ids: HashMap<String, CategoryId> = categories
        .snapshot()
        .items
        .into_iter()
        .map(|c| (c.name, c.id))
        .collect();

    for draft in &file.categories {
        let created = categories.create(draft).await?;
        info!(id = %created.id, name = %created.name, "Created category");
        category_ids.insert(created.name, created.id);
        summary.categories += 1;
    }

    let mut catalog: HashMap<String, (ProductId, Price)> = products
        .snapshot()
        .items
        .into_iter()
        .map(|p| (p.name, (p.id, p.price)))
        .collect();

    for product in file.products {
        let category_id = match product.category {
            Some(name) => Some(category_ids.get(&name).cloned().ok_or_else(|| {
                SeedError::UnknownCategory {
                    product: product.name.clone(),
                    category: name,
                }
            })?),
            None => None,
        };

        let draft = ProductDraft {
            name: product.name,
            images: product.images,
            price: product.price,
            quantity: product.quantity,
            description: product.description,
            category_id,
            created_at: Some(Utc::now()),
        };
        let created = products.create(&draft).await?;
        info!(id = %created.id, name = %created.name, "Created product");
        catalog.insert(created.name, (created.id, created.price));
        summary.products += 1;
    }

    for order in file.orders {
        let customer_name = order
            .customer_name
            .unwrap_or_else(|| UNKNOWN_CUSTOMER.to_string());
        let Some((product_id, unit_price)) = catalog.get(&order.product).cloned() else {
            return Err(SeedError::UnknownProduct {
                customer: customer_name,
                product: order.product,
            });
        };

        let draft = OrderDraft {
            product_id,
            quantity: order.quantity,
            total_price: order
                .total_price
                .or_else(|| unit_price.checked_times(order.quantity))
                .ok_or_else(|| SeedError::TotalOutOfRange {
                    customer: customer_name.clone(),
                    product: order.product.clone(),
                })?,
            status: order.status,
            customer_name,
            created_at: order.created_at.unwrap_or_else(Utc::now),
        };
        let created = orders.create(&draft).await?;
        info!(id = %created.id, total = %created.total_price, "Created order");
        summary.orders += 1;
    }

    Ok(summary)
}
