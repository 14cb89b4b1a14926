//! Catalog products.
//!
//! # Image field
//!
//! Stored products have used two shapes for their pictures over time: a
//! single `image` string and a list. The canonical schema is an `images`
//! list. Reads accept `images` or the legacy `image` (string or list);
//! writes only ever produce `images`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::document::{Editable, Entity};
use super::id::{CategoryId, ProductId};
use super::price::Price;

/// Name given to stored products that have none.
pub const UNKNOWN_PRODUCT_NAME: &str = "Unknown Product";

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "StoredProduct")]
pub struct Product {
    #[serde(skip)]
    pub id: ProductId,
    pub name: String,
    pub images: Vec<String>,
    pub price: Price,
    pub quantity: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<CategoryId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Product {
    /// First image URL, used as the thumbnail.
    #[must_use]
    pub fn thumbnail(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }

    /// Whether stock is at or below `threshold`.
    #[must_use]
    pub const fn is_low_stock(&self, threshold: i64) -> bool {
        self.quantity <= threshold
    }
}

/// Either shape the image field has been stored in.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredImages {
    One(String),
    Many(Vec<String>),
}

impl StoredImages {
    fn into_vec(self) -> Vec<String> {
        match self {
            Self::One(url) if url.trim().is_empty() => Vec::new(),
            Self::One(url) => vec![url],
            Self::Many(urls) => urls,
        }
    }
}

/// Product as found in the store, before defaults are resolved.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredProduct {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    images: Option<StoredImages>,
    #[serde(default)]
    image: Option<StoredImages>,
    #[serde(default)]
    price: Option<Price>,
    #[serde(default)]
    quantity: Option<i64>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    category_id: Option<CategoryId>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

impl From<StoredProduct> for Product {
    fn from(stored: StoredProduct) -> Self {
        let images = stored
            .images
            .or(stored.image)
            .map(StoredImages::into_vec)
            .unwrap_or_default();

        Self {
            id: ProductId::default(),
            name: stored
                .name
                .unwrap_or_else(|| UNKNOWN_PRODUCT_NAME.to_string()),
            images,
            price: stored.price.unwrap_or_default(),
            quantity: stored.quantity.unwrap_or_default(),
            description: stored.description,
            category_id: stored.category_id.filter(|id| !id.is_empty()),
            created_at: stored.created_at,
        }
    }
}

/// Fields for creating a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDraft {
    pub name: String,
    pub images: Vec<String>,
    pub price: Price,
    pub quantity: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<CategoryId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Partial product update.
///
/// Outer `None` leaves a field untouched; `Some(None)` clears an optional field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<Option<CategoryId>>,
}

impl Entity for Product {
    const COLLECTION: &'static str = "products";
    const LABEL: &'static str = "product";
    const PLURAL: &'static str = "products";

    fn id(&self) -> &str {
        self.id.as_str()
    }

    fn set_id(&mut self, id: String) {
        self.id = ProductId::from(id);
    }
}

impl Editable for Product {
    type Draft = ProductDraft;
    type Patch = ProductPatch;
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::Document;

    fn decode(value: serde_json::Value) -> Product {
        let serde_json::Value::Object(fields) = value else {
            panic!("expected object");
        };
        Product::from_document(Document::new("p1", fields)).unwrap()
    }

    #[test]
    fn test_missing_fields_get_boundary_defaults() {
        let product = decode(json!({}));
        assert_eq!(product.name, UNKNOWN_PRODUCT_NAME);
        assert_eq!(product.price, Price::ZERO);
        assert_eq!(product.quantity, 0);
        assert!(product.images.is_empty());
        assert_eq!(product.id.as_str(), "p1");
    }

    #[test]
    fn test_legacy_single_image_string() {
        let product = decode(json!({"name": "Mug", "image": "https://cdn/mug.png"}));
        assert_eq!(product.images, vec!["https://cdn/mug.png".to_string()]);
        assert_eq!(product.thumbnail(), Some("https://cdn/mug.png"));
    }

    #[test]
    fn test_legacy_image_list() {
        let product = decode(json!({"image": ["a.png", "b.png"]}));
        assert_eq!(product.images.len(), 2);
    }

    #[test]
    fn test_canonical_images_win_over_legacy_field() {
        let product = decode(json!({"images": ["new.png"], "image": "old.png"}));
        assert_eq!(product.images, vec!["new.png".to_string()]);
    }

    #[test]
    fn test_writes_only_canonical_images_field() {
        let product = decode(json!({"name": "Mug", "image": "mug.png", "price": 4.5}));
        let fields = product.to_fields().unwrap();
        assert!(fields.contains_key("images"));
        assert!(!fields.contains_key("image"));
        assert!(!fields.contains_key("id"));
    }

    #[test]
    fn test_empty_category_id_is_treated_as_none() {
        let product = decode(json!({"categoryId": ""}));
        assert_eq!(product.category_id, None);
    }

    #[test]
    fn test_draft_encodes_camel_case() {
        let draft = ProductDraft {
            name: "Tea".to_string(),
            images: vec![],
            price: Price::from_units(3),
            quantity: 7,
            description: None,
            category_id: Some(CategoryId::new("c1")),
            created_at: None,
        };
        let fields = Product::draft_fields(&draft).unwrap();
        assert_eq!(fields.get("categoryId"), Some(&json!("c1")));
        assert!(!fields.contains_key("description"));
    }
}
