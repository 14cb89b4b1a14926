//! Product management route handlers.

use askama::Template;
use axum::{
    Form, Router,
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use chrono::Utc;
use serde::Deserialize;
use storedesk_core::{Category, CategoryId, Price, Product, ProductDraft, ProductPatch};
use tracing::instrument;

use crate::{error::AppError, filters, state::AppState};

use super::dashboard::LOW_STOCK_THRESHOLD;
use super::{Flash, non_blank, redirect_error, redirect_success, refresh, render};

/// Query parameters for the product table.
#[derive(Debug, Deserialize)]
pub struct ProductsQuery {
    pub q: Option<String>,
    pub success: Option<String>,
    pub error: Option<String>,
}

/// Form input for creating or editing a product.
///
/// Only a single image URL is editable. `current_image` carries the URL
/// the edit form was rendered with, so an untouched field leaves the stored
/// image list alone.
#[derive(Debug, Deserialize)]
pub struct ProductFormInput {
    pub name: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub current_image: Option<String>,
    pub price: String,
    pub quantity: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category_id: Option<String>,
}

/// Product view for templates.
#[derive(Debug, Clone)]
pub struct ProductView {
    pub id: String,
    pub name: String,
    pub image_url: Option<String>,
    pub image_count: usize,
    pub price: String,
    pub price_input: String,
    pub quantity: i64,
    pub low_stock: bool,
    pub description: Option<String>,
    pub category_id: Option<String>,
    pub category_name: Option<String>,
}

impl ProductView {
    /// Build a view, resolving the category name from `categories`.
    #[must_use]
    pub fn new(product: &Product, categories: &[Category]) -> Self {
        let category_id = product.category_id.as_ref().map(ToString::to_string);
        let category_name = category_id.as_deref().and_then(|id| {
            categories
                .iter()
                .find(|c| c.id.as_str() == id)
                .map(|c| c.name.clone())
        });
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            image_url: product.thumbnail().map(str::to_string),
            image_count: product.images.len(),
            price: product.price.display(),
            price_input: product.price.amount().normalize().to_string(),
            quantity: product.quantity,
            low_stock: product.is_low_stock(LOW_STOCK_THRESHOLD),
            description: product.description.clone(),
            category_id,
            category_name,
        }
    }
}

/// Category option for selects.
#[derive(Debug, Clone)]
pub struct CategoryOption {
    pub id: String,
    pub name: String,
}

impl From<&Category> for CategoryOption {
    fn from(category: &Category) -> Self {
        Self {
            id: category.id.to_string(),
            name: category.name.clone(),
        }
    }
}

/// Products list page template.
#[derive(Template)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub current_path: String,
    pub flash: Flash,
    pub container_error: Option<String>,
    pub loading: bool,
    pub products: Vec<ProductView>,
    pub search_query: Option<String>,
}

/// Product create form template.
#[derive(Template)]
#[template(path = "products/new.html")]
pub struct ProductNewTemplate {
    pub current_path: String,
    pub flash: Flash,
    pub container_error: Option<String>,
    pub categories: Vec<CategoryOption>,
}

/// Product edit form template.
#[derive(Template)]
#[template(path = "products/edit.html")]
pub struct ProductEditTemplate {
    pub current_path: String,
    pub flash: Flash,
    pub container_error: Option<String>,
    pub product: ProductView,
    pub categories: Vec<CategoryOption>,
}

/// Build the products router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products", get(index).post(create))
        .route("/products/new", get(new_product))
        .route("/products/{id}", post(update))
        .route("/products/{id}/edit", get(edit))
        .route("/products/{id}/delete", post(delete))
}

/// Products list page handler.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ProductsQuery>,
) -> Result<Html<String>, AppError> {
    let (products, categories) =
        tokio::join!(refresh(state.products()), refresh(state.categories()));

    let search_query = non_blank(query.q);
    let term = search_query.as_deref().map(str::to_lowercase);

    let views = products
        .items
        .iter()
        .filter(|p| {
            term.as_deref()
                .is_none_or(|t| p.name.to_lowercase().contains(t))
        })
        .map(|p| ProductView::new(p, &categories.items))
        .collect();

    let template = ProductsIndexTemplate {
        current_path: "/products".to_string(),
        flash: Flash::for_entity::<Product>(query.success, query.error),
        loading: products.loading(),
        container_error: products.error,
        products: views,
        search_query,
    };

    render(&template)
}

/// New product form handler.
#[instrument(skip(state))]
pub async fn new_product(
    State(state): State<AppState>,
    Query(query): Query<ProductsQuery>,
) -> Result<Html<String>, AppError> {
    let categories = refresh(state.categories()).await;

    let template = ProductNewTemplate {
        current_path: "/products".to_string(),
        flash: Flash::for_entity::<Product>(query.success, query.error),
        container_error: categories.error,
        categories: categories.items.iter().map(CategoryOption::from).collect(),
    };

    render(&template)
}

fn parse_price(value: &str) -> Result<Price, String> {
    value
        .parse::<Price>()
        .map_err(|_| format!("invalid price: {value}"))
}

fn parse_quantity(value: &str) -> Result<i64, String> {
    value
        .trim()
        .parse()
        .map_err(|_| format!("invalid quantity: {value}"))
}

/// Turn the create form into a product draft.
///
/// # Errors
///
/// Returns a description of the first invalid field.
pub fn draft_from_form(input: ProductFormInput) -> Result<ProductDraft, String> {
    let name = input.name.trim().to_string();
    if name.is_empty() {
        return Err("missing name".to_string());
    }

    Ok(ProductDraft {
        name,
        images: non_blank(input.image_url).into_iter().collect(),
        price: parse_price(&input.price)?,
        quantity: parse_quantity(&input.quantity)?,
        description: non_blank(input.description),
        category_id: non_blank(input.category_id).map(CategoryId::new),
        created_at: Some(Utc::now()),
    })
}

/// Turn the edit form into a product patch.
///
/// The image list is only replaced when the URL field differs from the URL
/// the form was rendered with. Blank description or category clear them.
///
/// # Errors
///
/// Returns a description of the first invalid field.
pub fn patch_from_form(input: ProductFormInput) -> Result<ProductPatch, String> {
    let name = input.name.trim().to_string();
    if name.is_empty() {
        return Err("missing name".to_string());
    }

    let image_url = non_blank(input.image_url);
    let images = (image_url != non_blank(input.current_image))
        .then(|| image_url.into_iter().collect());

    Ok(ProductPatch {
        name: Some(name),
        images,
        price: Some(parse_price(&input.price)?),
        quantity: Some(parse_quantity(&input.quantity)?),
        description: Some(non_blank(input.description)),
        category_id: Some(non_blank(input.category_id).map(CategoryId::new)),
    })
}

/// Create product handler.
#[instrument(skip(state, input))]
pub async fn create(
    State(state): State<AppState>,
    Form(input): Form<ProductFormInput>,
) -> impl IntoResponse {
    let draft = match draft_from_form(input) {
        Ok(draft) => draft,
        Err(reason) => {
            tracing::warn!(%reason, "Rejected product form");
            return redirect_error("/products/new", "invalid_form");
        }
    };

    match state.products().create(&draft).await {
        Ok(product) => {
            tracing::info!(product_id = %product.id, name = %product.name, "Product created");
            redirect_success("/products", "created")
        }
        Err(e) => {
            tracing::error!(name = %draft.name, error = %e, "Failed to create product");
            redirect_error("/products", "create_failed")
        }
    }
}

/// Edit product form handler.
#[instrument(skip(state))]
pub async fn edit(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ProductsQuery>,
) -> Response {
    let (products, categories) =
        tokio::join!(refresh(state.products()), refresh(state.categories()));

    let Some(product) = products.find(&id) else {
        return redirect_error("/products", "not_found").into_response();
    };

    let template = ProductEditTemplate {
        current_path: "/products".to_string(),
        flash: Flash::for_entity::<Product>(query.success, query.error),
        container_error: products.error.clone(),
        product: ProductView::new(product, &categories.items),
        categories: categories.items.iter().map(CategoryOption::from).collect(),
    };

    render(&template).into_response()
}

/// Update product handler.
#[instrument(skip(state, input))]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(input): Form<ProductFormInput>,
) -> Redirect {
    let patch = match patch_from_form(input) {
        Ok(patch) => patch,
        Err(reason) => {
            tracing::warn!(product_id = %id, %reason, "Rejected product form");
            return redirect_error(&format!("/products/{id}/edit"), "invalid_form");
        }
    };

    match state.products().update(&id, &patch).await {
        Ok(()) => {
            tracing::info!(product_id = %id, "Product updated");
            redirect_success("/products", "updated")
        }
        Err(e) => {
            tracing::error!(product_id = %id, error = %e, "Failed to update product");
            redirect_error("/products", "update_failed")
        }
    }
}

/// Delete product handler.
#[instrument(skip(state))]
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> Redirect {
    match state.products().delete(&id).await {
        Ok(()) => {
            tracing::info!(product_id = %id, "Product deleted");
            redirect_success("/products", "deleted")
        }
        Err(e) => {
            tracing::error!(product_id = %id, error = %e, "Failed to delete product");
            redirect_error("/products", "delete_failed")
        }
    }
}
