//! Category management route handlers.

use askama::Template;
use axum::{
    Form, Router,
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::Deserialize;
use storedesk_core::{Category, CategoryDraft, CategoryPatch, Product};
use tracing::instrument;

use crate::{error::AppError, filters, state::AppState};

use super::{Flash, FlashQuery, non_blank, redirect_error, redirect_success, refresh, render};

/// Form input for creating or editing a category.
#[derive(Debug, Deserialize)]
pub struct CategoryFormInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Category view for templates.
#[derive(Debug, Clone)]
pub struct CategoryView {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub product_count: usize,
}

impl CategoryView {
    /// Build a view, counting the products filed under the category.
    #[must_use]
    pub fn new(category: &Category, products: &[Product]) -> Self {
        Self {
            id: category.id.to_string(),
            name: category.name.clone(),
            description: category.description.clone(),
            product_count: products
                .iter()
                .filter(|p| p.category_id.as_ref() == Some(&category.id))
                .count(),
        }
    }
}

/// Category list page template.
#[derive(Template)]
#[template(path = "categories/index.html")]
pub struct CategoriesIndexTemplate {
    pub current_path: String,
    pub flash: Flash,
    pub container_error: Option<String>,
    pub loading: bool,
    pub categories: Vec<CategoryView>,
}

/// Category edit form template.
#[derive(Template)]
#[template(path = "categories/edit.html")]
pub struct CategoryEditTemplate {
    pub current_path: String,
    pub flash: Flash,
    pub container_error: Option<String>,
    pub category: CategoryView,
}

/// Build the categories router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/category", get(index).post(create))
        .route("/category/{id}", post(update))
        .route("/category/{id}/edit", get(edit))
        .route("/category/{id}/delete", post(delete))
}

/// Category list page handler.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<FlashQuery>,
) -> Result<Html<String>, AppError> {
    let (categories, products) =
        tokio::join!(refresh(state.categories()), refresh(state.products()));

    let template = CategoriesIndexTemplate {
        current_path: "/category".to_string(),
        flash: Flash::for_entity::<Category>(query.success, query.error),
        loading: categories.loading(),
        container_error: categories.error,
        categories: categories
            .items
            .iter()
            .map(|c| CategoryView::new(c, &products.items))
            .collect(),
    };

    render(&template)
}

/// Create category handler.
#[instrument(skip(state))]
pub async fn create(
    State(state): State<AppState>,
    Form(input): Form<CategoryFormInput>,
) -> Redirect {
    let Some(name) = non_blank(Some(input.name)) else {
        return redirect_error("/category", "invalid_form");
    };

    let draft = CategoryDraft {
        name,
        description: non_blank(input.description),
    };

    match state.categories().create(&draft).await {
        Ok(category) => {
            tracing::info!(category_id = %category.id, name = %category.name, "Category created");
            redirect_success("/category", "created")
        }
        Err(e) => {
            tracing::error!(name = %draft.name, error = %e, "Failed to create category");
            redirect_error("/category", "create_failed")
        }
    }
}

/// Edit category form handler.
#[instrument(skip(state))]
pub async fn edit(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<FlashQuery>,
) -> Response {
    let (categories, products) =
        tokio::join!(refresh(state.categories()), refresh(state.products()));

    let Some(category) = categories.find(&id) else {
        return redirect_error("/category", "not_found").into_response();
    };

    let template = CategoryEditTemplate {
        current_path: "/category".to_string(),
        flash: Flash::for_entity::<Category>(query.success, query.error),
        container_error: categories.error.clone(),
        category: CategoryView::new(category, &products.items),
    };

    render(&template).into_response()
}

/// Update category handler.
#[instrument(skip(state))]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(input): Form<CategoryFormInput>,
) -> Redirect {
    let Some(name) = non_blank(Some(input.name)) else {
        return redirect_error(&format!("/category/{id}/edit"), "invalid_form");
    };

    let patch = CategoryPatch {
        name: Some(name),
        description: Some(non_blank(input.description)),
    };

    match state.categories().update(&id, &patch).await {
        Ok(()) => {
            tracing::info!(category_id = %id, "Category updated");
            redirect_success("/category", "updated")
        }
        Err(e) => {
            tracing::error!(category_id = %id, error = %e, "Failed to update category");
            redirect_error("/category", "update_failed")
        }
    }
}

/// Delete category handler.
///
/// Products keep their `categoryId`; the product table shows it unresolved.
#[instrument(skip(state))]
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> Redirect {
    match state.categories().delete(&id).await {
        Ok(()) => {
            tracing::info!(category_id = %id, "Category deleted");
            redirect_success("/category", "deleted")
        }
        Err(e) => {
            tracing::error!(category_id = %id, error = %e, "Failed to delete category");
            redirect_error("/category", "delete_failed")
        }
    }
}
