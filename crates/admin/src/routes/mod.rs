//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                      - Liveness check
//! GET  /health/ready                - Readiness check (store ping)
//!
//! # Dashboard
//! GET  /                            - Counts, revenue, recent orders
//!
//! # Orders
//! GET  /orders                      - Order table (?status= filter) + create form
//! POST /orders                      - Create order
//! POST /orders/{id}                 - Update order status
//! POST /orders/{id}/delete          - Delete order
//!
//! # Products
//! GET  /products                    - Product table
//! GET  /products/new                - Create form
//! POST /products                    - Create product
//! GET  /products/{id}/edit          - Edit form
//! POST /products/{id}               - Update product
//! POST /products/{id}/delete        - Delete product
//!
//! # Categories
//! GET  /category                    - Category list + create form
//! POST /category                    - Create category
//! GET  /category/{id}/edit          - Edit form
//! POST /category/{id}               - Update category
//! POST /category/{id}/delete        - Delete category
//!
//! # Customers
//! GET  /customers                   - User table (?q= first-name search)
//! POST /customers/{uid}/delete      - Delete user
//! ```
//!
//! Every page load refreshes the containers it reads. Mutations redirect
//! back with `?success=<code>` or `?error=<code>`.

pub mod categories;
pub mod customers;
pub mod dashboard;
pub mod orders;
pub mod products;

use askama::Template;
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{Html, Redirect},
    routing::get,
};
use serde::Deserialize;
use storedesk_core::Entity;

use crate::containers::{EntityHandle, EntityState};
use crate::error::AppError;
use crate::state::AppState;

/// Build the dashboard router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(dashboard::router())
        .merge(orders::router())
        .merge(products::router())
        .merge(categories::router())
        .merge(customers::router())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the document store is not reachable.
async fn readiness(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    state.store().ping().await?;
    Ok(StatusCode::OK)
}

// =============================================================================
// Shared helpers
// =============================================================================

/// `?success=` / `?error=` codes set by mutation redirects.
#[derive(Debug, Default, Deserialize)]
pub struct FlashQuery {
    pub success: Option<String>,
    pub error: Option<String>,
}

/// Messages shown at the top of a page.
#[derive(Debug, Clone, Default)]
pub struct Flash {
    pub success: Option<String>,
    pub error: Option<String>,
}

impl Flash {
    /// Resolve redirect codes into messages about entity `E`.
    #[must_use]
    pub fn for_entity<E: Entity>(success: Option<String>, error: Option<String>) -> Self {
        let label = capitalize(E::LABEL);
        let success = success.map(|code| match code.as_str() {
            "created" => format!("{label} added successfully"),
            "updated" => format!("{label} updated successfully"),
            "deleted" => format!("{label} deleted successfully"),
            _ => code,
        });
        let error = error.map(|code| match code.as_str() {
            "create_failed" => format!("Failed to add {}", E::LABEL),
            "update_failed" => format!("Failed to update {}", E::LABEL),
            "delete_failed" => format!("Failed to delete {}", E::LABEL),
            "invalid_form" => "Please check the form and try again".to_string(),
            "not_found" => format!("{label} not found"),
            _ => code,
        });
        Self { success, error }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// Redirect to `path` with a `?success=` code.
pub(crate) fn redirect_success(path: &str, code: &str) -> Redirect {
    Redirect::to(&format!("{path}?success={code}"))
}

/// Redirect to `path` with an `?error=` code.
pub(crate) fn redirect_error(path: &str, code: &str) -> Redirect {
    Redirect::to(&format!("{path}?error={code}"))
}

/// Render a page template.
pub(crate) fn render(template: &impl Template) -> Result<Html<String>, AppError> {
    Ok(Html(template.render()?))
}

/// Fetch the collection and return the container's state.
///
/// A failed fetch is already recorded on the container (and shown by the
/// page), so it is not an error here.
pub(crate) async fn refresh<E: Entity>(container: &EntityHandle<E>) -> EntityState<E> {
    if let Err(e) = container.list().await {
        tracing::debug!(entity = E::PLURAL, error = %e, "Refresh failed, showing last known records");
    }
    container.snapshot()
}

/// Read an optional text field, treating blank input as absent.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
