//! Customer route handlers.
//!
//! Customers are created by the storefront, so the dashboard can only list,
//! search and delete them.

use askama::Template;
use axum::{
    Router,
    extract::{Path, Query, State},
    response::{Html, Redirect},
    routing::{get, post},
};
use serde::Deserialize;
use storedesk_core::User;
use tracing::instrument;

use crate::{error::AppError, filters, state::AppState};

use super::{Flash, non_blank, redirect_error, redirect_success, refresh, render};

/// Query parameters for the customer table.
#[derive(Debug, Deserialize)]
pub struct CustomersQuery {
    pub q: Option<String>,
    pub success: Option<String>,
    pub error: Option<String>,
}

/// Customer view for templates.
#[derive(Debug, Clone)]
pub struct CustomerView {
    pub uid: String,
    pub name: String,
    pub username: Option<String>,
    pub image_url: Option<String>,
    pub language: Option<String>,
    pub is_premium: bool,
    pub balance: String,
    pub referrals: usize,
    pub referred_by: Option<String>,
    pub daily_streak: i64,
    pub last_claim: Option<String>,
}

impl From<&User> for CustomerView {
    fn from(user: &User) -> Self {
        Self {
            uid: user.uid.to_string(),
            name: user.display_name(),
            username: user.username.clone(),
            image_url: user.user_image.clone(),
            language: user.language_code.clone(),
            is_premium: user.is_premium,
            balance: user.balance_or_zero().display(),
            referrals: user.referrals.len(),
            referred_by: user.referred_by.clone(),
            daily_streak: user.daily.claimed_day,
            last_claim: user.daily.claimed_time.clone(),
        }
    }
}

/// Customers page template.
#[derive(Template)]
#[template(path = "customers/index.html")]
pub struct CustomersIndexTemplate {
    pub current_path: String,
    pub flash: Flash,
    pub container_error: Option<String>,
    pub loading: bool,
    pub customers: Vec<CustomerView>,
    pub total: usize,
    pub search_query: Option<String>,
}

/// Build the customers router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/customers", get(index))
        .route("/customers/{uid}/delete", post(delete))
}

/// Users whose first name contains `term`, in store order.
#[must_use]
pub fn search<'a>(users: &'a [User], term: Option<&str>) -> Vec<&'a User> {
    users
        .iter()
        .filter(|user| term.is_none_or(|t| user.first_name_contains(t)))
        .collect()
}

/// Customers page handler.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<CustomersQuery>,
) -> Result<Html<String>, AppError> {
    let users = refresh(state.users()).await;
    let search_query = non_blank(query.q);

    let customers = search(&users.items, search_query.as_deref())
        .into_iter()
        .map(CustomerView::from)
        .collect();

    let template = CustomersIndexTemplate {
        current_path: "/customers".to_string(),
        flash: Flash::for_entity::<User>(query.success, query.error),
        loading: users.loading(),
        container_error: users.error,
        customers,
        total: users.items.len(),
        search_query,
    };

    render(&template)
}

/// Delete customer handler.
#[instrument(skip(state))]
pub async fn delete(State(state): State<AppState>, Path(uid): Path<String>) -> Redirect {
    match state.users().delete(&uid).await {
        Ok(()) => {
            tracing::info!(uid = %uid, "Customer deleted");
            redirect_success("/customers", "deleted")
        }
        Err(e) => {
            tracing::error!(uid = %uid, error = %e, "Failed to delete customer");
            redirect_error("/customers", "delete_failed")
        }
    }
}
