//! Order management route handlers.

use askama::Template;
use axum::{
    Form, Router,
    extract::{Path, Query, State},
    response::{Html, IntoResponse},
    routing::{get, post},
};
use chrono::Utc;
use serde::Deserialize;
use storedesk_core::{
    Order, OrderDraft, OrderPatch, OrderStatus, Price, Product, ProductId, UNKNOWN_CUSTOMER,
};
use tracing::instrument;

use crate::{error::AppError, filters, state::AppState};

use super::dashboard::product_name;
use super::{Flash, non_blank, redirect_error, redirect_success, refresh, render};

/// Query parameters for the order table.
#[derive(Debug, Deserialize)]
pub struct OrdersQuery {
    pub status: Option<String>,
    pub success: Option<String>,
    pub error: Option<String>,
}

/// Form input for creating an order.
///
/// Numbers arrive as text so a blank or malformed value can be reported on
/// the page instead of rejected by the extractor.
#[derive(Debug, Deserialize)]
pub struct OrderFormInput {
    pub product_id: String,
    pub quantity: String,
    #[serde(default)]
    pub total_price: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub customer_name: Option<String>,
}

/// Form input for changing an order's status.
#[derive(Debug, Deserialize)]
pub struct OrderStatusInput {
    pub status: String,
}

/// Order view for templates.
#[derive(Debug, Clone)]
pub struct OrderView {
    pub id: String,
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    pub total_price: String,
    pub status: String,
    pub status_label: &'static str,
    pub customer_name: String,
    pub created_at: String,
}

impl OrderView {
    /// Build a view, resolving the product name from `products`.
    #[must_use]
    pub fn new(order: &Order, products: &[Product]) -> Self {
        let product_id = order.product_id.as_str();
        Self {
            id: order.id.to_string(),
            product_id: product_id.to_string(),
            product_name: product_name(products, product_id)
                .map_or_else(|| product_id.to_string(), str::to_string),
            quantity: order.quantity,
            total_price: order.total_price.display(),
            status: order.status.as_str().to_string(),
            status_label: order.status.label(),
            customer_name: order.customer_name.clone(),
            created_at: order.created_at.format("%b %d, %Y %H:%M").to_string(),
        }
    }
}

/// Product option for the create form.
#[derive(Debug, Clone)]
pub struct ProductOption {
    pub id: String,
    pub label: String,
}

impl From<&Product> for ProductOption {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            label: format!("{} ({})", product.name, product.price.display()),
        }
    }
}

/// Status option for selects and filters.
#[derive(Debug, Clone)]
pub struct StatusOption {
    pub value: &'static str,
    pub label: &'static str,
}

fn status_options() -> Vec<StatusOption> {
    OrderStatus::ALL
        .iter()
        .map(|s| StatusOption {
            value: s.as_str(),
            label: s.label(),
        })
        .collect()
}

/// Orders page template.
#[derive(Template)]
#[template(path = "orders/index.html")]
pub struct OrdersIndexTemplate {
    pub current_path: String,
    pub flash: Flash,
    pub container_error: Option<String>,
    pub loading: bool,
    pub orders: Vec<OrderView>,
    pub products: Vec<ProductOption>,
    pub statuses: Vec<StatusOption>,
    pub status_filter: Option<String>,
}

/// Build the orders router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", get(index).post(create))
        .route("/orders/{id}", post(update_status))
        .route("/orders/{id}/delete", post(delete))
}

/// Orders page handler.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<OrdersQuery>,
) -> Result<Html<String>, AppError> {
    let (orders, products) = tokio::join!(refresh(state.orders()), refresh(state.products()));

    let status_filter = query
        .status
        .as_deref()
        .and_then(|s| s.parse::<OrderStatus>().ok());

    let views = orders
        .items
        .iter()
        .filter(|order| status_filter.is_none_or(|s| order.status == s))
        .map(|order| OrderView::new(order, &products.items))
        .collect();

    let template = OrdersIndexTemplate {
        current_path: "/orders".to_string(),
        flash: Flash::for_entity::<Order>(query.success, query.error),
        loading: orders.loading(),
        container_error: orders.error,
        orders: views,
        products: products.items.iter().map(ProductOption::from).collect(),
        statuses: status_options(),
        status_filter: status_filter.map(|s| s.as_str().to_string()),
    };

    render(&template)
}

/// Turn the create form into an order draft.
///
/// A blank total is the product's unit price times the quantity, which
/// requires the product to be in `products`.
///
/// # Errors
///
/// Returns a description of the first invalid field.
pub fn draft_from_form(input: OrderFormInput, products: &[Product]) -> Result<OrderDraft, String> {
    let product_id = input.product_id.trim().to_string();
    if product_id.is_empty() {
        return Err("missing product".to_string());
    }

    let quantity: i64 = input
        .quantity
        .trim()
        .parse()
        .map_err(|_| format!("invalid quantity: {}", input.quantity))?;

    let total_price = match non_blank(input.total_price) {
        Some(total) => total
            .parse::<Price>()
            .map_err(|_| format!("invalid total: {total}"))?,
        None => products
            .iter()
            .find(|p| p.id.as_str() == product_id)
            .ok_or_else(|| format!("unknown product {product_id}, total required"))?
            .price
            .checked_times(quantity)
            .ok_or_else(|| format!("total out of range for quantity {quantity}"))?,
    };

    let status = match non_blank(input.status) {
        Some(s) => s.parse::<OrderStatus>()?,
        None => OrderStatus::default(),
    };

    Ok(OrderDraft {
        product_id: ProductId::new(product_id),
        quantity,
        total_price,
        status,
        customer_name: non_blank(input.customer_name)
            .unwrap_or_else(|| UNKNOWN_CUSTOMER.to_string()),
        created_at: Utc::now(),
    })
}

/// Create order handler.
#[instrument(skip(state, input))]
pub async fn create(
    State(state): State<AppState>,
    Form(input): Form<OrderFormInput>,
) -> impl IntoResponse {
    let products = refresh(state.products()).await;
    let draft = match draft_from_form(input, &products.items) {
        Ok(draft) => draft,
        Err(reason) => {
            tracing::warn!(%reason, "Rejected order form");
            return redirect_error("/orders", "invalid_form");
        }
    };

    match state.orders().create(&draft).await {
        Ok(order) => {
            tracing::info!(order_id = %order.id, total = %order.total_price, "Order created");
            redirect_success("/orders", "created")
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to create order");
            redirect_error("/orders", "create_failed")
        }
    }
}

/// Update order status handler.
#[instrument(skip(state))]
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(input): Form<OrderStatusInput>,
) -> impl IntoResponse {
    let Ok(status) = input.status.parse::<OrderStatus>() else {
        return redirect_error("/orders", "invalid_form");
    };

    match state.orders().update(&id, &OrderPatch::status(status)).await {
        Ok(()) => {
            tracing::info!(order_id = %id, %status, "Order status updated");
            redirect_success("/orders", "updated")
        }
        Err(e) => {
            tracing::error!(order_id = %id, error = %e, "Failed to update order");
            redirect_error("/orders", "update_failed")
        }
    }
}

/// Delete order handler.
#[instrument(skip(state))]
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    match state.orders().delete(&id).await {
        Ok(()) => {
            tracing::info!(order_id = %id, "Order deleted");
            redirect_success("/orders", "deleted")
        }
        Err(e) => {
            tracing::error!(order_id = %id, error = %e, "Failed to delete order");
            redirect_error("/orders", "delete_failed")
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn widget() -> Product {
        Product {
            id: ProductId::new("w1"),
            name: "Widget".to_string(),
            images: vec![],
            price: "2.50".parse().unwrap(),
            quantity: 10,
            description: None,
            category_id: None,
            created_at: None,
        }
    }

    fn form(product_id: &str, quantity: &str, total: Option<&str>) -> OrderFormInput {
        OrderFormInput {
            product_id: product_id.to_string(),
            quantity: quantity.to_string(),
            total_price: total.map(str::to_string),
            status: None,
            customer_name: Some("  ".to_string()),
        }
    }

    #[test]
    fn test_blank_total_uses_unit_price() {
        let draft = draft_from_form(form("w1", "4", Some("")), &[widget()]).unwrap();
        assert_eq!(draft.total_price, Price::from_units(10));
        assert_eq!(draft.status, OrderStatus::Pending);
        assert_eq!(draft.customer_name, UNKNOWN_CUSTOMER);
    }

    #[test]
    fn test_explicit_total_wins() {
        let draft = draft_from_form(form("w1", "4", Some("$9.00")), &[widget()]).unwrap();
        assert_eq!(draft.total_price, Price::from_units(9));
    }

    #[test]
    fn test_unknown_product_needs_total() {
        assert!(draft_from_form(form("ghost", "1", None), &[widget()]).is_err());
        assert!(draft_from_form(form("ghost", "1", Some("3")), &[]).is_ok());
    }

    #[test]
    fn test_total_out_of_range() {
        let mut pricey = widget();
        pricey.price = "100000000000".parse().unwrap();
        let quantity = i64::MAX.to_string();

        let err = draft_from_form(form("w1", &quantity, None), &[pricey]).unwrap_err();
        assert!(err.contains("out of range"));

        let huge = "79228162514264337593543950335";
        assert!(draft_from_form(form("w1", "1", Some(huge)), &[widget()]).is_err());
    }

    #[test]
    fn test_invalid_quantity() {
        assert!(draft_from_form(form("w1", "lots", None), &[widget()]).is_err());
    }
}
