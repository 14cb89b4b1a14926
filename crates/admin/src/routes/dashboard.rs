//! Dashboard overview route.

use askama::Template;
use axum::{Router, extract::State, response::Html, routing::get};
use storedesk_core::{Order, OrderStatus, Price, Product};
use tracing::instrument;

use crate::{error::AppError, filters, state::AppState};

use super::orders::OrderView;
use super::{refresh, render};

/// Number of orders shown in the "Recent orders" table.
const RECENT_ORDERS: usize = 5;

/// Shown in place of a revenue total too large to display.
const REVENUE_OUT_OF_RANGE: &str = "Out of range";

/// Products at or below this quantity are counted as low stock.
pub const LOW_STOCK_THRESHOLD: i64 = 5;

/// Order count for one status.
#[derive(Debug, Clone)]
pub struct StatusCount {
    pub status: String,
    pub label: &'static str,
    pub count: usize,
}

/// Headline numbers.
#[derive(Debug, Clone, Default)]
pub struct DashboardStats {
    pub products: usize,
    pub categories: usize,
    pub orders: usize,
    pub customers: usize,
    pub revenue: String,
    pub low_stock: usize,
}

/// Dashboard page template.
#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub current_path: String,
    pub stats: DashboardStats,
    pub by_status: Vec<StatusCount>,
    pub recent_orders: Vec<OrderView>,
    pub errors: Vec<String>,
    pub store_name: &'static str,
}

/// Build the dashboard router.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(index))
}

/// Revenue from every order that has not been cancelled.
///
/// `None` when the total does not fit in a [`Price`].
#[must_use]
pub fn revenue(orders: &[Order]) -> Option<Price> {
    Price::checked_sum(
        orders
            .iter()
            .filter(|order| order.status.is_billable())
            .map(|order| order.total_price),
    )
}

/// Order counts per status, in form order.
#[must_use]
pub fn count_by_status(orders: &[Order]) -> Vec<StatusCount> {
    OrderStatus::ALL
        .iter()
        .map(|status| StatusCount {
            status: status.as_str().to_string(),
            label: status.label(),
            count: orders.iter().filter(|o| o.status == *status).count(),
        })
        .collect()
}

/// The most recent orders, newest first.
#[must_use]
pub fn recent(orders: &[Order], limit: usize) -> Vec<&Order> {
    let mut sorted: Vec<&Order> = orders.iter().collect();
    sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    sorted.truncate(limit);
    sorted
}

/// Dashboard overview page handler.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let (products, categories, orders, users) = tokio::join!(
        refresh(state.products()),
        refresh(state.categories()),
        refresh(state.orders()),
        refresh(state.users()),
    );

    let stats = DashboardStats {
        products: products.items.len(),
        categories: categories.items.len(),
        orders: orders.items.len(),
        customers: users.items.len(),
        revenue: revenue(&orders.items)
            .map_or_else(|| REVENUE_OUT_OF_RANGE.to_string(), |total| total.display()),
        low_stock: products
            .items
            .iter()
            .filter(|p| p.is_low_stock(LOW_STOCK_THRESHOLD))
            .count(),
    };

    let recent_orders = recent(&orders.items, RECENT_ORDERS)
        .into_iter()
        .map(|order| OrderView::new(order, &products.items))
        .collect();

    let errors = [
        products.error,
        categories.error,
        orders.error,
        users.error,
    ]
    .into_iter()
    .flatten()
    .collect();

    let template = DashboardTemplate {
        current_path: "/".to_string(),
        stats,
        by_status: count_by_status(&orders.items),
        recent_orders,
        errors,
        store_name: state.config().store.name(),
    };

    render(&template)
}

/// Name of the product an order refers to, if it is still in the catalog.
#[must_use]
pub fn product_name<'a>(products: &'a [Product], product_id: &str) -> Option<&'a str> {
    products
        .iter()
        .find(|p| p.id.as_str() == product_id)
        .map(|p| p.name.as_str())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{Duration, Utc};
    use storedesk_core::{OrderId, ProductId};

    use super::*;

    fn order(id: &str, status: OrderStatus, total: i64, age_days: i64) -> Order {
        Order {
            id: OrderId::new(id),
            product_id: ProductId::new("p1"),
            quantity: 1,
            total_price: Price::from_units(total),
            status,
            customer_name: "Ada".to_string(),
            created_at: Utc::now() - Duration::days(age_days),
        }
    }

    #[test]
    fn test_revenue_excludes_cancelled() {
        let orders = vec![
            order("1", OrderStatus::Pending, 10, 0),
            order("2", OrderStatus::Delivered, 25, 1),
            order("3", OrderStatus::Cancelled, 100, 2),
        ];
        assert_eq!(revenue(&orders), Some(Price::from_units(35)));
    }

    #[test]
    fn test_revenue_out_of_range() {
        let mut big = order("1", OrderStatus::Pending, 0, 0);
        big.total_price = "999999999999999".parse().unwrap();
        let orders = vec![big.clone(), big];
        assert_eq!(revenue(&orders), None);
    }

    #[test]
    fn test_count_by_status() {
        let orders = vec![
            order("1", OrderStatus::Pending, 10, 0),
            order("2", OrderStatus::Pending, 10, 0),
            order("3", OrderStatus::Shipped, 10, 0),
        ];
        let counts = count_by_status(&orders);
        assert_eq!(counts.len(), 4);
        assert_eq!(counts.first().unwrap().count, 2);
        assert_eq!(counts.get(1).unwrap().count, 1);
        assert_eq!(counts.get(3).unwrap().count, 0);
    }

    #[test]
    fn test_recent_orders_newest_first() {
        let orders = vec![
            order("old", OrderStatus::Pending, 1, 10),
            order("new", OrderStatus::Pending, 1, 0),
            order("mid", OrderStatus::Pending, 1, 5),
        ];
        let ids: Vec<&str> = recent(&orders, 2).iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "mid"]);
    }
}
