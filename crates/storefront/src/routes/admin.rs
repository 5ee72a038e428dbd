//! Admin route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use tracing::instrument;

use bazaar_core::Money;

use crate::db::OrderRepository;
use crate::error::Result;
use crate::middleware::{AdminAccess, RequireRole};
use crate::state::AppState;

const RECENT_ORDERS: i64 = 50;

/// One order row.
#[derive(Debug, Clone)]
pub struct OrderRow {
    pub id: String,
    pub email: String,
    pub total: String,
    pub status: &'static str,
    pub item_count: i64,
    pub placed_at: String,
}

/// Recent orders page template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/orders.html")]
pub struct OrdersTemplate {
    pub orders: Vec<OrderRow>,
}

/// Show the most recent orders across all customers.
#[instrument(skip(state, _guard))]
pub async fn orders(
    State(state): State<AppState>,
    _guard: RequireRole<AdminAccess>,
) -> Result<OrdersTemplate> {
    let currency = state.config().currency;
    let orders = OrderRepository::new(state.pool())
        .recent(RECENT_ORDERS)
        .await?;

    Ok(OrdersTemplate {
        orders: orders
            .into_iter()
            .map(|o| OrderRow {
                id: o.id.to_string(),
                email: o.email,
                total: Money::new(o.total, currency).display(),
                status: o.status.as_str(),
                item_count: o.item_count,
                placed_at: o.created_at.format("%Y-%m-%d %H:%M").to_string(),
            })
            .collect(),
    })
}
