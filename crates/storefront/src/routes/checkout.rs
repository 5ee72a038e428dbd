//! Checkout route handler.

use axum::{
    Json,
    extract::State,
    response::{AppendHeaders, IntoResponse, Response},
};
use tower_sessions::Session;
use tracing::instrument;

use crate::basket::ListKind;
use crate::db::OrderRepository;
use crate::error::{Result, add_breadcrumb};
use crate::middleware::RequireAuth;
use crate::state::AppState;

/// Place an order from the signed-in user's cart.
///
/// Prices come from the catalog at the moment of purchase, not from the
/// snapshot stored on the line.
#[instrument(skip(state, session, user), fields(user_id = %user.id))]
pub async fn place_order(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
) -> Result<Response> {
    let cart = state.basket(ListKind::Cart, &session, Some(&user)).await?;

    let order = OrderRepository::new(state.pool())
        .place(user.id, cart.lines())
        .await?;

    add_breadcrumb(
        "checkout",
        "Placed order",
        &[
            ("order_id", order.id.to_string()),
            ("total", order.total.to_string()),
        ],
    );
    tracing::info!(order_id = %order.id, total = %order.total, items = order.item_count, "order placed");

    Ok((
        AppendHeaders([("HX-Trigger", ListKind::Cart.updated_event())]),
        Json(order),
    )
        .into_response())
}
