//! JSON API route handlers.

use axum::{Extension, Json, extract::State};
use tower_sessions::Session;
use tracing::instrument;

use crate::basket::{BasketView, ListKind};
use crate::error::Result;
use crate::middleware::OptionalAuth;
use crate::state::AppState;

/// Get a basket as JSON.
///
/// Works for anonymous visitors and signed-in users alike; the response
/// shape does not depend on where the lines are stored.
#[instrument(skip(state, session, user), fields(kind = %kind))]
pub async fn basket(
    State(state): State<AppState>,
    Extension(kind): Extension<ListKind>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> Result<Json<BasketView>> {
    let basket = state.basket(kind, &session, user.as_ref()).await?;
    Ok(Json(basket.view()))
}
