//! Sign-in and sign-out route handlers.
//!
//! Signing in checks a password against the user table and stores the
//! identity with [`set_current_user`]. Both directions cycle the session
//! ID; the basket follows because every request opens it in the mode the
//! session identity selects.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use bazaar_core::UserRole;

use crate::basket::{ListKind, SessionChange};
use crate::error::Result;
use crate::middleware::{OptionalAuth, clear_current_user, set_current_user};
use crate::routes::basket::BadgeTemplate;
use crate::services::{AuthError, AuthService};
use crate::state::AppState;

/// Query parameters for the login page.
#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub error: Option<String>,
}

/// Login form data.
#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub error: Option<&'static str>,
}

fn error_message(code: &str) -> &'static str {
    match code {
        "credentials" => "That email and password do not match.",
        "session" => "We could not start your session. Please try again.",
        _ => "Sign-in is unavailable right now. Please try again later.",
    }
}

const fn landing_page(role: UserRole) -> &'static str {
    match role {
        UserRole::Admin => "/admin/orders",
        UserRole::Seller => "/seller/products",
        UserRole::Customer => "/products",
    }
}

/// Display the login page.
pub async fn login_page(Query(query): Query<LoginQuery>) -> LoginTemplate {
    LoginTemplate {
        error: query.error.as_deref().map(error_message),
    }
}

/// Handle login form submission.
///
/// On success the visitor lands on the page for their role. The anonymous
/// basket stays in the session for after sign-out.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    let user = match AuthService::new(state.pool())
        .login(&form.email, &form.password)
        .await
    {
        Ok(user) => user,
        Err(AuthError::InvalidCredentials) => {
            tracing::info!("sign-in rejected");
            return Redirect::to("/auth/login?error=credentials").into_response();
        }
        Err(e) => {
            tracing::error!(error = %e, "sign-in failed");
            return Redirect::to("/auth/login?error=unavailable").into_response();
        }
    };

    if let Err(e) = set_current_user(&session, &user).await {
        tracing::error!(error = %e, "failed to store signed-in user");
        return Redirect::to("/auth/login?error=session").into_response();
    }

    tracing::info!(user_id = %user.id, role = %user.role, "signed in");
    Redirect::to(landing_page(user.role)).into_response()
}

/// Sign out (HTMX).
///
/// The session record is kept: anything the visitor put in their cart
/// before signing in is still stored there and becomes the active cart
/// again. Returns the cart badge for the anonymous cart.
#[instrument(skip(state, session, user))]
pub async fn logout(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> Result<Response> {
    let mut cart = state
        .basket(ListKind::Cart, &session, user.as_ref())
        .await?;

    if let Some(user) = &user {
        clear_current_user(&session).await?;
        tracing::info!(user_id = %user.id, "signed out");
    }

    cart.on_session_change(SessionChange::SignedOut).await?;

    Ok((
        AppendHeaders([(
            "HX-Trigger",
            format!(
                "{}, {}",
                ListKind::Cart.updated_event(),
                ListKind::Wishlist.updated_event()
            ),
        )]),
        BadgeTemplate {
            kind: ListKind::Cart.as_str(),
            count: cart.count(),
        },
    )
        .into_response())
}
