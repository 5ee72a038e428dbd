//! Authentication middleware and extractors.
//!
//! Identity lives in the session under [`session_keys::CURRENT_USER`]. The
//! extractors here read it; [`set_current_user`] and [`clear_current_user`]
//! are the only writers.

use std::marker::PhantomData;

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use bazaar_core::UserRole;

use crate::error::{clear_sentry_user, set_sentry_user};
use crate::models::{CurrentUser, session_keys};

/// Extractor that requires a signed-in user.
///
/// If nobody is signed in, HTML requests are redirected to the login page and
/// `/api/` requests get `401`.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(user): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.name)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

/// Error returned when a route guard rejects the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRejection {
    /// Redirect to login page (for HTML requests).
    RedirectToLogin,
    /// Unauthorized response (for API requests).
    Unauthorized,
    /// Signed in, but the role is not allowed here.
    Forbidden,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/auth/login").into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
            Self::Forbidden => StatusCode::FORBIDDEN.into_response(),
        }
    }
}

async fn session_user(parts: &Parts) -> Option<CurrentUser> {
    let session = parts.extensions.get::<Session>()?;
    match session.get::<CurrentUser>(session_keys::CURRENT_USER).await {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!(error = %e, "failed to read current user from session");
            None
        }
    }
}

fn missing_identity(parts: &Parts) -> AuthRejection {
    if parts.uri.path().starts_with("/api/") {
        AuthRejection::Unauthorized
    } else {
        AuthRejection::RedirectToLogin
    }
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        session_user(parts)
            .await
            .map(Self)
            .ok_or_else(|| missing_identity(parts))
    }
}

/// Extractor that optionally gets the current user.
///
/// Unlike `RequireAuth`, this does not reject the request if nobody is signed in.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(session_user(parts).await))
    }
}

/// A set of roles allowed through a [`RequireRole`] guard.
pub trait RoleRequirement {
    /// Whether `role` may pass.
    fn allows(role: UserRole) -> bool;
}

/// Sellers and admins.
pub struct SellerAccess;

impl RoleRequirement for SellerAccess {
    fn allows(role: UserRole) -> bool {
        role.can_sell()
    }
}

/// Admins only.
pub struct AdminAccess;

impl RoleRequirement for AdminAccess {
    fn allows(role: UserRole) -> bool {
        role.is_admin()
    }
}

/// Extractor that requires a signed-in user whose role satisfies `R`.
///
/// Missing identity is rejected like [`RequireAuth`]; a signed-in user with
/// the wrong role gets `403`.
pub struct RequireRole<R>(pub CurrentUser, PhantomData<R>);

impl<R> RequireRole<R> {
    /// The authorized user.
    #[must_use]
    pub fn into_user(self) -> CurrentUser {
        self.0
    }
}

impl<S, R> FromRequestParts<S> for RequireRole<R>
where
    S: Send + Sync,
    R: RoleRequirement,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = session_user(parts)
            .await
            .ok_or_else(|| missing_identity(parts))?;

        if !R::allows(user.role) {
            tracing::debug!(user_id = %user.id, role = %user.role, path = %parts.uri.path(), "role rejected");
            return Err(AuthRejection::Forbidden);
        }

        Ok(Self(user, PhantomData))
    }
}

/// Sign a user in on this session.
///
/// The session ID is cycled so a pre-login cookie cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    Ok(())
}

/// Sign the current user out of this session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentUser>(session_keys::CURRENT_USER)
        .await?;
    session.cycle_id().await?;
    clear_sentry_user();
    Ok(())
}
