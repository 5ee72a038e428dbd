//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.

use axum::{
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::basket::BasketError;
use crate::db::{CheckoutError, RepositoryError};

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Cart or wishlist operation failed.
    #[error("Basket error: {0}")]
    Basket(#[from] BasketError),

    /// Order placement failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Session store read or write failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Database(err)
            | Self::Basket(BasketError::Remote(err))
            | Self::Checkout(CheckoutError::Repository(err)) => repository_status(err),
            Self::Basket(BasketError::ProductNotFound(_) | BasketError::LineNotFound(_))
            | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Basket(BasketError::InvalidQuantity)
            | Self::Checkout(CheckoutError::EmptyCart)
            | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Checkout(
                CheckoutError::Unavailable(_) | CheckoutError::InsufficientStock { .. },
            ) => StatusCode::CONFLICT,
            Self::Session(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    // Don't expose internal error details to clients
    fn public_message(&self, status: StatusCode) -> String {
        if status.is_server_error() {
            return "Internal server error".to_string();
        }
        match self {
            Self::Database(err)
            | Self::Basket(BasketError::Remote(err))
            | Self::Checkout(CheckoutError::Repository(err)) => match err {
                RepositoryError::NotFound => "Not found".to_string(),
                other => other.to_string(),
            },
            Self::Basket(err) => err.to_string(),
            Self::Checkout(err) => err.to_string(),
            Self::NotFound(msg) | Self::BadRequest(msg) => msg.clone(),
            Self::Session(_) => "Internal server error".to_string(),
        }
    }
}

const fn repository_status(err: &RepositoryError) -> StatusCode {
    match err {
        RepositoryError::NotFound => StatusCode::NOT_FOUND,
        RepositoryError::Conflict(_) => StatusCode::CONFLICT,
        RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, status = %status, "Request rejected");
        }

        let message = self.public_message(status);

        // HTMX swaps nothing on error responses; the toast tells the user why.
        let toast = serde_json::json!({
            "showToast": { "message": message, "level": "error" }
        });

        let mut response = (status, message).into_response();
        if let Ok(value) = HeaderValue::from_str(&toast.to_string()) {
            response.headers_mut().insert("HX-Trigger", value);
        }
        response
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for basket and checkout actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: &[(&str, String)]) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    for (key, value) in data {
        breadcrumb
            .data
            .insert((*key).to_string(), serde_json::Value::String(value.clone()));
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bazaar_core::{LineId, ProductId};

    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product-123".to_string());
        assert_eq!(err.to_string(), "Not found: product-123");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(RepositoryError::Conflict("email taken".to_string()).into()),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_basket_error_status_codes() {
        assert_eq!(
            get_status(BasketError::ProductNotFound(ProductId::new(9)).into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(BasketError::LineNotFound(LineId::generate()).into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(BasketError::InvalidQuantity.into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(BasketError::Remote(RepositoryError::NotFound).into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(
                BasketError::Remote(RepositoryError::DataCorruption("bad".to_string())).into()
            ),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_checkout_error_status_codes() {
        assert_eq!(
            get_status(CheckoutError::EmptyCart.into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(
                CheckoutError::InsufficientStock {
                    name: "Lamp".to_string(),
                    available: 1,
                }
                .into()
            ),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(CheckoutError::Unavailable(ProductId::new(3)).into()),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_error_response_carries_toast_trigger() {
        let response = AppError::BadRequest("only 2 left".to_string()).into_response();
        let trigger = response.headers().get("HX-Trigger").unwrap();
        let parsed: serde_json::Value = serde_json::from_str(trigger.to_str().unwrap()).unwrap();
        assert_eq!(parsed["showToast"]["message"], "only 2 left");
    }

    #[test]
    fn test_server_error_hides_details() {
        let err = AppError::Database(RepositoryError::DataCorruption(
            "connection string leaked".to_string(),
        ));
        assert_eq!(
            err.public_message(StatusCode::INTERNAL_SERVER_ERROR),
            "Internal server error"
        );
    }
}
