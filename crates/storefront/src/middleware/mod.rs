//! HTTP middleware stack for the storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. `TraceLayer` (request span)
//! 3. Request ID (recorded on the span and the Sentry scope)
//! 4. Session layer (tower-sessions with `PostgreSQL` store)
//!
//! Identity and role checks are extractors in [`auth`], not layers.

pub mod auth;
pub mod request_id;
pub mod session;

pub use auth::{
    AdminAccess, AuthRejection, OptionalAuth, RequireAuth, RequireRole, RoleRequirement,
    SellerAccess, clear_current_user, set_current_user,
};
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
pub use session::{SESSION_COOKIE_NAME, create_session_layer};
