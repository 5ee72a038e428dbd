//! Business logic that spans repositories.

pub mod auth;

pub use auth::{AuthError, AuthService};
