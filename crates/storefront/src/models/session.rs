//! Session-related types.
//!
//! Types stored in the session for identity and anonymous baskets.

use serde::{Deserialize, Serialize};

use bazaar_core::{Email, UserId, UserRole};

/// Session-stored user identity.
///
/// Written on password sign-in and removed on logout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's database ID.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
    /// Display name.
    pub name: String,
    /// Role used for route guarding.
    pub role: UserRole,
}

/// Session keys.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the anonymous visitor's cart lines.
    pub const CART_LINES: &str = "cart_lines";

    /// Key for the anonymous visitor's wishlist lines.
    pub const WISHLIST_LINES: &str = "wishlist_lines";
}
