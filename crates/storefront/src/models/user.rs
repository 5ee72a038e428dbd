//! User domain types.

use chrono::{DateTime, Utc};

use bazaar_core::{Email, UserId, UserRole};

/// A storefront account.
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
    /// Display name.
    pub name: String,
    /// Customer, seller or admin.
    pub role: UserRole,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
}
