//! User roles for role-based route guarding.

use serde::{Deserialize, Serialize};

/// Error returned when a role string is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid user role: {0}")]
pub struct RoleParseError(pub String);

/// Role of a signed-in user.
///
/// Stored as the `storefront.user_role` Postgres enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "storefront.user_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Shops the storefront.
    #[default]
    Customer,
    /// Lists products and sees their own inventory.
    Seller,
    /// Full access, including every seller's inventory and all orders.
    Admin,
}

impl UserRole {
    /// Whether this role may use the seller dashboard.
    #[must_use]
    pub const fn can_sell(self) -> bool {
        matches!(self, Self::Seller | Self::Admin)
    }

    /// Whether this role may use the admin dashboard.
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Customer => write!(f, "customer"),
            Self::Seller => write!(f, "seller"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Self::Customer),
            "seller" => Ok(Self::Seller),
            "admin" => Ok(Self::Admin),
            _ => Err(RoleParseError(s.to_owned())),
        }
    }
}
