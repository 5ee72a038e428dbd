//! Persistence mode selection.
//!
//! A basket is either backed by the user's rows in Postgres or by the
//! anonymous visitor's session record. Which one is decided solely by
//! whether a user is signed in.

use serde::Serialize;

use bazaar_core::UserId;

use crate::models::{CurrentUser, session_keys};

/// Which list a basket holds. Both kinds share every operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ListKind {
    Cart,
    Wishlist,
}

impl ListKind {
    /// Table holding signed-in users' lines.
    #[must_use]
    pub const fn table(self) -> &'static str {
        match self {
            Self::Cart => "storefront.cart_item",
            Self::Wishlist => "storefront.wishlist_item",
        }
    }

    /// Session key holding anonymous lines.
    #[must_use]
    pub const fn session_key(self) -> &'static str {
        match self {
            Self::Cart => session_keys::CART_LINES,
            Self::Wishlist => session_keys::WISHLIST_LINES,
        }
    }

    /// Lowercase name, also the route prefix.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cart => "cart",
            Self::Wishlist => "wishlist",
        }
    }

    /// HTMX event fired after a mutation.
    #[must_use]
    pub const fn updated_event(self) -> &'static str {
        match self {
            Self::Cart => "cart-updated",
            Self::Wishlist => "wishlist-updated",
        }
    }
}

impl std::fmt::Display for ListKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An authentication change observed for the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionChange {
    SignedIn(UserId),
    SignedOut,
}

/// Where a basket's lines live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", content = "user_id", rename_all = "snake_case")]
pub enum Mode {
    /// Rows in Postgres owned by this user.
    Remote(UserId),
    /// JSON in the anonymous session record.
    Local,
}

impl Mode {
    /// Mode for a session's current identity.
    #[must_use]
    pub fn for_session(user: Option<&CurrentUser>) -> Self {
        user.map_or(Self::Local, |user| Self::Remote(user.id))
    }

    /// Next mode after a session change. The previous mode plays no part:
    /// a sign-in never blends the anonymous list into the user's list.
    #[must_use]
    pub const fn transition(self, change: SessionChange) -> Self {
        match change {
            SessionChange::SignedIn(user_id) => Self::Remote(user_id),
            SessionChange::SignedOut => Self::Local,
        }
    }

    /// The owning user, if remote.
    #[must_use]
    pub const fn user_id(self) -> Option<UserId> {
        match self {
            Self::Remote(user_id) => Some(user_id),
            Self::Local => None,
        }
    }
}
