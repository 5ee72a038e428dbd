//! Order types produced by checkout.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use bazaar_core::{OrderId, UserId};

/// Order lifecycle status (`storefront.order_status`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "storefront.order_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Paid,
    Shipped,
    Cancelled,
}

impl OrderStatus {
    /// Lowercase label, as stored.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Shipped => "shipped",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Result of a successful checkout.
#[derive(Debug, Clone, Serialize)]
pub struct PlacedOrder {
    pub id: OrderId,
    pub total: Decimal,
    pub item_count: u32,
    pub status: OrderStatus,
}

/// Order row for the admin dashboard.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderSummary {
    pub id: OrderId,
    pub user_id: UserId,
    pub email: String,
    pub total: Decimal,
    pub status: OrderStatus,
    pub item_count: i64,
    pub created_at: DateTime<Utc>,
}
