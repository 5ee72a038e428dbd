//! Catalog product types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use bazaar_core::{ProductId, UserId};

/// Denormalized copy of the catalog fields a basket line needs.
///
/// Taken when a line is added. Lines kept in an anonymous session are not
/// refreshed afterwards, so their snapshot may lag behind the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProductSnapshot {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    pub price: Decimal,
    pub discount_price: Option<Decimal>,
    pub images: Vec<String>,
    pub stock_quantity: i32,
}

impl ProductSnapshot {
    /// The price a shopper pays per unit: the discount price when set.
    #[must_use]
    pub fn unit_price(&self) -> Decimal {
        self.discount_price.unwrap_or(self.price)
    }

    /// Units available, treating negative stock as none.
    #[must_use]
    pub fn available(&self) -> u32 {
        u32::try_from(self.stock_quantity).unwrap_or(0)
    }
}

/// A product row as shown on the seller dashboard.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SellerProduct {
    pub id: ProductId,
    pub seller_id: UserId,
    pub name: String,
    pub slug: String,
    pub price: Decimal,
    pub discount_price: Option<Decimal>,
    pub stock_quantity: i32,
    pub is_active: bool,
}

/// Catalog entry accepted by the seed command.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub seller_email: String,
    pub name: String,
    pub slug: String,
    pub price: Decimal,
    #[serde(default)]
    pub discount_price: Option<Decimal>,
    #[serde(default)]
    pub images: Vec<String>,
    pub stock_quantity: i32,
}
