//! Order placement and order listings.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use sqlx::PgPool;
use thiserror::Error;

use bazaar_core::{OrderId, ProductId, UserId};

use super::{RepositoryError, quantity_to_db};
use crate::models::{LineItem, OrderStatus, OrderSummary, PlacedOrder};

/// Reasons checkout can fail.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Nothing to order.
    #[error("cart is empty")]
    EmptyCart,

    /// A product was removed or deactivated since it was added.
    #[error("product {0} is no longer available")]
    Unavailable(ProductId),

    /// Not enough stock left for the requested quantity.
    #[error("only {available} of {name} left in stock")]
    InsufficientStock {
        /// Product display name.
        name: String,
        /// Units in stock.
        available: i32,
    },

    /// Database failure.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for CheckoutError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(e))
    }
}

#[derive(sqlx::FromRow)]
struct LockedProduct {
    name: String,
    price: Decimal,
    discount_price: Option<Decimal>,
    stock_quantity: i32,
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Place an order for a signed-in user's cart lines.
    ///
    /// In one transaction: locks the products, checks and decrements stock,
    /// writes the order at current catalog prices, and deletes the user's
    /// cart rows.
    ///
    /// # Errors
    ///
    /// - `CheckoutError::EmptyCart` if `lines` is empty
    /// - `CheckoutError::Unavailable` / `InsufficientStock` on catalog changes
    /// - `CheckoutError::Repository` for database failures
    pub async fn place(
        &self,
        user_id: UserId,
        lines: &[LineItem],
    ) -> Result<PlacedOrder, CheckoutError> {
        if lines.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        // Lock rows in id order so concurrent checkouts cannot deadlock.
        let mut demand: BTreeMap<ProductId, u32> = BTreeMap::new();
        for line in lines {
            let entry = demand.entry(line.product_id).or_insert(0);
            *entry = entry.saturating_add(line.quantity);
        }

        let mut tx = self.pool.begin().await?;
        let mut unit_prices: BTreeMap<ProductId, Decimal> = BTreeMap::new();

        for (&product_id, &wanted) in &demand {
            let product = sqlx::query_as::<_, LockedProduct>(
                r"
                SELECT name, price, discount_price, stock_quantity
                FROM storefront.product
                WHERE id = $1 AND is_active
                FOR UPDATE
                ",
            )
            .bind(product_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(CheckoutError::Unavailable(product_id))?;

            let wanted_db = quantity_to_db(wanted)?;
            if product.stock_quantity < wanted_db {
                return Err(CheckoutError::InsufficientStock {
                    name: product.name,
                    available: product.stock_quantity,
                });
            }

            sqlx::query(
                r"
                UPDATE storefront.product
                SET stock_quantity = stock_quantity - $2, updated_at = now()
                WHERE id = $1
                ",
            )
            .bind(product_id)
            .bind(wanted_db)
            .execute(&mut *tx)
            .await?;

            unit_prices.insert(
                product_id,
                product.discount_price.unwrap_or(product.price),
            );
        }

        let total: Decimal = lines
            .iter()
            .map(|line| {
                unit_prices.get(&line.product_id).copied().unwrap_or_default()
                    * Decimal::from(line.quantity)
            })
            .sum();

        let order_id: OrderId = sqlx::query_scalar(
            r"
            INSERT INTO storefront.order (user_id, total, status)
            VALUES ($1, $2, $3)
            RETURNING id
            ",
        )
        .bind(user_id)
        .bind(total)
        .bind(OrderStatus::Pending)
        .fetch_one(&mut *tx)
        .await?;

        for line in lines {
            sqlx::query(
                r"
                INSERT INTO storefront.order_item
                    (order_id, product_id, product_name, unit_price, quantity, size, color)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                ",
            )
            .bind(order_id)
            .bind(line.product_id)
            .bind(&line.product.name)
            .bind(unit_prices.get(&line.product_id).copied().unwrap_or_default())
            .bind(quantity_to_db(line.quantity)?)
            .bind(line.size.as_deref())
            .bind(line.color.as_deref())
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("DELETE FROM storefront.cart_item WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(PlacedOrder {
            id: order_id,
            total,
            item_count: lines
                .iter()
                .fold(0, |count, line| count.saturating_add(line.quantity)),
            status: OrderStatus::Pending,
        })
    }

    /// Most recent orders across all users.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn recent(&self, limit: i64) -> Result<Vec<OrderSummary>, RepositoryError> {
        let orders = sqlx::query_as::<_, OrderSummary>(
            r"
            SELECT o.id, o.user_id, u.email, o.total, o.status,
                   COALESCE(SUM(i.quantity), 0)::BIGINT AS item_count,
                   o.created_at
            FROM storefront.order o
            JOIN storefront.user u ON u.id = o.user_id
            LEFT JOIN storefront.order_item i ON i.order_id = o.id
            GROUP BY o.id, u.email
            ORDER BY o.created_at DESC
            LIMIT $1
            ",
        )
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(orders)
    }
}
