//! Cart and wishlist line rows for signed-in users.
//!
//! Both lists share one shape; [`ListKind`] picks the table. Every
//! statement is scoped by `user_id`.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;

use bazaar_core::{LineId, ProductId, UserId};

use super::{RepositoryError, quantity_from_db, quantity_to_db};
use crate::basket::{ListKind, RemoteLines};
use crate::models::{LineItem, ProductSnapshot};

/// Line joined with the catalog fields shown alongside it.
#[derive(sqlx::FromRow)]
struct LineRow {
    id: LineId,
    product_id: ProductId,
    quantity: i32,
    size: Option<String>,
    color: Option<String>,
    name: String,
    slug: String,
    price: Decimal,
    discount_price: Option<Decimal>,
    images: Vec<String>,
    stock_quantity: i32,
}

impl TryFrom<LineRow> for LineItem {
    type Error = RepositoryError;

    fn try_from(row: LineRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            product_id: row.product_id,
            quantity: quantity_from_db(row.quantity)?,
            size: row.size,
            color: row.color,
            product: ProductSnapshot {
                id: row.product_id,
                name: row.name,
                slug: row.slug,
                price: row.price,
                discount_price: row.discount_price,
                images: row.images,
                stock_quantity: row.stock_quantity,
            },
        })
    }
}

/// Repository for one list kind's line rows.
pub struct LineRepository<'a> {
    pool: &'a PgPool,
    kind: ListKind,
}

impl<'a> LineRepository<'a> {
    /// Create a new line repository for `kind`.
    #[must_use]
    pub const fn new(pool: &'a PgPool, kind: ListKind) -> Self {
        Self { pool, kind }
    }

    fn table(&self) -> &'static str {
        self.kind.table()
    }
}

#[async_trait]
impl RemoteLines for LineRepository<'_> {
    async fn list(&self, user_id: UserId) -> Result<Vec<LineItem>, RepositoryError> {
        let sql = format!(
            r"
            SELECT l.id, l.product_id, l.quantity, l.size, l.color,
                   p.name, p.slug, p.price, p.discount_price, p.images, p.stock_quantity
            FROM {} l
            JOIN storefront.product p ON p.id = l.product_id
            WHERE l.user_id = $1
            ORDER BY l.created_at, l.id
            ",
            self.table()
        );

        let rows = sqlx::query_as::<_, LineRow>(&sql)
            .bind(user_id)
            .fetch_all(self.pool)
            .await?;

        rows.into_iter().map(LineItem::try_from).collect()
    }

    async fn insert(&self, user_id: UserId, line: &LineItem) -> Result<(), RepositoryError> {
        let sql = format!(
            r"
            INSERT INTO {} (id, user_id, product_id, quantity, size, color)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
            self.table()
        );

        sqlx::query(&sql)
            .bind(line.id)
            .bind(user_id)
            .bind(line.product_id)
            .bind(quantity_to_db(line.quantity)?)
            .bind(line.size.as_deref())
            .bind(line.color.as_deref())
            .execute(self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.is_foreign_key_violation()
                {
                    return RepositoryError::Conflict(format!(
                        "product {} no longer exists",
                        line.product_id
                    ));
                }
                RepositoryError::Database(e)
            })?;

        Ok(())
    }

    async fn update_quantity(
        &self,
        user_id: UserId,
        line_id: LineId,
        quantity: u32,
    ) -> Result<(), RepositoryError> {
        let sql = format!(
            r"
            UPDATE {}
            SET quantity = $3, updated_at = now()
            WHERE id = $1 AND user_id = $2
            ",
            self.table()
        );

        let result = sqlx::query(&sql)
            .bind(line_id)
            .bind(user_id)
            .bind(quantity_to_db(quantity)?)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn delete(&self, user_id: UserId, line_id: LineId) -> Result<(), RepositoryError> {
        let sql = format!("DELETE FROM {} WHERE id = $1 AND user_id = $2", self.table());

        let result = sqlx::query(&sql)
            .bind(line_id)
            .bind(user_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn clear(&self, user_id: UserId) -> Result<(), RepositoryError> {
        let sql = format!("DELETE FROM {} WHERE user_id = $1", self.table());

        let result = sqlx::query(&sql).bind(user_id).execute(self.pool).await?;

        tracing::debug!(
            kind = %self.kind,
            user_id = %user_id,
            deleted = result.rows_affected(),
            "cleared basket rows"
        );
        Ok(())
    }
}

// Run with a disposable database:
// DATABASE_URL=postgres://... cargo test -p bazaar-storefront -- --ignored
#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::{MemoryStore, Session};

    use super::*;
    use crate::basket::{Basket, Mode, SessionLines};
    use crate::db::ProductRepository;

    async fn user(pool: &PgPool, email: &str) -> UserId {
        sqlx::query_scalar(
            "INSERT INTO storefront.user (email, name, role) VALUES ($1, 'Kim', 'customer') RETURNING id",
        )
        .bind(email)
        .fetch_one(pool)
        .await
        .unwrap()
    }

    async fn product(pool: &PgPool, seller: UserId, slug: &str) -> ProductId {
        sqlx::query_scalar(
            r"
            INSERT INTO storefront.product (seller_id, name, slug, price, discount_price, stock_quantity)
            VALUES ($1, 'Brass Lamp', $2, 500, 450, 4)
            RETURNING id
            ",
        )
        .bind(seller)
        .bind(slug)
        .fetch_one(pool)
        .await
        .unwrap()
    }

    fn line(product_id: ProductId, quantity: u32) -> LineItem {
        LineItem {
            id: LineId::generate(),
            product_id,
            quantity,
            size: Some("M".to_string()),
            color: None,
            product: ProductSnapshot {
                id: product_id,
                name: "stale name".to_string(),
                slug: "stale".to_string(),
                price: Decimal::ZERO,
                discount_price: None,
                images: Vec::new(),
                stock_quantity: 0,
            },
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs DATABASE_URL pointing at Postgres"]
    async fn test_line_rows_round_trip_with_current_catalog(pool: PgPool) {
        let kim = user(&pool, "kim@example.com").await;
        let lamp = product(&pool, kim, "brass-lamp").await;
        let repo = LineRepository::new(&pool, ListKind::Cart);
        let added = line(lamp, 2);

        repo.insert(kim, &added).await.unwrap();
        repo.update_quantity(kim, added.id, 3).await.unwrap();

        let lines = repo.list(kim).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].id, added.id);
        assert_eq!(lines[0].quantity, 3);
        assert_eq!(lines[0].size.as_deref(), Some("M"));
        assert_eq!(lines[0].product.name, "Brass Lamp");
        assert_eq!(lines[0].product.unit_price(), Decimal::new(450, 0));

        repo.delete(kim, added.id).await.unwrap();
        assert!(matches!(
            repo.delete(kim, added.id).await,
            Err(RepositoryError::NotFound)
        ));
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs DATABASE_URL pointing at Postgres"]
    async fn test_rows_are_scoped_by_user_and_kind(pool: PgPool) {
        let kim = user(&pool, "kim@example.com").await;
        let lee = user(&pool, "lee@example.com").await;
        let lamp = product(&pool, kim, "brass-lamp").await;
        let cart = LineRepository::new(&pool, ListKind::Cart);
        let wishlist = LineRepository::new(&pool, ListKind::Wishlist);
        let kims = line(lamp, 1);

        cart.insert(kim, &kims).await.unwrap();

        assert!(wishlist.list(kim).await.unwrap().is_empty());
        assert!(cart.list(lee).await.unwrap().is_empty());
        assert!(matches!(
            cart.update_quantity(lee, kims.id, 5).await,
            Err(RepositoryError::NotFound)
        ));
        cart.clear(lee).await.unwrap();
        assert_eq!(cart.list(kim).await.unwrap().len(), 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs DATABASE_URL pointing at Postgres"]
    async fn test_insert_for_missing_product_is_conflict(pool: PgPool) {
        let kim = user(&pool, "kim@example.com").await;
        let repo = LineRepository::new(&pool, ListKind::Wishlist);

        assert!(matches!(
            repo.insert(kim, &line(ProductId::new(9999), 1)).await,
            Err(RepositoryError::Conflict(_))
        ));
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs DATABASE_URL pointing at Postgres"]
    async fn test_remote_basket_clear_then_count_is_zero(pool: PgPool) {
        let kim = user(&pool, "kim@example.com").await;
        let lamp = product(&pool, kim, "brass-lamp").await;
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        let open = || {
            Basket::open(
                ListKind::Cart,
                Mode::Remote(kim),
                LineRepository::new(&pool, ListKind::Cart),
                SessionLines::new(session.clone(), ListKind::Cart),
                ProductRepository::new(&pool),
            )
        };

        let mut basket = open().await.unwrap();
        basket.add(lamp, 2, None, None).await.unwrap();
        basket.add(lamp, 1, None, None).await.unwrap();
        assert_eq!(open().await.unwrap().count(), 3);

        basket.clear().await.unwrap();

        assert_eq!(basket.count(), 0);
        assert_eq!(open().await.unwrap().count(), 0);
    }
}
