//! Product repository: catalog pages, snapshots, seller inventory and seeding.

use async_trait::async_trait;
use sqlx::PgPool;

use bazaar_core::{ProductId, UserId};

use super::RepositoryError;
use crate::basket::Catalog;
use crate::models::{NewProduct, ProductSnapshot, SellerProduct};

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the snapshot of an active product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_snapshot(
        &self,
        id: ProductId,
    ) -> Result<Option<ProductSnapshot>, RepositoryError> {
        let snapshot = sqlx::query_as::<_, ProductSnapshot>(
            r"
            SELECT id, name, slug, price, discount_price, images, stock_quantity
            FROM storefront.product
            WHERE id = $1 AND is_active
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(snapshot)
    }

    /// Get an active product by its URL slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<ProductSnapshot>, RepositoryError> {
        let snapshot = sqlx::query_as::<_, ProductSnapshot>(
            r"
            SELECT id, name, slug, price, discount_price, images, stock_quantity
            FROM storefront.product
            WHERE slug = $1 AND is_active
            ",
        )
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;

        Ok(snapshot)
    }

    /// One page of the public catalog, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_active(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ProductSnapshot>, RepositoryError> {
        let products = sqlx::query_as::<_, ProductSnapshot>(
            r"
            SELECT id, name, slug, price, discount_price, images, stock_quantity
            FROM storefront.product
            WHERE is_active
            ORDER BY created_at DESC, id DESC
            LIMIT $1 OFFSET $2
            ",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;

        Ok(products)
    }

    /// List products for the seller dashboard.
    ///
    /// `None` lists every seller's products (admin view).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_seller(
        &self,
        seller_id: Option<UserId>,
    ) -> Result<Vec<SellerProduct>, RepositoryError> {
        let products = sqlx::query_as::<_, SellerProduct>(
            r"
            SELECT id, seller_id, name, slug, price, discount_price, stock_quantity, is_active
            FROM storefront.product
            WHERE $1::INT IS NULL OR seller_id = $1
            ORDER BY stock_quantity ASC, name
            ",
        )
        .bind(seller_id)
        .fetch_all(self.pool)
        .await?;

        Ok(products)
    }

    /// Insert a product, or update it if the slug already exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the seller email has no account.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn upsert(&self, product: &NewProduct) -> Result<ProductId, RepositoryError> {
        let id: Option<ProductId> = sqlx::query_scalar(
            r"
            INSERT INTO storefront.product
                (seller_id, name, slug, price, discount_price, images, stock_quantity)
            SELECT u.id, $2, $3, $4, $5, $6, $7
            FROM storefront.user u
            WHERE u.email = $1
            ON CONFLICT (slug) DO UPDATE
            SET name = EXCLUDED.name,
                price = EXCLUDED.price,
                discount_price = EXCLUDED.discount_price,
                images = EXCLUDED.images,
                stock_quantity = EXCLUDED.stock_quantity,
                updated_at = now()
            RETURNING id
            ",
        )
        .bind(&product.seller_email)
        .bind(&product.name)
        .bind(&product.slug)
        .bind(product.price)
        .bind(product.discount_price)
        .bind(&product.images)
        .bind(product.stock_quantity)
        .fetch_optional(self.pool)
        .await?;

        id.ok_or(RepositoryError::NotFound)
    }
}

#[async_trait]
impl Catalog for ProductRepository<'_> {
    async fn snapshot(
        &self,
        product_id: ProductId,
    ) -> Result<Option<ProductSnapshot>, RepositoryError> {
        self.get_snapshot(product_id).await
    }
}
