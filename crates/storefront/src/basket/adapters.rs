//! Storage seams used by [`Basket`](super::Basket).
//!
//! Postgres implementations live in [`crate::db`]; the session-backed
//! local store lives here because it is nothing more than a key in the
//! visitor's session.

use async_trait::async_trait;
use thiserror::Error;
use tower_sessions::Session;

use bazaar_core::{LineId, ProductId, UserId};

use super::ListKind;
use crate::db::RepositoryError;
use crate::models::{LineItem, ProductSnapshot};

/// Per-user line rows in the database.
#[async_trait]
pub trait RemoteLines: Send + Sync {
    /// All of the user's lines, oldest first, with current catalog fields.
    async fn list(&self, user_id: UserId) -> Result<Vec<LineItem>, RepositoryError>;

    /// Insert a new line.
    async fn insert(&self, user_id: UserId, line: &LineItem) -> Result<(), RepositoryError>;

    /// Overwrite a line's quantity. `NotFound` if the user has no such line.
    async fn update_quantity(
        &self,
        user_id: UserId,
        line_id: LineId,
        quantity: u32,
    ) -> Result<(), RepositoryError>;

    /// Delete one line. `NotFound` if the user has no such line.
    async fn delete(&self, user_id: UserId, line_id: LineId) -> Result<(), RepositoryError>;

    /// Delete all of the user's lines.
    async fn clear(&self, user_id: UserId) -> Result<(), RepositoryError>;
}

/// Whole-list storage for anonymous visitors.
#[async_trait]
pub trait LocalLines: Send + Sync {
    /// The stored list, empty if nothing was stored yet.
    async fn load(&self) -> Result<Vec<LineItem>, LocalStoreError>;

    /// Replace the stored list.
    async fn save(&self, lines: &[LineItem]) -> Result<(), LocalStoreError>;
}

/// Product lookups at add time.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Snapshot of an active product, `None` if missing or inactive.
    async fn snapshot(&self, product_id: ProductId)
    -> Result<Option<ProductSnapshot>, RepositoryError>;
}

/// Failure reading or writing the anonymous list.
#[derive(Debug, Error)]
pub enum LocalStoreError {
    #[error("session storage error: {0}")]
    Session(#[from] tower_sessions::session::Error),
}

/// [`LocalLines`] stored as one JSON array under a fixed session key.
#[derive(Debug, Clone)]
pub struct SessionLines {
    session: Session,
    key: &'static str,
}

impl SessionLines {
    /// Local storage for `kind` in this session.
    #[must_use]
    pub const fn new(session: Session, kind: ListKind) -> Self {
        Self {
            session,
            key: kind.session_key(),
        }
    }
}

#[async_trait]
impl LocalLines for SessionLines {
    async fn load(&self) -> Result<Vec<LineItem>, LocalStoreError> {
        Ok(self
            .session
            .get::<Vec<LineItem>>(self.key)
            .await?
            .unwrap_or_default())
    }

    async fn save(&self, lines: &[LineItem]) -> Result<(), LocalStoreError> {
        self.session.insert(self.key, lines).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use rust_decimal::Decimal;
    use tower_sessions::MemoryStore;

    use super::*;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    fn line() -> LineItem {
        LineItem {
            id: LineId::generate(),
            product_id: ProductId::new(4),
            quantity: 2,
            size: None,
            color: Some("Teal".to_string()),
            product: ProductSnapshot {
                id: ProductId::new(4),
                name: "Mug".to_string(),
                slug: "mug".to_string(),
                price: Decimal::new(1200, 2),
                discount_price: None,
                images: vec!["/img/mug.jpg".to_string()],
                stock_quantity: 5,
            },
        }
    }

    #[tokio::test]
    async fn test_load_empty_session() {
        let store = SessionLines::new(session(), ListKind::Cart);
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_overwrites_whole_list() {
        let store = SessionLines::new(session(), ListKind::Cart);
        store.save(&[line(), line()]).await.unwrap();
        let only = line();
        store.save(std::slice::from_ref(&only)).await.unwrap();

        assert_eq!(store.load().await.unwrap(), vec![only]);
    }

    #[tokio::test]
    async fn test_kinds_use_separate_keys() {
        let session = session();
        let cart = SessionLines::new(session.clone(), ListKind::Cart);
        let wishlist = SessionLines::new(session, ListKind::Wishlist);

        cart.save(&[line()]).await.unwrap();

        assert_eq!(cart.load().await.unwrap().len(), 1);
        assert!(wishlist.load().await.unwrap().is_empty());
    }
}
