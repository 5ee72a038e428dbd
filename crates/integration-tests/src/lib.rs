//! Integration tests for the Bazaar storefront basket.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p bazaar-integration-tests
//! ```
//!
//! The tests drive [`Basket`] through its public API. Signed-in storage is
//! an in-memory [`RemoteLines`]; anonymous storage is the real
//! [`SessionLines`] over a `tower-sessions` memory store, so what is checked
//! here is what the server persists for anonymous visitors.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use rust_decimal::Decimal;
use tower_sessions::{MemoryStore, Session};

use bazaar_core::{LineId, ProductId, UserId};
use bazaar_storefront::basket::{
    Basket, Catalog, ListKind, Mode, RemoteLines, SessionLines,
};
use bazaar_storefront::db::RepositoryError;
use bazaar_storefront::models::{LineItem, ProductSnapshot};

/// Product A: 500.00, no discount, plenty of stock.
pub const LAMP: ProductId = ProductId::new(1);
/// Product B: 200.00 discounted to 150.00.
pub const RUG: ProductId = ProductId::new(2);
/// Product C: 80.00.
pub const VASE: ProductId = ProductId::new(3);

/// A signed-in shopper.
pub const SHOPPER: UserId = UserId::new(42);

/// Basket type used throughout the tests.
pub type TestBasket = Basket<SharedRemote, SessionLines, FixedCatalog>;

/// Per-user line rows shared between baskets, like a database would be.
#[derive(Clone, Default)]
pub struct SharedRemote {
    rows: Arc<Mutex<HashMap<UserId, Vec<LineItem>>>>,
    offline: Arc<AtomicBool>,
}

impl SharedRemote {
    fn rows(&self) -> MutexGuard<'_, HashMap<UserId, Vec<LineItem>>> {
        self.rows.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make every call fail until switched back.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Rows stored for `user_id`.
    #[must_use]
    pub fn stored(&self, user_id: UserId) -> Vec<LineItem> {
        self.rows().get(&user_id).cloned().unwrap_or_default()
    }

    fn reachable(&self) -> Result<(), RepositoryError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(RepositoryError::Conflict("database unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteLines for SharedRemote {
    async fn list(&self, user_id: UserId) -> Result<Vec<LineItem>, RepositoryError> {
        self.reachable()?;
        Ok(self.stored(user_id))
    }

    async fn insert(&self, user_id: UserId, line: &LineItem) -> Result<(), RepositoryError> {
        self.reachable()?;
        self.rows().entry(user_id).or_default().push(line.clone());
        Ok(())
    }

    async fn update_quantity(
        &self,
        user_id: UserId,
        line_id: LineId,
        quantity: u32,
    ) -> Result<(), RepositoryError> {
        self.reachable()?;
        let mut rows = self.rows();
        let line = rows
            .get_mut(&user_id)
            .and_then(|lines| lines.iter_mut().find(|l| l.id == line_id))
            .ok_or(RepositoryError::NotFound)?;
        line.quantity = quantity;
        Ok(())
    }

    async fn delete(&self, user_id: UserId, line_id: LineId) -> Result<(), RepositoryError> {
        self.reachable()?;
        let mut rows = self.rows();
        let lines = rows.get_mut(&user_id).ok_or(RepositoryError::NotFound)?;
        let before = lines.len();
        lines.retain(|l| l.id != line_id);
        if lines.len() == before {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn clear(&self, user_id: UserId) -> Result<(), RepositoryError> {
        self.reachable()?;
        self.rows().remove(&user_id);
        Ok(())
    }
}

/// Catalog of the three fixture products.
#[derive(Clone)]
pub struct FixedCatalog {
    products: HashMap<ProductId, ProductSnapshot>,
}

impl Default for FixedCatalog {
    fn default() -> Self {
        let products = [
            product(LAMP, "Arc Lamp", 50_000, None),
            product(RUG, "Wool Rug", 20_000, Some(15_000)),
            product(VASE, "Glass Vase", 8_000, None),
        ];
        Self {
            products: products.into_iter().map(|p| (p.id, p)).collect(),
        }
    }
}

#[async_trait]
impl Catalog for FixedCatalog {
    async fn snapshot(
        &self,
        product_id: ProductId,
    ) -> Result<Option<ProductSnapshot>, RepositoryError> {
        Ok(self.products.get(&product_id).cloned())
    }
}

fn product(id: ProductId, name: &str, cents: i64, discount: Option<i64>) -> ProductSnapshot {
    ProductSnapshot {
        id,
        name: name.to_string(),
        slug: name.to_lowercase().replace(' ', "-"),
        price: Decimal::new(cents, 2),
        discount_price: discount.map(|d| Decimal::new(d, 2)),
        images: Vec::new(),
        stock_quantity: 100,
    }
}

/// A fresh session, as a first-time visitor would get.
#[must_use]
pub fn new_session() -> Session {
    Session::new(None, Arc::new(MemoryStore::default()), None)
}

/// Open a basket the way a request handler does.
///
/// # Panics
///
/// Panics if the remote store is offline for a signed-in basket.
#[allow(clippy::expect_used)]
pub async fn open(
    kind: ListKind,
    mode: Mode,
    remote: &SharedRemote,
    session: &Session,
) -> TestBasket {
    Basket::open(
        kind,
        mode,
        remote.clone(),
        SessionLines::new(session.clone(), kind),
        FixedCatalog::default(),
    )
    .await
    .expect("basket opens")
}

/// Units of money, for readable assertions.
#[must_use]
pub fn dollars(amount: i64) -> Decimal {
    Decimal::new(amount, 0)
}
