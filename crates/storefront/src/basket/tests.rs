use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rust_decimal::Decimal;

use bazaar_core::UserId;

use super::*;
use crate::models::ProductSnapshot;

// =============================================================================
// In-memory adapters
// =============================================================================

#[derive(Clone, Default)]
struct MemoryRemote {
    rows: Arc<Mutex<HashMap<UserId, Vec<LineItem>>>>,
    fail: Arc<AtomicBool>,
}

impl MemoryRemote {
    fn rows_for(&self, user_id: UserId) -> Vec<LineItem> {
        self.rows
            .lock()
            .unwrap()
            .get(&user_id)
            .cloned()
            .unwrap_or_default()
    }

    fn check(&self) -> Result<(), RepositoryError> {
        if self.fail.load(Ordering::SeqCst) {
            Err(RepositoryError::DataCorruption("remote offline".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RemoteLines for MemoryRemote {
    async fn list(&self, user_id: UserId) -> Result<Vec<LineItem>, RepositoryError> {
        self.check()?;
        Ok(self.rows_for(user_id))
    }

    async fn insert(&self, user_id: UserId, line: &LineItem) -> Result<(), RepositoryError> {
        self.check()?;
        self.rows
            .lock()
            .unwrap()
            .entry(user_id)
            .or_default()
            .push(line.clone());
        Ok(())
    }

    async fn update_quantity(
        &self,
        user_id: UserId,
        line_id: LineId,
        quantity: u32,
    ) -> Result<(), RepositoryError> {
        self.check()?;
        let mut rows = self.rows.lock().unwrap();
        let line = rows
            .get_mut(&user_id)
            .and_then(|lines| lines.iter_mut().find(|l| l.id == line_id))
            .ok_or(RepositoryError::NotFound)?;
        line.quantity = quantity;
        Ok(())
    }

    async fn delete(&self, user_id: UserId, line_id: LineId) -> Result<(), RepositoryError> {
        self.check()?;
        let mut rows = self.rows.lock().unwrap();
        let lines = rows.get_mut(&user_id).ok_or(RepositoryError::NotFound)?;
        lines.retain(|l| l.id != line_id);
        Ok(())
    }

    async fn clear(&self, user_id: UserId) -> Result<(), RepositoryError> {
        self.check()?;
        self.rows.lock().unwrap().remove(&user_id);
        Ok(())
    }
}

#[derive(Clone, Default)]
struct MemoryLocal {
    stored: Arc<Mutex<Vec<LineItem>>>,
    fail: Arc<AtomicBool>,
}

impl MemoryLocal {
    fn stored(&self) -> Vec<LineItem> {
        self.stored.lock().unwrap().clone()
    }

    fn check(&self) -> Result<(), LocalStoreError> {
        if self.fail.load(Ordering::SeqCst) {
            Err(LocalStoreError::Session(
                tower_sessions::session::Error::Store(tower_sessions::session_store::Error::Backend(
                    "quota exceeded".to_string(),
                )),
            ))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl LocalLines for MemoryLocal {
    async fn load(&self) -> Result<Vec<LineItem>, LocalStoreError> {
        self.check()?;
        Ok(self.stored())
    }

    async fn save(&self, lines: &[LineItem]) -> Result<(), LocalStoreError> {
        self.check()?;
        *self.stored.lock().unwrap() = lines.to_vec();
        Ok(())
    }
}

#[derive(Clone, Default)]
struct MemoryCatalog {
    products: HashMap<ProductId, ProductSnapshot>,
}

impl MemoryCatalog {
    fn with(products: &[ProductSnapshot]) -> Self {
        Self {
            products: products.iter().map(|p| (p.id, p.clone())).collect(),
        }
    }
}

#[async_trait]
impl Catalog for MemoryCatalog {
    async fn snapshot(
        &self,
        product_id: ProductId,
    ) -> Result<Option<ProductSnapshot>, RepositoryError> {
        Ok(self.products.get(&product_id).cloned())
    }
}

// =============================================================================
// Fixtures
// =============================================================================

const ALICE: UserId = UserId::new(1);

fn product(id: i32, price: i64, discount: Option<i64>) -> ProductSnapshot {
    ProductSnapshot {
        id: ProductId::new(id),
        name: format!("Product {id}"),
        slug: format!("product-{id}"),
        price: Decimal::new(price, 0),
        discount_price: discount.map(|d| Decimal::new(d, 0)),
        images: vec![format!("/img/{id}.jpg")],
        stock_quantity: 50,
    }
}

fn catalog() -> MemoryCatalog {
    MemoryCatalog::with(&[
        product(1, 500, None),
        product(2, 200, Some(150)),
        product(3, 80, None),
    ])
}

type TestBasket = Basket<MemoryRemote, MemoryLocal, MemoryCatalog>;

async fn basket(mode: Mode) -> (TestBasket, MemoryRemote, MemoryLocal) {
    let remote = MemoryRemote::default();
    let local = MemoryLocal::default();
    let basket = Basket::open(
        ListKind::Cart,
        mode,
        remote.clone(),
        local.clone(),
        catalog(),
    )
    .await
    .unwrap();
    (basket, remote, local)
}

fn p(id: i32) -> ProductId {
    ProductId::new(id)
}

// =============================================================================
// Merge & totals
// =============================================================================

#[tokio::test]
async fn test_add_same_key_merges_quantities() {
    for mode in [Mode::Local, Mode::Remote(ALICE)] {
        let (mut basket, _, _) = basket(mode).await;

        let first = basket.add(p(1), 2, Some("M".into()), None).await.unwrap();
        let second = basket.add(p(1), 3, Some("M".into()), None).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(basket.lines().len(), 1);
        assert_eq!(basket.lines()[0].quantity, 5);
    }
}

#[tokio::test]
async fn test_add_different_variant_appends() {
    let (mut basket, _, _) = basket(Mode::Local).await;

    basket.add(p(1), 1, Some("M".into()), None).await.unwrap();
    basket.add(p(1), 1, Some("L".into()), None).await.unwrap();
    basket
        .add(p(1), 1, Some("L".into()), Some("Red".into()))
        .await
        .unwrap();

    assert_eq!(basket.lines().len(), 3);
    assert_eq!(basket.count(), 3);
}

#[tokio::test]
async fn test_total_uses_discount_price() {
    let (mut basket, _, _) = basket(Mode::Local).await;

    basket.add(p(1), 1, None, None).await.unwrap();
    basket.add(p(2), 2, None, None).await.unwrap();
    basket.add(p(3), 3, None, None).await.unwrap();

    // 500 + 2 * 150 + 3 * 80
    assert_eq!(basket.total(), Decimal::new(1040, 0));
    assert_eq!(basket.count(), 6);

    let expected: Decimal = basket
        .lines()
        .iter()
        .map(|l| l.product.discount_price.unwrap_or(l.product.price) * Decimal::from(l.quantity))
        .sum();
    assert_eq!(basket.total(), expected);
}

#[tokio::test]
async fn test_scenario_add_merge_remove() {
    for mode in [Mode::Local, Mode::Remote(ALICE)] {
        let (mut basket, _, _) = basket(mode).await;

        let line = basket.add(p(1), 2, None, None).await.unwrap();
        assert_eq!(basket.total(), Decimal::new(1000, 0));
        assert_eq!(basket.count(), 2);

        basket.add(p(1), 1, None, None).await.unwrap();
        assert_eq!(basket.lines().len(), 1);
        assert_eq!(basket.lines()[0].quantity, 3);
        assert_eq!(basket.total(), Decimal::new(1500, 0));

        basket.remove(line).await.unwrap();
        assert_eq!(basket.total(), Decimal::ZERO);
        assert_eq!(basket.count(), 0);
    }
}

// =============================================================================
// Quantity, remove, clear
// =============================================================================

#[tokio::test]
async fn test_set_quantity_zero_removes() {
    for mode in [Mode::Local, Mode::Remote(ALICE)] {
        let (mut basket, remote, local) = basket(mode).await;
        let keep = basket.add(p(3), 1, None, None).await.unwrap();
        let line = basket.add(p(1), 4, None, None).await.unwrap();

        basket.set_quantity(line, 0).await.unwrap();

        assert!(basket.line(line).is_none());
        assert!(basket.line(keep).is_some());
        let persisted = match mode {
            Mode::Remote(user_id) => remote.rows_for(user_id),
            Mode::Local => local.stored(),
        };
        assert_eq!(persisted, basket.lines());
    }
}

#[tokio::test]
async fn test_set_quantity_updates_line() {
    let (mut basket, remote, _) = basket(Mode::Remote(ALICE)).await;
    let line = basket.add(p(2), 1, None, None).await.unwrap();

    basket.set_quantity(line, 7).await.unwrap();

    assert_eq!(basket.count(), 7);
    assert_eq!(remote.rows_for(ALICE)[0].quantity, 7);
}

#[tokio::test]
async fn test_clear_empties_both_modes() {
    for mode in [Mode::Local, Mode::Remote(ALICE)] {
        let (mut basket, remote, local) = basket(mode).await;
        basket.add(p(1), 2, None, None).await.unwrap();
        basket.add(p(2), 1, None, None).await.unwrap();

        basket.clear().await.unwrap();

        assert_eq!(basket.count(), 0);
        assert!(remote.rows_for(ALICE).is_empty());
        assert!(local.stored().is_empty());
    }
}

#[tokio::test]
async fn test_unknown_line_is_reported() {
    let (mut basket, _, _) = basket(Mode::Local).await;
    let missing = LineId::generate();

    assert!(matches!(
        basket.remove(missing).await,
        Err(BasketError::LineNotFound(id)) if id == missing
    ));
    assert!(matches!(
        basket.set_quantity(missing, 2).await,
        Err(BasketError::LineNotFound(_))
    ));
}

#[tokio::test]
async fn test_add_rejects_zero_and_unknown_products() {
    let (mut basket, _, _) = basket(Mode::Local).await;

    assert!(matches!(
        basket.add(p(1), 0, None, None).await,
        Err(BasketError::InvalidQuantity)
    ));
    assert!(matches!(
        basket.add(p(99), 1, None, None).await,
        Err(BasketError::ProductNotFound(id)) if id == p(99)
    ));
    assert!(basket.lines().is_empty());
}

// =============================================================================
// Failure handling
// =============================================================================

#[tokio::test]
async fn test_remote_failure_propagates_and_keeps_state() {
    let (mut basket, remote, _) = basket(Mode::Remote(ALICE)).await;
    let line = basket.add(p(1), 1, None, None).await.unwrap();

    remote.fail.store(true, Ordering::SeqCst);

    assert!(matches!(
        basket.add(p(1), 1, None, None).await,
        Err(BasketError::Remote(_))
    ));
    assert!(matches!(
        basket.remove(line).await,
        Err(BasketError::Remote(_))
    ));
    assert!(matches!(basket.clear().await, Err(BasketError::Remote(_))));

    assert_eq!(basket.count(), 1);
    assert_eq!(basket.lines()[0].id, line);
}

#[tokio::test]
async fn test_local_save_failure_is_swallowed_as_noop() {
    let (mut basket, _, local) = basket(Mode::Local).await;
    basket.add(p(1), 1, None, None).await.unwrap();

    local.fail.store(true, Ordering::SeqCst);
    basket.add(p(2), 1, None, None).await.unwrap();
    basket.clear().await.unwrap();

    assert_eq!(basket.count(), 1);
    assert_eq!(basket.lines()[0].product_id, p(1));
}

#[tokio::test]
async fn test_local_load_failure_yields_empty_list() {
    let local = MemoryLocal::default();
    local.fail.store(true, Ordering::SeqCst);

    let basket = Basket::open(
        ListKind::Wishlist,
        Mode::Local,
        MemoryRemote::default(),
        local,
        catalog(),
    )
    .await
    .unwrap();

    assert!(basket.lines().is_empty());
    assert!(!basket.is_loading());
}

#[tokio::test]
async fn test_remote_load_failure_propagates() {
    let remote = MemoryRemote::default();
    remote.fail.store(true, Ordering::SeqCst);

    let result = Basket::open(
        ListKind::Cart,
        Mode::Remote(ALICE),
        remote,
        MemoryLocal::default(),
        catalog(),
    )
    .await;

    assert!(matches!(result, Err(BasketError::Remote(_))));
}

// =============================================================================
// Mode switching
// =============================================================================

#[tokio::test]
async fn test_sign_in_discards_anonymous_lines() {
    let (mut basket, remote, local) = basket(Mode::Local).await;
    basket.add(p(3), 2, None, None).await.unwrap();
    remote
        .rows
        .lock()
        .unwrap()
        .insert(ALICE, vec![LineItem {
            id: LineId::generate(),
            product_id: p(1),
            quantity: 1,
            size: None,
            color: None,
            product: product(1, 500, None),
        }]);

    basket
        .on_session_change(SessionChange::SignedIn(ALICE))
        .await
        .unwrap();

    assert_eq!(basket.mode(), Mode::Remote(ALICE));
    assert_eq!(basket.lines().len(), 1);
    assert_eq!(basket.lines()[0].product_id, p(1));
    // Anonymous list is untouched, not merged.
    assert_eq!(local.stored().len(), 1);
    assert_eq!(remote.rows_for(ALICE).len(), 1);

    basket
        .on_session_change(SessionChange::SignedOut)
        .await
        .unwrap();

    assert_eq!(basket.mode(), Mode::Local);
    assert_eq!(basket.lines()[0].product_id, p(3));
}

#[tokio::test]
async fn test_sign_in_with_remote_down_leaves_basket_empty() {
    let (mut basket, remote, _) = basket(Mode::Local).await;
    basket.add(p(3), 2, None, None).await.unwrap();
    remote.fail.store(true, Ordering::SeqCst);

    let result = basket.on_session_change(SessionChange::SignedIn(ALICE)).await;

    assert!(matches!(result, Err(BasketError::Remote(_))));
    assert!(basket.lines().is_empty());
    assert!(!basket.is_loading());
}

#[tokio::test]
async fn test_view_reflects_state() {
    let (mut basket, _, _) = basket(Mode::Local).await;
    basket.add(p(2), 2, None, None).await.unwrap();

    let view = basket.view();
    assert_eq!(view.kind, ListKind::Cart);
    assert_eq!(view.count, 2);
    assert_eq!(view.total, Decimal::new(300, 0));
    assert!(!view.loading);
    assert_eq!(view.lines.len(), 1);
}

#[tokio::test]
async fn test_loading_is_lowered_after_every_reload() {
    let (mut basket, remote, _) = basket(Mode::Remote(ALICE)).await;
    assert!(!basket.view().loading);

    basket.reload().await.unwrap();
    assert!(!basket.view().loading);

    remote.fail.store(true, Ordering::SeqCst);
    assert!(basket.reload().await.is_err());
    assert!(!basket.view().loading);
}
