//! Dual-mode cart and wishlist store.
//!
//! A [`Basket`] holds one list of [`LineItem`]s for one session. Signed-in
//! users' lines are rows in Postgres and the in-memory list is a
//! read-through copy of them. Anonymous visitors' lines are a JSON array in
//! their session record, rewritten in full on every change.
//!
//! Failure rules:
//!
//! - Remote writes happen before the in-memory list changes. A failed write
//!   propagates and leaves the basket untouched.
//! - Local reads and writes are best effort. Failures are logged and the
//!   operation becomes a no-op.
//!
//! Baskets are built per request, see [`AppState::basket`](crate::state::AppState::basket).
//! Nothing is shared between sessions.

pub mod adapters;
pub mod mode;

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use bazaar_core::{LineId, ProductId};

pub use adapters::{Catalog, LocalLines, LocalStoreError, RemoteLines, SessionLines};
pub use mode::{ListKind, Mode, SessionChange};

use crate::db::RepositoryError;
use crate::models::LineItem;

/// Errors surfaced by basket operations.
#[derive(Debug, Error)]
pub enum BasketError {
    /// The product does not exist or is no longer sold.
    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    /// No line with this ID in the basket.
    #[error("line {0} not found")]
    LineNotFound(LineId),

    /// Adding zero units.
    #[error("quantity must be at least 1")]
    InvalidQuantity,

    /// The remote store rejected the read or write.
    #[error("remote store error: {0}")]
    Remote(#[from] RepositoryError),
}

/// Serializable state handed to page code and the JSON API.
#[derive(Debug, Clone, Serialize)]
pub struct BasketView {
    pub kind: ListKind,
    pub lines: Vec<LineItem>,
    /// Always `false` in practice: a view is taken between calls, and the
    /// flag is only raised inside [`Basket::reload`].
    pub loading: bool,
    pub total: Decimal,
    pub count: u32,
}

/// Pending write, applied to the remote store before the list is swapped.
enum Change {
    Insert(LineItem),
    Quantity(LineId, u32),
    Delete(LineId),
    Clear,
}

/// One session's cart or wishlist.
pub struct Basket<R, L, C> {
    kind: ListKind,
    mode: Mode,
    lines: Vec<LineItem>,
    loading: bool,
    remote: R,
    local: L,
    catalog: C,
}

impl<R, L, C> Basket<R, L, C>
where
    R: RemoteLines,
    L: LocalLines,
    C: Catalog,
{
    /// An empty, unloaded basket in local mode.
    pub fn new(kind: ListKind, remote: R, local: L, catalog: C) -> Self {
        Self {
            kind,
            mode: Mode::Local,
            lines: Vec::new(),
            loading: false,
            remote,
            local,
            catalog,
        }
    }

    /// Build a basket in `mode` and load its lines.
    ///
    /// # Errors
    ///
    /// Returns `BasketError::Remote` if the remote list cannot be read.
    pub async fn open(
        kind: ListKind,
        mode: Mode,
        remote: R,
        local: L,
        catalog: C,
    ) -> Result<Self, BasketError> {
        let mut basket = Self::new(kind, remote, local, catalog);
        basket.mode = mode;
        basket.reload().await?;
        Ok(basket)
    }

    /// Replace the in-memory list with what the active store holds.
    ///
    /// `loading` is raised for the duration of the adapter read and lowered
    /// before returning, success or not. `reload` holds `&mut self` while it
    /// runs, so no caller can observe the raised flag.
    ///
    /// # Errors
    ///
    /// Returns `BasketError::Remote` if the remote list cannot be read. The
    /// in-memory list is left as it was.
    pub async fn reload(&mut self) -> Result<(), BasketError> {
        self.loading = true;
        let loaded = match self.mode {
            Mode::Remote(user_id) => self.remote.list(user_id).await.map_err(BasketError::from),
            Mode::Local => Ok(self.load_local().await),
        };
        self.loading = false;

        self.lines = loaded?;
        Ok(())
    }

    /// Switch mode for a sign-in or sign-out and reload from the new store.
    ///
    /// The previous list is dropped. Anonymous lines are not carried into
    /// the user's list; they stay in the session and come back on sign-out.
    ///
    /// # Errors
    ///
    /// Returns `BasketError::Remote` if the new remote list cannot be read;
    /// the basket is then empty.
    pub async fn on_session_change(&mut self, change: SessionChange) -> Result<(), BasketError> {
        let next = self.mode.transition(change);
        tracing::debug!(kind = %self.kind, from = ?self.mode, to = ?next, "basket mode change");
        self.mode = next;
        self.lines.clear();
        self.reload().await
    }

    /// Add `quantity` units of a product, merging into a line with the same
    /// product, size and color. Returns the ID of the affected line.
    ///
    /// Stock limits are the caller's responsibility.
    ///
    /// # Errors
    ///
    /// - `InvalidQuantity` if `quantity` is zero
    /// - `ProductNotFound` if the catalog has no such active product
    /// - `Remote` if the catalog lookup or the remote write fails
    pub async fn add(
        &mut self,
        product_id: ProductId,
        quantity: u32,
        size: Option<String>,
        color: Option<String>,
    ) -> Result<LineId, BasketError> {
        if quantity == 0 {
            return Err(BasketError::InvalidQuantity);
        }

        let product = self
            .catalog
            .snapshot(product_id)
            .await?
            .ok_or(BasketError::ProductNotFound(product_id))?;

        let mut next = self.lines.clone();
        let existing = next
            .iter_mut()
            .find(|line| line.matches(product_id, size.as_deref(), color.as_deref()));

        let (line_id, change) = match existing {
            Some(line) => {
                line.quantity = line.quantity.saturating_add(quantity);
                (line.id, Change::Quantity(line.id, line.quantity))
            }
            None => {
                let line = LineItem {
                    id: LineId::generate(),
                    product_id,
                    quantity,
                    size,
                    color,
                    product,
                };
                let line_id = line.id;
                next.push(line.clone());
                (line_id, Change::Insert(line))
            }
        };

        self.commit(next, change).await?;
        Ok(line_id)
    }

    /// Set a line's quantity. Anything below 1 removes the line.
    ///
    /// # Errors
    ///
    /// - `LineNotFound` if the basket has no such line
    /// - `Remote` if the remote write fails
    pub async fn set_quantity(&mut self, line_id: LineId, quantity: u32) -> Result<(), BasketError> {
        if quantity < 1 {
            return self.remove(line_id).await;
        }

        let mut next = self.lines.clone();
        let line = next
            .iter_mut()
            .find(|line| line.id == line_id)
            .ok_or(BasketError::LineNotFound(line_id))?;
        line.quantity = quantity;

        self.commit(next, Change::Quantity(line_id, quantity)).await
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// - `LineNotFound` if the basket has no such line
    /// - `Remote` if the remote delete fails
    pub async fn remove(&mut self, line_id: LineId) -> Result<(), BasketError> {
        if !self.lines.iter().any(|line| line.id == line_id) {
            return Err(BasketError::LineNotFound(line_id));
        }

        let next = self
            .lines
            .iter()
            .filter(|line| line.id != line_id)
            .cloned()
            .collect();

        self.commit(next, Change::Delete(line_id)).await
    }

    /// Remove every line.
    ///
    /// # Errors
    ///
    /// Returns `BasketError::Remote` if the remote bulk delete fails.
    pub async fn clear(&mut self) -> Result<(), BasketError> {
        self.commit(Vec::new(), Change::Clear).await
    }

    /// `Σ (discount_price ?? price) * quantity` over the current lines.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.lines.iter().map(LineItem::line_total).sum()
    }

    /// `Σ quantity` over the current lines.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.lines
            .iter()
            .fold(0, |count, line| count.saturating_add(line.quantity))
    }

    /// Current lines, in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[LineItem] {
        &self.lines
    }

    /// Look up a line by ID.
    #[must_use]
    pub fn line(&self, line_id: LineId) -> Option<&LineItem> {
        self.lines.iter().find(|line| line.id == line_id)
    }

    /// Whether a reload is in flight. Only ever `true` inside `reload`.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    /// Active persistence mode.
    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    /// Which list this is.
    #[must_use]
    pub const fn kind(&self) -> ListKind {
        self.kind
    }

    /// Snapshot for rendering or JSON.
    #[must_use]
    pub fn view(&self) -> BasketView {
        BasketView {
            kind: self.kind,
            lines: self.lines.clone(),
            loading: self.loading,
            total: self.total(),
            count: self.count(),
        }
    }

    async fn commit(&mut self, next: Vec<LineItem>, change: Change) -> Result<(), BasketError> {
        match self.mode {
            Mode::Remote(user_id) => {
                match change {
                    Change::Insert(line) => self.remote.insert(user_id, &line).await?,
                    Change::Quantity(line_id, quantity) => {
                        self.remote
                            .update_quantity(user_id, line_id, quantity)
                            .await?;
                    }
                    Change::Delete(line_id) => self.remote.delete(user_id, line_id).await?,
                    Change::Clear => self.remote.clear(user_id).await?,
                }
                self.lines = next;
            }
            Mode::Local => match self.local.save(&next).await {
                Ok(()) => self.lines = next,
                Err(e) => {
                    tracing::warn!(kind = %self.kind, error = %e, "failed to save anonymous basket");
                }
            },
        }
        Ok(())
    }

    async fn load_local(&self) -> Vec<LineItem> {
        self.local.load().await.unwrap_or_else(|e| {
            tracing::warn!(kind = %self.kind, error = %e, "failed to load anonymous basket");
            Vec::new()
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests;
