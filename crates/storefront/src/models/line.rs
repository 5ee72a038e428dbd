//! Cart and wishlist line items.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use bazaar_core::{LineId, ProductId};

use super::ProductSnapshot;

/// One basket entry, identified for merging by product, size and color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: LineId,
    pub product_id: ProductId,
    /// Always at least 1; a line whose quantity would drop below 1 is removed.
    pub quantity: u32,
    pub size: Option<String>,
    pub color: Option<String>,
    pub product: ProductSnapshot,
}

impl LineItem {
    /// Whether this line has the given merge key.
    #[must_use]
    pub fn matches(&self, product_id: ProductId, size: Option<&str>, color: Option<&str>) -> bool {
        self.product_id == product_id
            && self.size.as_deref() == size
            && self.color.as_deref() == color
    }

    /// `unit_price * quantity`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.product.unit_price() * Decimal::from(self.quantity)
    }

    /// Human-readable variant, e.g. `M / Red`. Empty when neither is set.
    #[must_use]
    pub fn variant_label(&self) -> String {
        [self.size.as_deref(), self.color.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" / ")
    }
}
