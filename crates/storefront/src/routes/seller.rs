//! Seller dashboard route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use tracing::instrument;

use bazaar_core::Money;

use crate::db::ProductRepository;
use crate::error::Result;
use crate::middleware::{RequireRole, SellerAccess};
use crate::models::SellerProduct;
use crate::state::AppState;

/// Products at or below this stock level are flagged.
const LOW_STOCK: i32 = 5;

/// One inventory row.
#[derive(Debug, Clone)]
pub struct InventoryRow {
    pub name: String,
    pub slug: String,
    pub price: String,
    pub sale_price: Option<String>,
    pub stock: i32,
    pub low_stock: bool,
    pub active: bool,
}

/// Seller inventory page template.
#[derive(Template, WebTemplate)]
#[template(path = "seller/products.html")]
pub struct InventoryTemplate {
    pub seller_name: String,
    pub all_sellers: bool,
    pub products: Vec<InventoryRow>,
}

/// List the seller's products with stock levels.
///
/// Admins see every seller's products.
#[instrument(skip(state, guard))]
pub async fn products(
    State(state): State<AppState>,
    guard: RequireRole<SellerAccess>,
) -> Result<InventoryTemplate> {
    let user = guard.into_user();
    let all_sellers = user.role.is_admin();
    let currency = state.config().currency;

    let products = ProductRepository::new(state.pool())
        .list_for_seller((!all_sellers).then_some(user.id))
        .await?;

    Ok(InventoryTemplate {
        seller_name: user.name,
        all_sellers,
        products: products
            .into_iter()
            .map(|p: SellerProduct| InventoryRow {
                price: Money::new(p.price, currency).display(),
                sale_price: p.discount_price.map(|d| Money::new(d, currency).display()),
                low_stock: p.stock_quantity <= LOW_STOCK,
                stock: p.stock_quantity,
                active: p.is_active,
                name: p.name,
                slug: p.slug,
            })
            .collect(),
    })
}
