//! Catalog route handlers.
//!
//! The product page carries the add-to-cart and add-to-wishlist forms; both
//! post to the basket routes and swap the returned badge into the header.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use tracing::instrument;

use bazaar_core::{CurrencyCode, Money, ProductId};

use crate::db::ProductRepository;
use crate::error::{AppError, Result};
use crate::models::ProductSnapshot;
use crate::state::AppState;

/// Products per catalog page.
const PAGE_SIZE: u32 = 24;

/// Product display data for templates.
#[derive(Debug, Clone)]
pub struct ProductView {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    pub price: String,
    pub compare_at_price: Option<String>,
    pub images: Vec<String>,
    pub available: u32,
}

impl ProductView {
    fn new(product: &ProductSnapshot, currency: CurrencyCode) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            slug: product.slug.clone(),
            price: Money::new(product.unit_price(), currency).display(),
            compare_at_price: product
                .discount_price
                .map(|_| Money::new(product.price, currency).display()),
            images: product.images.clone(),
            available: product.available(),
        }
    }

    /// First image, for cards.
    #[must_use]
    pub fn featured_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }
}

/// Pagination query parameters.
#[derive(Debug, Deserialize)]
pub struct PaginationQuery {
    pub page: Option<u32>,
}

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub products: Vec<ProductView>,
    pub current_page: u32,
    pub has_more_pages: bool,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub product: ProductView,
}

// Slugs are written by the seed command as lowercase words joined by '-'.
fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug.len() <= 128
        && slug
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
}

/// Display product listing page.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<PaginationQuery>,
) -> Result<ProductsIndexTemplate> {
    let current_page = query.page.unwrap_or(1).max(1);
    let offset = i64::from(current_page - 1) * i64::from(PAGE_SIZE);

    // One extra row tells us whether a next page exists.
    let mut products = ProductRepository::new(state.pool())
        .list_active(i64::from(PAGE_SIZE) + 1, offset)
        .await?;
    let has_more_pages = products.len() > PAGE_SIZE as usize;
    products.truncate(PAGE_SIZE as usize);

    let currency = state.config().currency;
    Ok(ProductsIndexTemplate {
        products: products
            .iter()
            .map(|product| ProductView::new(product, currency))
            .collect(),
        current_page,
        has_more_pages,
    })
}

/// Display product detail page.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<ProductShowTemplate> {
    if !is_valid_slug(&slug) {
        return Err(AppError::NotFound(format!("No product at {slug}")));
    }

    let product = ProductRepository::new(state.pool())
        .get_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No product at {slug}")))?;

    Ok(ProductShowTemplate {
        product: ProductView::new(&product, state.config().currency),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn lamp(discount: Option<Decimal>) -> ProductSnapshot {
        ProductSnapshot {
            id: ProductId::new(12),
            name: "Brass Lamp".to_string(),
            slug: "brass-lamp".to_string(),
            price: Decimal::new(500, 0),
            discount_price: discount,
            images: vec!["/img/lamp.jpg".to_string()],
            stock_quantity: 3,
        }
    }

    #[test]
    fn test_slug_validation() {
        assert!(is_valid_slug("brass-lamp-2"));
        assert!(!is_valid_slug(""));
        assert!(!is_valid_slug("Brass-Lamp"));
        assert!(!is_valid_slug("lamp;drop"));
        assert!(!is_valid_slug(&"a".repeat(129)));
    }

    #[test]
    fn test_view_shows_compare_at_price_only_on_sale() {
        let view = ProductView::new(&lamp(None), CurrencyCode::USD);
        assert!(view.compare_at_price.is_none());

        let view = ProductView::new(&lamp(Some(Decimal::new(400, 0))), CurrencyCode::USD);
        assert_eq!(
            view.compare_at_price,
            Some(Money::new(Decimal::new(500, 0), CurrencyCode::USD).display())
        );
        assert_eq!(
            view.price,
            Money::new(Decimal::new(400, 0), CurrencyCode::USD).display()
        );
    }

    #[test]
    fn test_show_page_posts_to_both_lists() {
        let html = ProductShowTemplate {
            product: ProductView::new(&lamp(None), CurrencyCode::USD),
        }
        .render()
        .unwrap();

        assert!(html.contains(r#"hx-post="/cart/add""#));
        assert!(html.contains(r#"hx-post="/wishlist/add""#));
        assert!(html.contains(r#"name="product_id" value="12""#));
    }

    #[test]
    fn test_show_page_out_of_stock_hides_cart_form() {
        let mut product = lamp(None);
        product.stock_quantity = 0;
        let html = ProductShowTemplate {
            product: ProductView::new(&product, CurrencyCode::USD),
        }
        .render()
        .unwrap();

        assert!(!html.contains(r#"hx-post="/cart/add""#));
        assert!(html.contains(r#"hx-post="/wishlist/add""#));
    }
}
