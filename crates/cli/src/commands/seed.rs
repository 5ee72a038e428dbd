//! Catalog seeding.
//!
//! Products are upserted on their slug, so running a seed twice updates
//! prices and stock instead of duplicating rows.
//!
//! # File format
//!
//! ```json
//! [
//!   {
//!     "seller_email": "maya@example.com",
//!     "name": "Linen Apron",
//!     "slug": "linen-apron",
//!     "price": "48.00",
//!     "discount_price": "39.00",
//!     "images": ["/images/apron.jpg"],
//!     "stock_quantity": 12
//!   }
//! ]
//! ```

use std::path::Path;

use rust_decimal::Decimal;

use bazaar_core::{Email, UserRole};
use bazaar_storefront::db::{ProductRepository, RepositoryError, UserRepository};
use bazaar_storefront::models::NewProduct;

use super::{CliError, connect};

/// Seller that owns the built-in demo catalog.
const DEMO_SELLER_EMAIL: &str = "demo-seller@bazaar.test";

/// Seed from `file`, or the demo catalog when no file is given.
///
/// # Errors
///
/// Returns an error if the file is unreadable or invalid, a seller has no
/// account, or the database fails.
pub async fn run(file: Option<&Path>) -> Result<(), CliError> {
    let products = match file {
        Some(path) => {
            let content = tokio::fs::read_to_string(path)
                .await
                .map_err(|source| CliError::Io {
                    path: path.display().to_string(),
                    source,
                })?;
            parse_catalog(&content)?
        }
        None => demo_catalog(),
    };

    tracing::info!(products = products.len(), "Parsed catalog");

    let pool = connect().await?;

    if file.is_none() {
        ensure_demo_seller(&UserRepository::new(&pool)).await?;
    }

    let repo = ProductRepository::new(&pool);
    for product in &products {
        let id = repo.upsert(product).await.map_err(|e| match e {
            RepositoryError::NotFound => CliError::InvalidArgument(format!(
                "seller {} has no account; create it with `bazaar-cli user create`",
                product.seller_email
            )),
            other => other.into(),
        })?;
        tracing::info!(product_id = %id, slug = %product.slug, "Seeded product");
    }

    tracing::info!("Seeding complete! {} products", products.len());
    Ok(())
}

async fn ensure_demo_seller(users: &UserRepository<'_>) -> Result<(), CliError> {
    let email = Email::parse(DEMO_SELLER_EMAIL)
        .map_err(|e| CliError::InvalidArgument(e.to_string()))?;

    if users.get_by_email(&email).await?.is_none() {
        let seller = users
            .create(&email, "Demo Seller", UserRole::Seller)
            .await?;
        tracing::info!(user_id = %seller.id, "Created demo seller");
    }
    Ok(())
}

/// Parse and validate a JSON catalog.
fn parse_catalog(json: &str) -> Result<Vec<NewProduct>, CliError> {
    let mut products: Vec<NewProduct> = serde_json::from_str(json)?;
    for product in &mut products {
        validate(product)?;
        // Stored emails have a lowercase domain; match that form.
        product.seller_email = Email::parse(&product.seller_email)
            .map_err(|e| CliError::InvalidArgument(format!("product '{}': {e}", product.slug)))?
            .to_string();
    }
    Ok(products)
}

fn validate(product: &NewProduct) -> Result<(), CliError> {
    let invalid = |reason: &str| {
        Err(CliError::InvalidArgument(format!(
            "product '{}': {reason}",
            product.slug
        )))
    };

    if product.slug.trim().is_empty() || product.name.trim().is_empty() {
        return invalid("name and slug are required");
    }
    if product.price < Decimal::ZERO {
        return invalid("price must not be negative");
    }
    if let Some(discount) = product.discount_price
        && (discount < Decimal::ZERO || discount >= product.price)
    {
        return invalid("discount price must be below the price");
    }
    if product.stock_quantity < 0 {
        return invalid("stock must not be negative");
    }
    Ok(())
}

fn demo_product(
    name: &str,
    slug: &str,
    price: i64,
    discount: Option<i64>,
    stock_quantity: i32,
) -> NewProduct {
    NewProduct {
        seller_email: DEMO_SELLER_EMAIL.to_string(),
        name: name.to_string(),
        slug: slug.to_string(),
        price: Decimal::new(price, 2),
        discount_price: discount.map(|d| Decimal::new(d, 2)),
        images: vec![format!("/images/demo/{slug}.jpg")],
        stock_quantity,
    }
}

/// The built-in demo catalog.
fn demo_catalog() -> Vec<NewProduct> {
    vec![
        demo_product("Stoneware Mug", "stoneware-mug", 2400, None, 40),
        demo_product("Linen Apron", "linen-apron", 4800, Some(3900), 12),
        demo_product("Walnut Serving Board", "walnut-serving-board", 8500, None, 6),
        demo_product("Beeswax Candle Set", "beeswax-candle-set", 1800, Some(1500), 60),
        demo_product("Wool Throw", "wool-throw", 12000, None, 3),
        demo_product("Ceramic Planter", "ceramic-planter", 3200, None, 0),
    ]
}
