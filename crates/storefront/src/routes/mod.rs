//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! # Catalog
//! GET  /                        - Redirect to /products
//! GET  /products                - Product listing (?page=N)
//! GET  /products/{slug}         - Product page with cart and wishlist forms
//!
//! # Cart (HTMX fragments)
//! GET  /cart                    - Cart page
//! GET  /cart/count              - Cart count badge (fragment)
//! POST /cart/add                - Add product (returns badge, triggers cart-updated)
//! POST /cart/update             - Set quantity, 0 removes (returns lines fragment)
//! POST /cart/remove             - Remove line (returns lines fragment)
//! POST /cart/clear              - Remove every line (returns lines fragment)
//!
//! # Wishlist (same shape as the cart, triggers wishlist-updated)
//! GET  /wishlist, /wishlist/count
//! POST /wishlist/{add,update,remove,clear}
//! POST /wishlist/move-to-cart   - Add the line to the cart, then remove it here
//!
//! # JSON
//! GET  /api/cart                - Cart as JSON
//! GET  /api/wishlist            - Wishlist as JSON
//!
//! # Auth
//! GET  /auth/login              - Sign-in page
//! POST /auth/login              - Check password, redirect by role
//! POST /auth/logout             - Sign out (returns cart badge)
//!
//! # Signed in
//! POST /checkout                - Place an order from the cart
//!
//! # Seller / Admin
//! GET  /seller/products         - Inventory (seller or admin)
//! GET  /admin/orders            - Recent orders (admin)
//! ```

pub mod admin;
pub mod api;
pub mod auth;
pub mod basket;
pub mod checkout;
pub mod products;
pub mod seller;

use axum::{
    Extension, Router,
    response::Redirect,
    routing::{get, post},
};

use crate::basket::ListKind;
use crate::state::AppState;

/// Create the routes shared by the cart and the wishlist.
fn basket_routes(kind: ListKind) -> Router<AppState> {
    Router::new()
        .route("/", get(basket::show))
        .route("/count", get(basket::count))
        .route("/add", post(basket::add))
        .route("/update", post(basket::update))
        .route("/remove", post(basket::remove))
        .route("/clear", post(basket::clear))
        .layer(Extension(kind))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    basket_routes(ListKind::Cart)
}

/// Create the wishlist routes router.
pub fn wishlist_routes() -> Router<AppState> {
    basket_routes(ListKind::Wishlist).route("/move-to-cart", post(basket::move_to_cart))
}

/// Create the JSON API routes router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/cart",
            get(api::basket).layer(Extension(ListKind::Cart)),
        )
        .route(
            "/wishlist",
            get(api::basket).layer(Extension(ListKind::Wishlist)),
        )
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(|| async { Redirect::to("/products") }))
        .route("/products", get(products::index))
        .route("/products/{slug}", get(products::show))
        .nest("/cart", cart_routes())
        .nest("/wishlist", wishlist_routes())
        .nest("/api", api_routes())
        .route("/checkout", post(checkout::place_order))
        .route("/auth/login", get(auth::login_page).post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/seller/products", get(seller::products))
        .route("/admin/orders", get(admin::orders))
}
