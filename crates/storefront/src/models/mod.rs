//! Domain models for the storefront.
//!
//! - [`line`] - Cart and wishlist line items
//! - [`product`] - Catalog snapshots and seller inventory rows
//! - [`order`] - Placed orders
//! - [`session`] - Identity stored in the session
//! - [`user`] - Storefront accounts

pub mod line;
pub mod order;
pub mod product;
pub mod session;
pub mod user;

pub use line::LineItem;
pub use order::{OrderStatus, OrderSummary, PlacedOrder};
pub use product::{NewProduct, ProductSnapshot, SellerProduct};
pub use session::{CurrentUser, keys as session_keys};
pub use user::User;
