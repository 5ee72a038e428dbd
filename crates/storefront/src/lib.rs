//! Bazaar storefront library.
//!
//! The web server's handlers, the dual-mode cart and wishlist store, and
//! the Postgres repositories behind them. Built as a library so the CLI and
//! the integration tests can use the same types as the server.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod basket;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
