//! Bazaar Core - Shared types library.
//!
//! This crate provides the domain types used across the Bazaar workspace:
//! - `storefront` - Customer storefront, seller and admin endpoints
//! - `cli` - Command-line tools for migrations, seeding and user management
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP clients. The optional `postgres` feature adds `sqlx` encoding
//! for the ID and role types.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, money, emails and user roles

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
