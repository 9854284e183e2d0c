//! Emporium Core - Shared domain types.
//!
//! This crate provides the types shared by every Emporium component:
//! - `storefront` - The HTTP backend (accounts, catalog, cart, checkout)
//! - `cli` - Operator tooling for indexes and catalog seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! database access, no HTTP clients. Every type here serializes to the exact
//! document shape the storefront persists, so the same values can be written
//! to MongoDB, kept in memory, or returned over HTTP.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, emails, prices, products, line items, addresses and orders

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
