//! Emporium Storefront library.
//!
//! The HTTP backend for accounts, the product catalog, carts, address books
//! and orders. Exposed as a library so the binary, the CLI and the tests
//! share one implementation.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

#[cfg(test)]
mod test_support;
