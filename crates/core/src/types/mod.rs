//! Core types for Emporium.
//!
//! This module provides type-safe wrappers for the commerce domain.

pub mod address;
pub mod email;
pub mod id;
pub mod order;
pub mod price;
pub mod product;

pub use address::{Address, AddressBook, AddressFields, AddressRole, AddressRoleError};
pub use email::{Email, EmailError};
pub use id::*;
pub use order::{Order, PaymentMethod};
pub use price::Price;
pub use product::{LineItem, Product};
