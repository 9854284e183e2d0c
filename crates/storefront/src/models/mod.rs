//! Domain models for the storefront.

pub mod user;

pub use user::{NewUser, User, UserProfile};
