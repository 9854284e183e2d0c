//! HTTP middleware stack for the storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Token auth (protected routes only)

pub mod auth;
pub mod request_id;

pub use auth::{Authenticated, TOKEN_HEADER, require_token};
pub use request_id::request_id_middleware;
