//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                   - Liveness check
//! GET  /health/ready             - Store connectivity check
//!
//! # Accounts & catalog (public)
//! POST /users/signup             - Register, returns tokens (201)
//! POST /users/login              - Log in, returns tokens
//! GET  /users/productview        - Product listing
//! GET  /users/search?name=       - Product search
//!
//! # Requires `token` header
//! POST /admin/addproduct         - Add a product (201)
//! GET  /addtocart?id=&userID=    - Add a product to the cart
//! GET  /removeitem?id=&userID=   - Remove a product from the cart
//! GET  /listcart?id=             - Cart items and total
//! GET  /cartcheckout?id=         - Check out the cart
//! GET  /instantbuy?id=&pid=      - Buy one product directly
//! GET  /listorders?id=           - Order history
//! POST /addaddress?id=           - Add an address (201)
//! GET  /addresses?id=            - Address book
//! PUT  /edithomeaddress?id=      - Overwrite the home address
//! PUT  /editworkaddress?id=      - Overwrite the work address
//! POST /deleteaddresses?id=      - Remove every address
//! ```

pub mod addresses;
pub mod cart;
pub mod products;
pub mod users;

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post, put},
};
use tower_http::trace::TraceLayer;
use tracing::Span;

use crate::error::AppError;
use crate::middleware::{request_id_middleware, require_token};
use crate::state::AppState;

/// Read a query parameter the route cannot do without.
pub(crate) fn required<'a>(value: Option<&'a str>, name: &str) -> Result<&'a str, AppError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::BadRequest(format!("query parameter '{name}' is required")))
}

/// Create the public account and catalog routes router.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(users::sign_up))
        .route("/login", post(users::login))
        .route("/productview", get(users::product_view))
        .route("/search", get(users::search))
}

/// Create the token-protected routes router.
pub fn protected_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/admin/addproduct", post(products::add_product))
        // Cart
        .route("/addtocart", get(cart::add_to_cart))
        .route("/removeitem", get(cart::remove_item))
        .route("/listcart", get(cart::list_cart))
        // Orders
        .route("/cartcheckout", get(cart::checkout))
        .route("/instantbuy", get(cart::instant_buy))
        .route("/listorders", get(cart::list_orders))
        // Addresses
        .route("/addaddress", post(addresses::add_address))
        .route("/addresses", get(addresses::list_addresses))
        .route("/edithomeaddress", put(addresses::edit_home_address))
        .route("/editworkaddress", put(addresses::edit_work_address))
        .route("/deleteaddresses", post(addresses::delete_addresses))
        .route_layer(from_fn_with_state(state.clone(), require_token))
}

/// Create the full application router, without the Sentry layers.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/users", user_routes())
        .merge(protected_routes(&state))
        .layer(from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        .with_state(state)
}

/// Root span for a request; the middleware fills in the empty fields.
fn request_span(request: &Request<Body>) -> Span {
    tracing::info_span!(
        "request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = tracing::field::Empty,
        user_id = tracing::field::Empty,
    )
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the store is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.store().ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
