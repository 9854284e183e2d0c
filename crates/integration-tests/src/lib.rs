//! Integration tests for Emporium.
//!
//! These tests drive a running storefront over HTTP and are `#[ignore]`d by
//! default.
//!
//! # Running Tests
//!
//! ```bash
//! # Start the storefront (the in-memory store is enough)
//! STOREFRONT_STORE=memory cargo run -p emporium-storefront
//!
//! # Run integration tests
//! cargo test -p emporium-integration-tests -- --ignored
//! ```
//!
//! `STOREFRONT_BASE_URL` overrides the default `http://localhost:8000`.

use reqwest::{Client, Response};
use serde_json::{Value, json};
use uuid::Uuid;

/// Base URL for the storefront API (configurable via environment).
#[must_use]
pub fn storefront_base_url() -> String {
    std::env::var("STOREFRONT_BASE_URL").unwrap_or_else(|_| "http://localhost:8000".to_string())
}

/// A signed-up user and their access token.
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: String,
    pub email: String,
    pub token: String,
}

/// HTTP client bound to the storefront under test.
#[derive(Debug, Clone)]
pub struct TestContext {
    pub client: Client,
    pub base_url: String,
}

impl TestContext {
    /// Create a context for the configured storefront.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new() -> Self {
        Self {
            client: Client::builder()
                .build()
                .expect("Failed to create HTTP client"),
            base_url: storefront_base_url(),
        }
    }

    /// Absolute URL for a path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Sign up a fresh user with a unique email and phone.
    ///
    /// # Panics
    ///
    /// Panics if the signup request fails.
    #[allow(clippy::expect_used)]
    pub async fn sign_up(&self) -> TestUser {
        let unique = Uuid::new_v4();
        let email = format!("test-{}@example.com", unique.simple());
        let phone = format!("555{:07}", unique.as_u128() % 10_000_000);

        let resp = self
            .client
            .post(self.url("/users/signup"))
            .json(&json!({
                "first_name": "Test",
                "last_name": "Customer",
                "email": email,
                "password": "integration-password",
                "phone": phone,
            }))
            .send()
            .await
            .expect("Failed to send signup request");
        assert_eq!(resp.status(), 201, "signup failed");

        let body: Value = resp.json().await.expect("Signup response is not JSON");
        TestUser {
            id: body["user"]["id"].as_str().expect("missing user id").to_string(),
            email,
            token: body["token"].as_str().expect("missing token").to_string(),
        }
    }

    /// Add a product with a unique name and return its ID.
    ///
    /// # Panics
    ///
    /// Panics if the product cannot be created.
    #[allow(clippy::expect_used)]
    pub async fn add_product(&self, user: &TestUser, price: i64) -> String {
        let name = format!("Test Product {}", Uuid::new_v4());
        let resp = self
            .client
            .post(self.url("/admin/addproduct"))
            .header("token", &user.token)
            .json(&json!({ "name": name, "price": price, "rating": 4, "image": "test.png" }))
            .send()
            .await
            .expect("Failed to send add product request");
        assert_eq!(resp.status(), 201, "add product failed");

        let body: Value = resp.json().await.expect("Product response is not JSON");
        body["id"].as_str().expect("missing product id").to_string()
    }

    /// Authenticated GET.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    #[allow(clippy::expect_used)]
    pub async fn get(&self, user: &TestUser, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .header("token", &user.token)
            .send()
            .await
            .expect("Failed to send request")
    }

    /// Authenticated request with a JSON body.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    #[allow(clippy::expect_used)]
    pub async fn send_json(
        &self,
        user: &TestUser,
        method: reqwest::Method,
        path: &str,
        body: &Value,
    ) -> Response {
        self.client
            .request(method, self.url(path))
            .header("token", &user.token)
            .json(body)
            .send()
            .await
            .expect("Failed to send request")
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}
