//! Integration tests for signup, login and the address book.
//!
//! These tests require a running storefront (see the crate docs).
//!
//! Run with: cargo test -p emporium-integration-tests -- --ignored

#![allow(clippy::unwrap_used)]

use reqwest::{Method, StatusCode};
use serde_json::{Value, json};

use emporium_integration_tests::TestContext;

fn address(house: &str) -> Value {
    json!({"house": house, "street": "Harbour Road", "city": "Leith", "postcode": "EH6 6LX"})
}

#[tokio::test]
#[ignore = "requires a running storefront"]
async fn test_storefront_health() {
    let ctx = TestContext::new();
    let resp = ctx.client.get(ctx.url("/health")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "requires a running storefront"]
async fn test_login_issues_working_token() {
    let ctx = TestContext::new();
    let user = ctx.sign_up().await;

    let resp = ctx
        .client
        .post(ctx.url("/users/login"))
        .json(&json!({"email": user.email, "password": "integration-password"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["user"]["id"], user.id.as_str());
    assert!(body["refresh_token"].is_string());

    let wrong = ctx
        .client
        .post(ctx.url("/users/login"))
        .json(&json!({"email": user.email, "password": "not-the-password"}))
        .send()
        .await
        .unwrap();
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "requires a running storefront"]
async fn test_missing_token_rejected() {
    let ctx = TestContext::new();
    let resp = ctx
        .client
        .get(ctx.url("/listorders?id=00000000-0000-0000-0000-000000000000"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "requires a running storefront"]
async fn test_address_book_limit() {
    let ctx = TestContext::new();
    let user = ctx.sign_up().await;
    let add = format!("/addaddress?id={}", user.id);

    for (house, role) in [("1", "home"), ("2", "work")] {
        let resp = ctx
            .send_json(&user, Method::POST, &add, &address(house))
            .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["role"], role);
    }

    let third = ctx
        .send_json(&user, Method::POST, &add, &address("3"))
        .await;
    assert_eq!(third.status(), StatusCode::CONFLICT);

    let edited = ctx
        .send_json(
            &user,
            Method::PUT,
            &format!("/edithomeaddress?id={}", user.id),
            &address("10"),
        )
        .await;
    assert_eq!(edited.status(), StatusCode::OK);

    let book: Value = ctx
        .get(&user, &format!("/addresses?id={}", user.id))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(book["home"]["house"], "10");
    assert_eq!(book["work"]["house"], "2");
}
