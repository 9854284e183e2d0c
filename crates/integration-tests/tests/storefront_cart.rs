//! Integration tests for the cart and checkout endpoints.
//!
//! These tests require a running storefront (see the crate docs).
//!
//! Run with: cargo test -p emporium-integration-tests -- --ignored

#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;
use serde_json::Value;

use emporium_integration_tests::TestContext;

#[tokio::test]
#[ignore = "requires a running storefront"]
async fn test_add_remove_checkout() {
    let ctx = TestContext::new();
    let user = ctx.sign_up().await;
    let p1 = ctx.add_product(&user, 1000).await;
    let p2 = ctx.add_product(&user, 2000).await;

    for product in [&p1, &p2] {
        let resp = ctx
            .get(&user, &format!("/addtocart?id={product}&userID={}", user.id))
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let cart: Value = ctx
        .get(&user, &format!("/listcart?id={}", user.id))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(cart["total"], 3000);
    assert_eq!(cart["items"].as_array().unwrap().len(), 2);

    let resp = ctx
        .get(&user, &format!("/removeitem?id={p1}&userID={}", user.id))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let placed: Value = ctx
        .get(&user, &format!("/cartcheckout?id={}", user.id))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(placed["order"]["total"], 2000);
    assert_eq!(placed["order"]["payment"], "cash_on_delivery");

    let cart: Value = ctx
        .get(&user, &format!("/listcart?id={}", user.id))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(cart["total"], 0);
}

#[tokio::test]
#[ignore = "requires a running storefront"]
async fn test_empty_cart_checkout_places_zero_order() {
    let ctx = TestContext::new();
    let user = ctx.sign_up().await;

    let resp = ctx
        .get(&user, &format!("/cartcheckout?id={}", user.id))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let placed: Value = resp.json().await.unwrap();
    assert_eq!(placed["order"]["total"], 0);
    assert!(placed["order"]["items"].as_array().unwrap().is_empty());

    let orders: Value = ctx
        .get(&user, &format!("/listorders?id={}", user.id))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(orders.as_array().unwrap().len(), 1);
}

#[tokio::test]
#[ignore = "requires a running storefront"]
async fn test_instant_buy_leaves_cart_alone() {
    let ctx = TestContext::new();
    let user = ctx.sign_up().await;
    let in_cart = ctx.add_product(&user, 500).await;
    let bought = ctx.add_product(&user, 1250).await;

    ctx.get(&user, &format!("/addtocart?id={in_cart}&userID={}", user.id))
        .await;

    let placed: Value = ctx
        .get(&user, &format!("/instantbuy?id={}&pid={bought}", user.id))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(placed["order"]["total"], 1250);
    assert_eq!(placed["order"]["items"].as_array().unwrap().len(), 1);

    let cart: Value = ctx
        .get(&user, &format!("/listcart?id={}", user.id))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(cart["total"], 500);
}

#[tokio::test]
#[ignore = "requires a running storefront"]
async fn test_cannot_touch_another_users_cart() {
    let ctx = TestContext::new();
    let attacker = ctx.sign_up().await;
    let victim = ctx.sign_up().await;

    let resp = ctx
        .get(&attacker, &format!("/listcart?id={}", victim.id))
        .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}
