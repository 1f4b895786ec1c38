//! Owner-wide aggregate: lazily created, incremented per sale and payment,
//! resettable.

mod common;

use common::TestApp;
use serde_json::{json, Value};

#[tokio::test]
async fn owner_stats_start_at_zero() {
    let app = TestApp::spawn().await;

    let response = app.get("/invoices/owner-stats").await;
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["total_bills"], 0);
    assert_eq!(body["total_amount"], 0.0);
    assert_eq!(body["total_received"], 0.0);
    assert_eq!(body["total_pending"], 0.0);

    app.cleanup().await;
}

#[tokio::test]
async fn sales_and_payments_move_the_aggregate() {
    let app = TestApp::spawn().await;
    let soap = app.seed_product("Soap", 50.0, 18.0, 100).await;
    let rice = app.seed_product("Rice", 50.0, 0.0, 100).await;
    app.seed_customer("Asha", "9820000001").await;

    app.create_invoice("9820000001", &soap, 2, 50.0).await;
    app.create_invoice("9820000001", &rice, 1, 50.0).await;

    let body: Value = app.get("/invoices/owner-stats").await.json().await.unwrap();
    assert_eq!(body["total_bills"], 2);
    assert_eq!(body["total_amount"], 168.0);
    assert_eq!(body["total_received"], 0.0);
    assert_eq!(body["total_pending"], 168.0);

    app.patch("/customers/9820000001/amount", &json!({ "amount": 100.0 }))
        .await;

    let body: Value = app.get("/invoices/owner-stats").await.json().await.unwrap();
    assert_eq!(body["total_received"], 100.0);
    assert_eq!(body["total_pending"], 68.0);

    app.cleanup().await;
}

#[tokio::test]
async fn marking_paid_books_the_full_rolling_balance() {
    let app = TestApp::spawn().await;
    let soap = app.seed_product("Soap", 50.0, 18.0, 100).await;
    let rice = app.seed_product("Rice", 50.0, 0.0, 100).await;
    app.seed_customer("Asha", "9820000002").await;

    app.create_invoice("9820000002", &soap, 2, 50.0).await;
    let second = app.create_invoice("9820000002", &rice, 1, 50.0).await;
    let second_id = second["id"].as_str().unwrap().to_string();

    app.patch(
        &format!("/invoices/{}/status", second_id),
        &json!({ "status": "paid" }),
    )
    .await;

    let body: Value = app.get("/invoices/owner-stats").await.json().await.unwrap();
    assert_eq!(body["total_received"], 168.0);
    assert_eq!(body["total_pending"], 0.0);

    app.cleanup().await;
}

#[tokio::test]
async fn reset_zeroes_all_counters() {
    let app = TestApp::spawn().await;
    let soap = app.seed_product("Soap", 50.0, 18.0, 100).await;
    app.seed_customer("Asha", "9820000003").await;
    app.create_invoice("9820000003", &soap, 2, 50.0).await;

    let response = app.post("/invoices/owner-stats/reset", &json!({})).await;
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["total_bills"], 0);
    assert_eq!(body["total_amount"], 0.0);
    assert_eq!(body["total_received"], 0.0);
    assert_eq!(body["total_pending"], 0.0);

    app.cleanup().await;
}

#[tokio::test]
async fn hard_reset_wipes_everything() {
    let app = TestApp::spawn().await;
    let soap = app.seed_product("Soap", 50.0, 18.0, 100).await;
    app.seed_customer("Asha", "9820000004").await;
    app.create_invoice("9820000004", &soap, 2, 50.0).await;

    let response = app.post("/invoices/hard-reset", &json!({})).await;
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["ok"], true);

    let invoices: Vec<Value> = app.get("/invoices").await.json().await.unwrap();
    assert!(invoices.is_empty());
    let customers: Vec<Value> = app.get("/customers").await.json().await.unwrap();
    assert!(customers.is_empty());
    let transactions: Vec<Value> = app.get("/transactions").await.json().await.unwrap();
    assert!(transactions.is_empty());

    let stats: Value = app.get("/invoices/owner-stats").await.json().await.unwrap();
    assert_eq!(stats["total_bills"], 0);
    assert_eq!(stats["total_pending"], 0.0);

    // Products survive a hard reset.
    let products: Vec<Value> = app.get("/products").await.json().await.unwrap();
    assert_eq!(products.len(), 1);
    let _ = soap;

    app.cleanup().await;
}
