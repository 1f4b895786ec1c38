//! End-to-end rolling balance flows: invoice creation, carried-forward
//! dues, partial settlement and the paid-status cascade.

mod common;

use common::TestApp;
use serde_json::{json, Value};

#[tokio::test]
async fn first_sale_creates_pending_invoice_with_no_previous_due() {
    let app = TestApp::spawn().await;
    let product = app.seed_product("Soap", 50.0, 18.0, 100).await;
    app.seed_customer("Asha", "9800000001").await;

    let invoice = app.create_invoice("9800000001", &product, 2, 50.0).await;

    assert_eq!(invoice["sub_total"], 100.0);
    assert_eq!(invoice["tax_total"], 18.0);
    assert_eq!(invoice["current_total"], 118.0);
    assert_eq!(invoice["previous_due"], 0.0);
    assert_eq!(invoice["total"], 118.0);
    assert_eq!(invoice["status"], "pending");
    assert_eq!(invoice["amount_paid"], 0.0);

    assert_eq!(app.due_for("9800000001").await, 118.0);

    app.cleanup().await;
}

#[tokio::test]
async fn second_sale_carries_the_rolling_balance_forward() {
    let app = TestApp::spawn().await;
    let soap = app.seed_product("Soap", 50.0, 18.0, 100).await;
    let rice = app.seed_product("Rice", 50.0, 0.0, 100).await;
    app.seed_customer("Asha", "9800000002").await;

    app.create_invoice("9800000002", &soap, 2, 50.0).await;
    let second = app.create_invoice("9800000002", &rice, 1, 50.0).await;

    assert_eq!(second["current_total"], 50.0);
    assert_eq!(second["previous_due"], 118.0);
    assert_eq!(second["total"], 168.0);

    assert_eq!(app.due_for("9800000002").await, 168.0);

    app.cleanup().await;
}

#[tokio::test]
async fn partial_payment_reduces_balance_but_leaves_invoices_pending() {
    let app = TestApp::spawn().await;
    let soap = app.seed_product("Soap", 50.0, 18.0, 100).await;
    let rice = app.seed_product("Rice", 50.0, 0.0, 100).await;
    app.seed_customer("Asha", "9800000003").await;

    app.create_invoice("9800000003", &soap, 2, 50.0).await;
    app.create_invoice("9800000003", &rice, 1, 50.0).await;

    let response = app
        .patch(
            &format!("/customers/{}/amount", "9800000003"),
            &json!({ "amount": 100.0 }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["previous"], 168.0);
    assert_eq!(body["amount"], 100.0);
    assert_eq!(body["current"], 68.0);

    // A partial payment never flips invoice statuses.
    let search = app
        .get("/invoices/by-customer/search?phone=9800000003")
        .await;
    let body: Value = search.json().await.unwrap();
    assert_eq!(body["pending"].as_array().unwrap().len(), 2);
    assert_eq!(body["paid"].as_array().unwrap().len(), 0);

    assert_eq!(app.due_for("9800000003").await, 68.0);

    app.cleanup().await;
}

#[tokio::test]
async fn clearing_the_balance_cascades_all_pending_invoices_to_paid() {
    let app = TestApp::spawn().await;
    let soap = app.seed_product("Soap", 50.0, 18.0, 100).await;
    let rice = app.seed_product("Rice", 50.0, 0.0, 100).await;
    app.seed_customer("Asha", "9800000004").await;

    app.create_invoice("9800000004", &soap, 2, 50.0).await;
    app.create_invoice("9800000004", &rice, 1, 50.0).await;

    app.patch("/customers/9800000004/amount", &json!({ "amount": 100.0 }))
        .await;
    let response = app
        .patch("/customers/9800000004/amount", &json!({ "amount": 68.0 }))
        .await;
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["previous"], 68.0);
    assert_eq!(body["current"], 0.0);

    assert_eq!(app.due_for("9800000004").await, 0.0);

    let search = app
        .get("/invoices/by-customer/search?phone=9800000004")
        .await;
    let body: Value = search.json().await.unwrap();
    assert_eq!(body["pending"].as_array().unwrap().len(), 0);
    let paid = body["paid"].as_array().unwrap();
    assert_eq!(paid.len(), 2);
    // Each cascaded invoice books its own charge as the payment.
    for invoice in paid {
        assert_eq!(invoice["status"], "paid");
        assert_eq!(invoice["amount_paid"], invoice["current_total"]);
        assert!(invoice["paid_at"].is_string());
    }

    app.cleanup().await;
}

#[tokio::test]
async fn marking_newest_invoice_paid_settles_the_whole_account() {
    let app = TestApp::spawn().await;
    let soap = app.seed_product("Soap", 50.0, 18.0, 100).await;
    let rice = app.seed_product("Rice", 50.0, 0.0, 100).await;
    app.seed_customer("Asha", "9800000005").await;

    app.create_invoice("9800000005", &soap, 2, 50.0).await;
    let second = app.create_invoice("9800000005", &rice, 1, 50.0).await;
    let second_id = second["id"].as_str().unwrap();

    let response = app
        .patch(
            &format!("/invoices/{}/status", second_id),
            &json!({ "status": "paid" }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "paid");
    // The invoice's own money fields stay frozen.
    assert_eq!(body["previous_due"], 118.0);
    assert_eq!(body["total"], 168.0);

    assert_eq!(app.due_for("9800000005").await, 0.0);

    let search = app
        .get("/invoices/by-customer/search?phone=9800000005")
        .await;
    let body: Value = search.json().await.unwrap();
    assert_eq!(body["pending"].as_array().unwrap().len(), 0);
    assert_eq!(body["paid"].as_array().unwrap().len(), 2);

    // A single payment for the full rolling balance lands in the log.
    let transactions = app.get("/transactions").await;
    let records: Vec<Value> = transactions.json().await.unwrap();
    let payments: Vec<&Value> = records
        .iter()
        .filter(|r| r["kind"] == "payment")
        .collect();
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0]["amount"], 168.0);

    app.cleanup().await;
}

#[tokio::test]
async fn overpayment_clamps_the_balance_at_zero() {
    let app = TestApp::spawn().await;
    let soap = app.seed_product("Soap", 50.0, 18.0, 100).await;
    app.seed_customer("Asha", "9800000006").await;

    app.create_invoice("9800000006", &soap, 2, 50.0).await;

    let response = app
        .patch("/customers/9800000006/amount", &json!({ "amount": 500.0 }))
        .await;
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["previous"], 118.0);
    assert_eq!(body["current"], 0.0);

    assert_eq!(app.due_for("9800000006").await, 0.0);

    app.cleanup().await;
}

#[tokio::test]
async fn settling_an_unknown_phone_returns_404() {
    let app = TestApp::spawn().await;

    let response = app
        .patch("/customers/0000000000/amount", &json!({ "amount": 10.0 }))
        .await;
    assert_eq!(response.status().as_u16(), 404);

    app.cleanup().await;
}

#[tokio::test]
async fn settle_rejects_non_positive_amounts() {
    let app = TestApp::spawn().await;
    app.seed_customer("Asha", "9800000007").await;

    let response = app
        .patch("/customers/9800000007/amount", &json!({ "amount": 0.0 }))
        .await;
    assert_eq!(response.status().as_u16(), 400);

    let response = app
        .patch("/customers/9800000007/amount", &json!({ "amount": -5.0 }))
        .await;
    assert_eq!(response.status().as_u16(), 400);

    app.cleanup().await;
}

#[tokio::test]
async fn duplicate_submissions_create_two_invoices() {
    // Invoice creation is deliberately not idempotent.
    let app = TestApp::spawn().await;
    let soap = app.seed_product("Soap", 50.0, 18.0, 100).await;
    app.seed_customer("Asha", "9800000008").await;

    let first = app.create_invoice("9800000008", &soap, 2, 50.0).await;
    let second = app.create_invoice("9800000008", &soap, 2, 50.0).await;

    assert_ne!(first["id"], second["id"]);
    assert_eq!(second["previous_due"], 118.0);
    assert_eq!(app.due_for("9800000008").await, 236.0);

    app.cleanup().await;
}

#[tokio::test]
async fn repeated_identical_payments_each_reduce_the_balance() {
    // Settlement is not idempotent: a double-submitted payment is applied
    // twice.
    let app = TestApp::spawn().await;
    let soap = app.seed_product("Soap", 50.0, 18.0, 100).await;
    app.seed_customer("Asha", "9800000010").await;

    app.create_invoice("9800000010", &soap, 2, 50.0).await;

    let first = app
        .patch("/customers/9800000010/amount", &json!({ "amount": 30.0 }))
        .await;
    let body: Value = first.json().await.unwrap();
    assert_eq!(body["previous"], 118.0);
    assert_eq!(body["current"], 88.0);

    let second = app
        .patch("/customers/9800000010/amount", &json!({ "amount": 30.0 }))
        .await;
    let body: Value = second.json().await.unwrap();
    assert_eq!(body["previous"], 88.0);
    assert_eq!(body["current"], 58.0);

    // The balance dropped by both payments, and both were booked.
    assert_eq!(app.due_for("9800000010").await, 58.0);
    let stats: Value = app.get("/invoices/owner-stats").await.json().await.unwrap();
    assert_eq!(stats["total_received"], 60.0);

    app.cleanup().await;
}

#[tokio::test]
async fn invoice_totals_stay_frozen_after_later_payments() {
    let app = TestApp::spawn().await;
    let soap = app.seed_product("Soap", 50.0, 18.0, 100).await;
    let rice = app.seed_product("Rice", 50.0, 0.0, 100).await;
    app.seed_customer("Asha", "9800000009").await;

    app.create_invoice("9800000009", &soap, 2, 50.0).await;
    let second = app.create_invoice("9800000009", &rice, 1, 50.0).await;
    let second_id = second["id"].as_str().unwrap().to_string();

    app.patch("/customers/9800000009/amount", &json!({ "amount": 168.0 }))
        .await;

    let response = app.get(&format!("/invoices/{}", second_id)).await;
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["previous_due"], 118.0);
    assert_eq!(body["total"], 168.0);
    assert_eq!(body["status"], "paid");

    app.cleanup().await;
}

#[tokio::test]
async fn walk_in_sale_without_phone_touches_no_balance() {
    let app = TestApp::spawn().await;
    let soap = app.seed_product("Soap", 50.0, 18.0, 100).await;

    let response = app
        .post(
            "/invoices",
            &json!({
                "items": [{ "product_id": soap, "qty": 1, "unit_price": 50.0 }],
            }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 201);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["previous_due"], 0.0);
    assert_eq!(body["total"], 59.0);
    assert!(body["customer_phone"].is_null());

    app.cleanup().await;
}
