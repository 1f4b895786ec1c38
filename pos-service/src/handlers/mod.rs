//! HTTP handlers, one module per resource.

pub mod customers;
pub mod invoices;
pub mod products;
pub mod transactions;

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::services::render_metrics;

pub async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "service": "pos-service",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

pub async fn metrics() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        render_metrics(),
    )
}
