//! Request/response shapes for the REST API.
//!
//! Requests are validated with `validator` derives at the boundary;
//! responses render timestamps as RFC3339 strings.

pub mod customers;
pub mod invoices;
pub mod products;
pub mod transactions;

use mongodb::bson::DateTime;

pub(crate) fn fmt_datetime(dt: DateTime) -> String {
    dt.try_to_rfc3339_string().unwrap_or_default()
}
