use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::fmt_datetime;
use crate::models::Customer;

#[derive(Debug, Deserialize, Validate)]
pub struct UpsertCustomerRequest {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    pub company_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl UpsertCustomerRequest {
    /// Trim whitespace on every field; empty optionals collapse to None.
    pub fn normalized(self) -> Self {
        let clean = |s: Option<String>| {
            s.map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        Self {
            name: self.name.trim().to_string(),
            company_name: clean(self.company_name),
            phone: clean(self.phone),
            address: clean(self.address),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct SettleRequest {
    #[validate(range(exclusive_min = 0.0, message = "amount must be positive"))]
    pub amount: f64,
}

#[derive(Debug, Serialize)]
pub struct SettleResponse {
    pub phone: String,
    pub previous: f64,
    pub amount: f64,
    pub current: f64,
}

#[derive(Debug, Deserialize)]
pub struct CustomerListQuery {
    pub q: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CustomerResponse {
    pub id: Uuid,
    pub name: String,
    pub company_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub balance_due: f64,
    pub due_since: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Customer> for CustomerResponse {
    fn from(c: Customer) -> Self {
        Self {
            id: c.id,
            name: c.name,
            company_name: c.company_name,
            phone: c.phone,
            address: c.address,
            balance_due: c.balance_due,
            due_since: c.due_since.map(fmt_datetime),
            created_at: fmt_datetime(c.created_at),
            updated_at: fmt_datetime(c.updated_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeletedCounts {
    pub customer: u64,
    pub invoices: u64,
    pub transactions: u64,
}

#[derive(Debug, Serialize)]
pub struct DeleteCustomerResponse {
    pub ok: bool,
    pub deleted: DeletedCounts,
}
