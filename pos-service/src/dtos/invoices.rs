use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::fmt_datetime;
use crate::models::{Invoice, InvoiceItem, InvoiceStatus, PaymentMode};

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct InvoiceLineRequest {
    pub product_id: Uuid,
    #[validate(range(min = 1, message = "qty must be a positive integer"))]
    pub qty: i64,
    #[validate(range(exclusive_min = 0.0, message = "unit_price must be positive"))]
    pub unit_price: f64,
    /// Falls back to the product's tax_percent when absent.
    #[validate(range(min = 0.0, max = 100.0, message = "tax_percent must be 0..=100"))]
    pub tax_percent: Option<f64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateInvoiceRequest {
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_address: Option<String>,
    pub customer_company: Option<String>,
    #[validate(length(min = 1, message = "at least one item is required"), nested)]
    pub items: Vec<InvoiceLineRequest>,
    #[validate(range(min = 0.0, message = "discount cannot be negative"))]
    #[serde(default)]
    pub discount: f64,
    #[serde(default)]
    pub payment_mode: PaymentMode,
    /// Optional ISO snapshot of when the carried-forward due started.
    pub previous_due_since: Option<String>,
    #[serde(default)]
    pub auto_notify: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateInvoiceStatusRequest {
    pub status: InvoiceStatus,
    #[validate(range(min = 0.0, message = "amount_paid cannot be negative"))]
    pub amount_paid: Option<f64>,
    pub payment_ref: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct BulkDeleteInvoicesRequest {
    #[validate(length(min = 1, message = "ids array is required"))]
    pub ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct DueQuery {
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CustomerSearchQuery {
    pub phone: Option<String>,
    pub name: Option<String>,
    pub company: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct InvoiceResponse {
    pub id: Uuid,
    pub number: String,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_address: Option<String>,
    pub customer_company: Option<String>,
    pub items: Vec<InvoiceItem>,
    pub sub_total: f64,
    pub discount: f64,
    pub tax_total: f64,
    pub rounding: f64,
    pub current_total: f64,
    pub previous_due: f64,
    pub previous_due_since: Option<String>,
    pub total: f64,
    pub payment_mode: PaymentMode,
    pub payment_ref: Option<String>,
    pub status: InvoiceStatus,
    pub amount_paid: f64,
    pub paid_at: Option<String>,
    pub notified: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Invoice> for InvoiceResponse {
    fn from(inv: Invoice) -> Self {
        Self {
            id: inv.id,
            number: inv.number,
            customer_name: inv.customer_name,
            customer_phone: inv.customer_phone,
            customer_address: inv.customer_address,
            customer_company: inv.customer_company,
            items: inv.items,
            sub_total: inv.sub_total,
            discount: inv.discount,
            tax_total: inv.tax_total,
            rounding: inv.rounding,
            current_total: inv.current_total,
            previous_due: inv.previous_due,
            previous_due_since: inv.previous_due_since.map(fmt_datetime),
            total: inv.total,
            payment_mode: inv.payment_mode,
            payment_ref: inv.payment_ref,
            status: inv.status,
            amount_paid: inv.amount_paid,
            paid_at: inv.paid_at.map(fmt_datetime),
            notified: inv.notified,
            created_at: fmt_datetime(inv.created_at),
            updated_at: fmt_datetime(inv.updated_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CustomerInvoicesResponse {
    pub paid: Vec<InvoiceResponse>,
    pub pending: Vec<InvoiceResponse>,
}

#[derive(Debug, Serialize)]
pub struct DueResponse {
    pub phone: String,
    pub due: f64,
    pub previous_due_date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OwnerStatsResponse {
    pub total_bills: i64,
    pub total_amount: f64,
    pub total_received: f64,
    pub total_pending: f64,
}

#[derive(Debug, Serialize)]
pub struct BulkDeleteInvoicesResponse {
    pub deleted_count: u64,
    /// Ids that were skipped because the invoice is not paid.
    pub skipped: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct HardResetResponse {
    pub ok: bool,
    pub message: String,
}
