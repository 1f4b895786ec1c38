use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Pending,
    Paid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMode {
    Cash,
    Upi,
    Card,
}

impl Default for PaymentMode {
    fn default() -> Self {
        PaymentMode::Upi
    }
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Pending => "pending",
            InvoiceStatus::Paid => "paid",
        }
    }
}

impl PaymentMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMode::Cash => "cash",
            PaymentMode::Upi => "upi",
            PaymentMode::Card => "card",
        }
    }
}

/// One priced line of an invoice, frozen at creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceItem {
    pub product_id: Uuid,
    pub name_snapshot: String,
    pub qty: i64,
    pub unit_price: f64,
    pub tax_percent: f64,
    pub line_total: f64,
}

/// An invoice: immutable snapshot of a sale plus mutable settlement fields.
///
/// `current_total` is this invoice's own charge; `total` additionally bakes
/// in the due that existed before this invoice. `total` is frozen at
/// creation and never recomputed after payments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    #[serde(rename = "_id")]
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
    /// Adjustment applied so the displayed total is a whole currency unit.
    pub rounding: f64,
    pub current_total: f64,
    /// Customer's rolling due before this invoice, snapshotted.
    pub previous_due: f64,
    pub previous_due_since: Option<DateTime>,
    pub total: f64,
    pub payment_mode: PaymentMode,
    pub payment_ref: Option<String>,
    pub status: InvoiceStatus,
    /// Only ever increases.
    pub amount_paid: f64,
    pub paid_at: Option<DateTime>,
    /// Whether the best-effort invoice notification went out.
    pub notified: bool,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl Invoice {
    pub fn is_paid(&self) -> bool {
        self.status == InvoiceStatus::Paid
    }

    /// The amount a cascade settlement records for this invoice: an already
    /// recorded payment wins, otherwise the invoice's own charge.
    pub fn effective_amount_paid(&self) -> f64 {
        if self.amount_paid > 0.0 {
            self.amount_paid
        } else {
            self.current_total
        }
    }
}
