use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A customer with a rolling balance.
///
/// `balance_due` is the authoritative measure of debt; invoices are a
/// record of charges, not independently payable units. Invariant:
/// `balance_due >= 0`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub company_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub balance_due: f64,
    /// When the due balance last changed; cleared meaning is "no due".
    pub due_since: Option<DateTime>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}
