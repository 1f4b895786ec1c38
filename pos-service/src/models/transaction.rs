use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Payment,
    Sale,
}

/// Append-only log entry for display. Not authoritative: balances and
/// owner totals are maintained on their own documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRecord {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub kind: TransactionKind,
    pub amount: f64,
    pub customer_id: Uuid,
    /// Snapshots for display so the log survives customer edits.
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub date: DateTime,
}
