use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};

/// Fixed `_id` of the singleton aggregate document.
pub const OWNER_STATS_ID: &str = "owner";

/// Owner-wide denormalized totals, updated in lockstep with customer
/// balances and invoice status. Created lazily on first read or write.
///
/// Intended (not strictly enforced) invariant:
/// `total_pending ≈ total_amount - total_received`, clamped at 0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnerStats {
    #[serde(rename = "_id")]
    pub id: String,
    pub total_bills: i64,
    /// Sum of every invoice's `current_total` ever billed.
    pub total_amount: f64,
    pub total_received: f64,
    pub total_pending: f64,
    pub updated_at: DateTime,
}
