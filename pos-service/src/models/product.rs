use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Catalog entry with a stock count.
///
/// Invariant: `quantity >= 0`; decremented atomically at invoice creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub brand: Option<String>,
    pub selling_price: f64,
    pub cost_price: f64,
    pub tax_percent: f64,
    pub quantity: i64,
    pub active: bool,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}
