use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::fmt_datetime;
use crate::models::{TransactionKind, TransactionRecord};

#[derive(Debug, Deserialize)]
pub struct TransactionListQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    pub id: Uuid,
    pub kind: TransactionKind,
    pub amount: f64,
    pub customer_id: Uuid,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub date: String,
}

impl From<TransactionRecord> for TransactionResponse {
    fn from(t: TransactionRecord) -> Self {
        Self {
            id: t.id,
            kind: t.kind,
            amount: t.amount,
            customer_id: t.customer_id,
            customer_name: t.customer_name,
            customer_phone: t.customer_phone,
            date: fmt_datetime(t.date),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeleteAllTransactionsResponse {
    pub ok: bool,
    pub deleted_count: u64,
}
