use axum::{
    extract::{Query, State},
    Json,
};
use service_core::error::AppError;

use crate::{
    dtos::transactions::{
        DeleteAllTransactionsResponse, TransactionListQuery, TransactionResponse,
    },
    AppState,
};

/// Recent payment/sale log entries, newest first.
pub async fn list_transactions(
    State(state): State<AppState>,
    Query(query): Query<TransactionListQuery>,
) -> Result<Json<Vec<TransactionResponse>>, AppError> {
    let limit = query.limit.unwrap_or(50).clamp(1, 200);
    let records = state
        .repository
        .list_transactions(limit)
        .await
        .map_err(AppError::DatabaseError)?;
    Ok(Json(records.into_iter().map(TransactionResponse::from).collect()))
}

/// Wipe the display log. The log is not authoritative, so balances and
/// owner totals are untouched.
#[tracing::instrument(skip(state))]
pub async fn delete_all_transactions(
    State(state): State<AppState>,
) -> Result<Json<DeleteAllTransactionsResponse>, AppError> {
    let deleted_count = state
        .repository
        .wipe_transactions()
        .await
        .map_err(AppError::DatabaseError)?;
    Ok(Json(DeleteAllTransactionsResponse {
        ok: true,
        deleted_count,
    }))
}
