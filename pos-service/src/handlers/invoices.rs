use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::invoices::{
        BulkDeleteInvoicesRequest, BulkDeleteInvoicesResponse, CreateInvoiceRequest,
        CustomerInvoicesResponse, CustomerSearchQuery, DueQuery, DueResponse, HardResetResponse,
        InvoiceResponse, OwnerStatsResponse, UpdateInvoiceStatusRequest,
    },
    dtos::fmt_datetime,
    AppState,
};

/// Create a pending invoice for a sale.
#[tracing::instrument(skip(state, payload))]
pub async fn create_invoice(
    State(state): State<AppState>,
    Json(payload): Json<CreateInvoiceRequest>,
) -> Result<(StatusCode, Json<InvoiceResponse>), AppError> {
    payload.validate()?;
    let invoice = state.settlement.create_invoice(payload).await?;
    Ok((StatusCode::CREATED, Json(InvoiceResponse::from(invoice))))
}

/// Most recent invoices, newest first.
pub async fn list_invoices(
    State(state): State<AppState>,
) -> Result<Json<Vec<InvoiceResponse>>, AppError> {
    let invoices = state
        .repository
        .list_recent_invoices(100)
        .await
        .map_err(AppError::DatabaseError)?;
    Ok(Json(invoices.into_iter().map(InvoiceResponse::from).collect()))
}

pub async fn get_invoice(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<InvoiceResponse>, AppError> {
    let invoice = state
        .repository
        .find_invoice(id)
        .await
        .map_err(AppError::DatabaseError)?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Not found")))?;
    Ok(Json(InvoiceResponse::from(invoice)))
}

#[tracing::instrument(skip(state, payload), fields(invoice_id = %id))]
pub async fn update_invoice_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateInvoiceStatusRequest>,
) -> Result<Json<InvoiceResponse>, AppError> {
    payload.validate()?;
    let invoice = state.settlement.change_invoice_status(id, payload).await?;
    Ok(Json(InvoiceResponse::from(invoice)))
}

/// The customer's current rolling due, looked up by phone.
pub async fn customer_due(
    State(state): State<AppState>,
    Query(query): Query<DueQuery>,
) -> Result<Json<DueResponse>, AppError> {
    let phone = query.phone.unwrap_or_default().trim().to_string();
    let customer = state
        .repository
        .find_customer_by_phone(&phone)
        .await
        .map_err(AppError::DatabaseError)?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Customer not found")))?;
    Ok(Json(DueResponse {
        phone,
        due: customer.balance_due,
        previous_due_date: customer.due_since.map(fmt_datetime),
    }))
}

/// Invoices for one customer, grouped by settlement status.
pub async fn search_customer_invoices(
    State(state): State<AppState>,
    Query(query): Query<CustomerSearchQuery>,
) -> Result<Json<CustomerInvoicesResponse>, AppError> {
    let phone = query.phone.unwrap_or_default().trim().to_string();
    let name = query.name.unwrap_or_default();
    let company = query.company.unwrap_or_default();
    if phone.is_empty() && name.trim().is_empty() && company.trim().is_empty() {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Provide phone, name, or company to search"
        )));
    }

    let invoices = state
        .repository
        .invoices_by_phone(&phone)
        .await
        .map_err(AppError::DatabaseError)?;
    let (paid, pending): (Vec<_>, Vec<_>) = invoices.into_iter().partition(|inv| inv.is_paid());
    Ok(Json(CustomerInvoicesResponse {
        paid: paid.into_iter().map(InvoiceResponse::from).collect(),
        pending: pending.into_iter().map(InvoiceResponse::from).collect(),
    }))
}

pub async fn owner_stats(
    State(state): State<AppState>,
) -> Result<Json<OwnerStatsResponse>, AppError> {
    let owner = state
        .repository
        .get_or_create_owner_stats()
        .await
        .map_err(AppError::DatabaseError)?;
    Ok(Json(OwnerStatsResponse {
        total_bills: owner.total_bills,
        total_amount: owner.total_amount,
        total_received: owner.total_received,
        total_pending: owner.total_pending,
    }))
}

pub async fn reset_owner_stats(
    State(state): State<AppState>,
) -> Result<Json<OwnerStatsResponse>, AppError> {
    state
        .repository
        .reset_owner_stats()
        .await
        .map_err(AppError::DatabaseError)?;
    let owner = state
        .repository
        .get_or_create_owner_stats()
        .await
        .map_err(AppError::DatabaseError)?;
    Ok(Json(OwnerStatsResponse {
        total_bills: owner.total_bills,
        total_amount: owner.total_amount,
        total_received: owner.total_received,
        total_pending: owner.total_pending,
    }))
}

/// Destructive bulk wipe of all business data.
#[tracing::instrument(skip(state))]
pub async fn hard_reset(
    State(state): State<AppState>,
) -> Result<Json<HardResetResponse>, AppError> {
    state.settlement.hard_reset().await?;
    Ok(Json(HardResetResponse {
        ok: true,
        message: "All data wiped and owner totals reset".to_string(),
    }))
}

/// Bulk delete invoices; only paid invoices go, the rest are reported back.
pub async fn bulk_delete_invoices(
    State(state): State<AppState>,
    Json(payload): Json<BulkDeleteInvoicesRequest>,
) -> Result<Json<BulkDeleteInvoicesResponse>, AppError> {
    payload.validate()?;
    let found = state
        .repository
        .find_invoices_by_ids(&payload.ids)
        .await
        .map_err(AppError::DatabaseError)?;
    let (paid, skipped): (Vec<_>, Vec<_>) = found.into_iter().partition(|inv| inv.is_paid());
    let paid_ids: Vec<Uuid> = paid.into_iter().map(|inv| inv.id).collect();
    let deleted_count = if paid_ids.is_empty() {
        0
    } else {
        state
            .repository
            .delete_invoices_by_ids(&paid_ids)
            .await
            .map_err(AppError::DatabaseError)?
    };
    Ok(Json(BulkDeleteInvoicesResponse {
        deleted_count,
        skipped: skipped.into_iter().map(|inv| inv.id).collect(),
    }))
}
