use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use mongodb::bson::DateTime;
use service_core::error::AppError;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::customers::{
        CustomerListQuery, CustomerResponse, DeleteCustomerResponse, DeletedCounts, SettleRequest,
        SettleResponse, UpsertCustomerRequest,
    },
    models::Customer,
    AppState,
};

/// List or search customers by name, company or phone fragment.
pub async fn list_customers(
    State(state): State<AppState>,
    Query(query): Query<CustomerListQuery>,
) -> Result<Json<Vec<CustomerResponse>>, AppError> {
    let q = query.q.unwrap_or_default();
    let q = q.trim();
    let customers = state
        .repository
        .search_customers(if q.is_empty() { None } else { Some(q) }, 20)
        .await
        .map_err(AppError::DatabaseError)?;
    Ok(Json(customers.into_iter().map(CustomerResponse::from).collect()))
}

/// Create a customer; when a phone is given this is an upsert keyed on it,
/// so re-registering a walk-in keeps their balance.
#[tracing::instrument(skip(state, payload))]
pub async fn upsert_customer(
    State(state): State<AppState>,
    Json(payload): Json<UpsertCustomerRequest>,
) -> Result<(StatusCode, Json<CustomerResponse>), AppError> {
    payload.validate()?;
    let payload = payload.normalized();

    let customer = match payload.phone.as_deref() {
        Some(phone) => state
            .repository
            .upsert_customer_by_phone(
                phone,
                &payload.name,
                payload.company_name.as_deref(),
                payload.address.as_deref(),
            )
            .await
            .map_err(AppError::DatabaseError)?,
        None => {
            let now = DateTime::now();
            state
                .repository
                .insert_customer(Customer {
                    id: Uuid::new_v4(),
                    name: payload.name,
                    company_name: payload.company_name,
                    phone: None,
                    address: payload.address,
                    balance_due: 0.0,
                    due_since: None,
                    created_at: now,
                    updated_at: now,
                })
                .await
                .map_err(AppError::DatabaseError)?
        }
    };

    Ok((StatusCode::CREATED, Json(CustomerResponse::from(customer))))
}

/// Customers that still owe money.
pub async fn pending_customers(
    State(state): State<AppState>,
) -> Result<Json<Vec<CustomerResponse>>, AppError> {
    let customers = state
        .repository
        .customers_with_pending_balance(200)
        .await
        .map_err(AppError::DatabaseError)?;
    Ok(Json(customers.into_iter().map(CustomerResponse::from).collect()))
}

/// Apply a partial payment against the customer's rolling balance.
#[tracing::instrument(skip(state, payload), fields(phone = %phone))]
pub async fn settle_amount(
    State(state): State<AppState>,
    Path(phone): Path<String>,
    Json(payload): Json<SettleRequest>,
) -> Result<Json<SettleResponse>, AppError> {
    payload.validate()?;
    let outcome = state
        .settlement
        .settle_balance(&phone, payload.amount)
        .await?;
    Ok(Json(SettleResponse {
        phone: outcome.phone,
        previous: outcome.previous,
        amount: outcome.amount,
        current: outcome.current,
    }))
}

/// Delete a customer and their related records; blocked while a balance
/// is outstanding.
#[tracing::instrument(skip(state), fields(customer_id = %id))]
pub async fn delete_customer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeleteCustomerResponse>, AppError> {
    let deletion = state.settlement.delete_customer(id).await?;
    Ok(Json(DeleteCustomerResponse {
        ok: true,
        deleted: DeletedCounts {
            customer: 1,
            invoices: deletion.invoices,
            transactions: deletion.transactions,
        },
    }))
}
