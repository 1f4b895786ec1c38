use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use mongodb::bson::{doc, DateTime, Document};
use service_core::error::AppError;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::products::{
        AddStockRequest, CreateProductRequest, ProductResponse, UpdateProductRequest,
    },
    models::Product,
    AppState,
};

pub async fn list_products(
    State(state): State<AppState>,
) -> Result<Json<Vec<ProductResponse>>, AppError> {
    let products = state
        .repository
        .list_products()
        .await
        .map_err(AppError::DatabaseError)?;
    Ok(Json(products.into_iter().map(ProductResponse::from).collect()))
}

#[tracing::instrument(skip(state, payload))]
pub async fn create_product(
    State(state): State<AppState>,
    Json(payload): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductResponse>), AppError> {
    payload.validate()?;
    let now = DateTime::now();
    let product = state
        .repository
        .insert_product(Product {
            id: Uuid::new_v4(),
            name: payload.name.trim().to_string(),
            brand: payload.brand,
            selling_price: payload.selling_price,
            cost_price: payload.cost_price.unwrap_or(0.0),
            tax_percent: payload.tax_percent.unwrap_or(0.0),
            quantity: payload.quantity.unwrap_or(0),
            active: payload.active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        })
        .await
        .map_err(AppError::DatabaseError)?;
    Ok((StatusCode::CREATED, Json(ProductResponse::from(product))))
}

pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProductRequest>,
) -> Result<Json<ProductResponse>, AppError> {
    payload.validate()?;

    let mut set = Document::new();
    if let Some(name) = payload.name {
        set.insert("name", name.trim());
    }
    if let Some(brand) = payload.brand {
        set.insert("brand", brand);
    }
    if let Some(selling_price) = payload.selling_price {
        set.insert("selling_price", selling_price);
    }
    if let Some(cost_price) = payload.cost_price {
        set.insert("cost_price", cost_price);
    }
    if let Some(tax_percent) = payload.tax_percent {
        set.insert("tax_percent", tax_percent);
    }
    if let Some(quantity) = payload.quantity {
        set.insert("quantity", quantity);
    }
    if let Some(active) = payload.active {
        set.insert("active", active);
    }
    if set.is_empty() {
        return Err(AppError::BadRequest(anyhow::anyhow!("No fields to update")));
    }

    let product = state
        .repository
        .update_product(id, set)
        .await
        .map_err(AppError::DatabaseError)?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Product not found")))?;
    Ok(Json(ProductResponse::from(product)))
}

/// Receive stock: atomic increment, never a read-modify-write.
pub async fn add_stock(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddStockRequest>,
) -> Result<Json<ProductResponse>, AppError> {
    payload.validate()?;
    let product = state
        .repository
        .add_stock(id, payload.quantity)
        .await
        .map_err(AppError::DatabaseError)?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Product not found")))?;
    Ok(Json(ProductResponse::from(product)))
}

pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state
        .repository
        .delete_product(id)
        .await
        .map_err(AppError::DatabaseError)?;
    Ok(StatusCode::NO_CONTENT)
}
