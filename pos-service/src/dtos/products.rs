use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::fmt_datetime;
use crate::models::Product;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    pub brand: Option<String>,
    #[validate(range(exclusive_min = 0.0, message = "selling_price must be positive"))]
    pub selling_price: f64,
    #[validate(range(min = 0.0, message = "cost_price cannot be negative"))]
    pub cost_price: Option<f64>,
    #[validate(range(min = 0.0, max = 100.0, message = "tax_percent must be 0..=100"))]
    pub tax_percent: Option<f64>,
    #[validate(range(min = 0, message = "quantity cannot be negative"))]
    pub quantity: Option<i64>,
    pub active: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, message = "name cannot be empty"))]
    pub name: Option<String>,
    pub brand: Option<String>,
    #[validate(range(exclusive_min = 0.0, message = "selling_price must be positive"))]
    pub selling_price: Option<f64>,
    #[validate(range(min = 0.0, message = "cost_price cannot be negative"))]
    pub cost_price: Option<f64>,
    #[validate(range(min = 0.0, max = 100.0, message = "tax_percent must be 0..=100"))]
    pub tax_percent: Option<f64>,
    #[validate(range(min = 0, message = "quantity cannot be negative"))]
    pub quantity: Option<i64>,
    pub active: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddStockRequest {
    #[validate(range(min = 1, message = "quantity must be > 0"))]
    pub quantity: i64,
}

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub id: Uuid,
    pub name: String,
    pub brand: Option<String>,
    pub selling_price: f64,
    pub cost_price: f64,
    pub tax_percent: f64,
    pub quantity: i64,
    pub active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Product> for ProductResponse {
    fn from(p: Product) -> Self {
        Self {
            id: p.id,
            name: p.name,
            brand: p.brand,
            selling_price: p.selling_price,
            cost_price: p.cost_price,
            tax_percent: p.tax_percent,
            quantity: p.quantity,
            active: p.active,
            created_at: fmt_datetime(p.created_at),
            updated_at: fmt_datetime(p.updated_at),
        }
    }
}
