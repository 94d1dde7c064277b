//! Product Model
//!
//! The order core only needs the pricing and stock slice of the catalog;
//! everything else about products lives in the external catalog service.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Product row (catalog snapshot used for pricing and stock)
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: i64,
    pub name: String,
    /// Base unit price before any discount
    pub price: f64,
    /// Remaining sellable stock, mutated only by the inventory ledger
    pub stock: i64,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create product payload
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ProductCreate {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(range(min = 0.0))]
    pub price: f64,
    #[validate(range(min = 0))]
    pub stock: i64,
}
