// src/models/catalog.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::validate_not_negative;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

// O produto carrega o saldo agregado legado (`stock`) além das linhas por
// depósito na coleção `product_stock`. Invariante: `stock >= 0` sempre —
// quem garante é o decremento condicional do adaptador, nunca o chamador.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub barcode: Option<String>,
    pub category_id: Option<Uuid>,
    pub retail_price: Decimal,
    pub wholesale_price: Decimal,
    pub stock: i64,
    pub min_stock: i64,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategoryPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,

    pub description: Option<String>,
    pub barcode: Option<String>,
    pub category_id: Option<Uuid>,

    #[validate(custom(function = "validate_not_negative"))]
    pub retail_price: Decimal,

    #[validate(custom(function = "validate_not_negative"))]
    pub wholesale_price: Decimal,

    #[validate(range(min = 0, message = "O estoque não pode ser negativo."))]
    #[serde(default)]
    pub stock: i64,

    #[validate(range(min = 0, message = "O estoque mínimo não pode ser negativo."))]
    #[serde(default)]
    pub min_stock: i64,

    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: Option<String>,

    pub description: Option<String>,
    pub barcode: Option<String>,
    pub category_id: Option<Uuid>,

    #[validate(custom(function = "validate_not_negative"))]
    pub retail_price: Option<Decimal>,

    #[validate(custom(function = "validate_not_negative"))]
    pub wholesale_price: Option<Decimal>,

    #[validate(range(min = 0, message = "O estoque não pode ser negativo."))]
    pub stock: Option<i64>,

    #[validate(range(min = 0, message = "O estoque mínimo não pode ser negativo."))]
    pub min_stock: Option<i64>,

    pub image_url: Option<String>,
}
