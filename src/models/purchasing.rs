// src/models/purchasing.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::catalog::Product;
use super::sales::{SaleItem, SaleItemPayload};
use super::validate_not_negative;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Warehouse {
    pub id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub manager: Option<String>,
    pub phone: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

// Linha de estoque por depósito: única por par (produto, depósito).
// A soma das linhas de um produto deve bater com o agregado legado.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WarehouseStock {
    pub id: Uuid,
    pub product_id: Uuid,
    pub warehouse_id: Uuid,
    pub warehouse_name: String,
    pub quantity: i64,
    pub internal_location: Option<String>,
}

// Visão consolidada para a tela de produto.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductStock {
    pub product: Product,
    pub warehouses: Vec<WarehouseStock>,
    pub total: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Supplier {
    pub id: Uuid,
    pub name: String,
    pub contact: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub tax_id: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Preço de catálogo de um fornecedor para um produto; uma linha por par
// (produto, fornecedor), atualizada por upsert.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SupplierPrice {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub supplier_id: Uuid,
    pub supplier_name: String,
    pub price: Decimal,
    pub supplier_code: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PurchaseStatus {
    Pending,
    Received,
    // Estado previsto para recebimento parcial; nenhuma transição o produz
    // hoje.
    Partial,
    Cancelled,
}

impl PurchaseStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            PurchaseStatus::Pending => "pending",
            PurchaseStatus::Received => "received",
            PurchaseStatus::Partial => "partial",
            PurchaseStatus::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Purchase {
    pub id: Uuid,
    pub supplier_id: Uuid,
    pub supplier_name: String,
    pub warehouse_id: Uuid,
    pub warehouse_name: String,
    pub items: Vec<SaleItem>,
    pub invoice_number: Option<String>,
    pub notes: Option<String>,
    pub total: Decimal,
    pub status: PurchaseStatus,
    pub date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub received_by_id: Option<Uuid>,
    pub received_by_name: Option<String>,
    pub received_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateWarehousePayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,
    pub address: Option<String>,
    pub manager: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWarehousePayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: Option<String>,
    pub address: Option<String>,
    pub manager: Option<String>,
    pub phone: Option<String>,
    pub active: Option<bool>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSupplierPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,
    pub contact: Option<String>,

    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: Option<String>,

    pub phone: Option<String>,
    pub address: Option<String>,
    pub tax_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSupplierPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: Option<String>,
    pub contact: Option<String>,

    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: Option<String>,

    pub phone: Option<String>,
    pub address: Option<String>,
    pub tax_id: Option<String>,
    pub active: Option<bool>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpsertSupplierPricePayload {
    pub product_id: Uuid,
    pub supplier_id: Uuid,

    #[validate(custom(function = "validate_not_negative"))]
    pub price: Decimal,

    pub supplier_code: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePurchasePayload {
    pub supplier_id: Uuid,
    pub warehouse_id: Uuid,

    #[validate(length(min = 1, message = "A compra precisa de ao menos um item."), nested)]
    pub items: Vec<SaleItemPayload>,

    pub invoice_number: Option<String>,
    pub notes: Option<String>,
}
