// src/models/sales.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::validate_not_negative;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SaleStatus {
    Completed,
    Pending,
    Voided,
}

impl SaleStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            SaleStatus::Completed => "completed",
            SaleStatus::Pending => "pending",
            SaleStatus::Voided => "voided",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Card,
    Transfer,
}

// Linha de venda. O nome do produto é um snapshot do momento da venda.
// O subtotal vem do chamador e é a fonte do total — não é recalculado a
// partir de preço × quantidade.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaleItem {
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: Uuid,
    pub customer_id: Option<Uuid>,
    pub items: Vec<SaleItem>,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
    pub seller_id: Uuid,
    pub seller_name: String,
    pub total: Decimal,
    pub status: SaleStatus,
    pub date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaleItemPayload {
    pub product_id: Uuid,

    #[validate(range(min = 1, message = "A quantidade deve ser no mínimo 1."))]
    pub quantity: i64,

    #[validate(custom(function = "validate_not_negative"))]
    pub unit_price: Decimal,

    #[validate(custom(function = "validate_not_negative"))]
    pub subtotal: Decimal,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSalePayload {
    pub customer_id: Option<Uuid>,

    #[validate(length(min = 1, message = "A venda precisa de ao menos um item."), nested)]
    pub items: Vec<SaleItemPayload>,

    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
}
