// src/models/quotes.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::sales::{SaleItem, SaleItemPayload};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum QuoteStatus {
    Pending,
    Approved,
    Rejected,
    Converted,
}

impl QuoteStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            QuoteStatus::Pending => "pending",
            QuoteStatus::Approved => "approved",
            QuoteStatus::Rejected => "rejected",
            QuoteStatus::Converted => "converted",
        }
    }
}

// Orçamento: lista de itens precificada, sem reserva de estoque. Quando
// convertido, guarda a referência da venda gerada — e nunca converte de novo.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub items: Vec<SaleItem>,
    pub validity_days: i64,
    pub notes: Option<String>,
    pub seller_id: Uuid,
    pub seller_name: String,
    pub total: Decimal,
    pub status: QuoteStatus,
    pub converted_sale_id: Option<Uuid>,
    pub date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

fn default_validity_days() -> i64 {
    15
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuotePayload {
    pub customer_id: Uuid,

    #[validate(length(min = 1, message = "O orçamento precisa de ao menos um item."), nested)]
    pub items: Vec<SaleItemPayload>,

    #[validate(range(min = 1, message = "A validade deve ser de ao menos 1 dia."))]
    #[serde(default = "default_validity_days")]
    pub validity_days: i64,

    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuotePayload {
    pub status: Option<QuoteStatus>,
}

// Resposta da conversão: o orçamento marcado e a venda recém-criada.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConvertedQuote {
    pub quote: Quote,
    pub sale: super::sales::Sale,
}
