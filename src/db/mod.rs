// src/db/mod.rs

mod audit_repo;
mod catalog_repo;
mod crm_repo;
mod purchasing_repo;
mod quote_repo;
mod sale_repo;
mod user_repo;
mod warehouse_repo;

pub use audit_repo::AuditRepository;
pub use catalog_repo::{CatalogRepository, StockTake};
pub use crm_repo::CrmRepository;
pub use purchasing_repo::{PurchasingRepository, StatusClaim};
pub use quote_repo::{ConvertClaim, QuoteRepository};
pub use sale_repo::{SaleRepository, VoidClaim};
pub use user_repo::UserRepository;
pub use warehouse_repo::WarehouseRepository;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::common::error::AppError;
use crate::store::Document;

// Conversões entre os structs de domínio e os documentos JSON do adaptador.
// Toda a (de)serialização acontece na fronteira dos repositórios; os
// serviços só enxergam tipos.

pub(crate) fn to_doc<T: Serialize>(value: &T) -> Result<Document, AppError> {
    Ok(serde_json::to_value(value)?)
}

pub(crate) fn from_doc<T: DeserializeOwned>(doc: Document) -> Result<T, AppError> {
    Ok(serde_json::from_value(doc)?)
}

pub(crate) fn from_docs<T: DeserializeOwned>(docs: Vec<Document>) -> Result<Vec<T>, AppError> {
    docs.into_iter().map(from_doc).collect()
}
