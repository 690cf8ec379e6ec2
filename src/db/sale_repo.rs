// src/db/sale_repo.rs

use std::sync::Arc;

use serde_json::{json, Map};
use uuid::Uuid;

use super::{from_doc, from_docs, to_doc};
use crate::{
    common::error::AppError,
    models::sales::{Sale, SaleStatus},
    store::{collections, ConditionalUpdate, DocumentStore, Filter, Query, SortOrder},
};

/// Resultado da tentativa de anulação. O fetch-and-set condicional do
/// adaptador garante que só UMA requisição ganha a transição — a segunda
/// encontra o guard violado.
#[derive(Debug)]
pub enum VoidClaim {
    /// A venda anulada, com os itens originais para restaurar o estoque.
    Voided(Sale),
    AlreadyVoided,
    Missing,
}

#[derive(Clone)]
pub struct SaleRepository {
    store: Arc<dyn DocumentStore>,
}

impl SaleRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self, limit: usize) -> Result<Vec<Sale>, AppError> {
        let docs = self
            .store
            .find(
                collections::SALES,
                Query::all().sort("date", SortOrder::Desc).limit(limit),
            )
            .await?;
        from_docs(docs)
    }

    pub async fn list_by_customer(
        &self,
        customer_id: Uuid,
        limit: usize,
    ) -> Result<Vec<Sale>, AppError> {
        let docs = self
            .store
            .find(
                collections::SALES,
                Query::filtered(Filter::new().eq("customerId", customer_id.to_string()))
                    .sort("date", SortOrder::Desc)
                    .limit(limit),
            )
            .await?;
        from_docs(docs)
    }

    pub async fn find(&self, id: Uuid) -> Result<Option<Sale>, AppError> {
        let doc = self
            .store
            .find_by_id(collections::SALES, &id.to_string())
            .await?;
        doc.map(from_doc).transpose()
    }

    pub async fn insert(&self, sale: &Sale) -> Result<(), AppError> {
        self.store.insert(collections::SALES, to_doc(sale)?).await?;
        Ok(())
    }

    /// Transição completed/pending -> voided em um único passo condicional.
    pub async fn claim_void(&self, id: Uuid) -> Result<VoidClaim, AppError> {
        let guard = Filter::new().ne("status", SaleStatus::Voided.as_str());
        let mut fields = Map::new();
        fields.insert("status".into(), json!(SaleStatus::Voided.as_str()));

        let outcome = self
            .store
            .set_fields_if(collections::SALES, &id.to_string(), &guard, fields)
            .await?;
        Ok(match outcome {
            ConditionalUpdate::Updated(doc) => VoidClaim::Voided(from_doc(doc)?),
            ConditionalUpdate::Rejected(_) => VoidClaim::AlreadyVoided,
            ConditionalUpdate::NotFound => VoidClaim::Missing,
        })
    }
}
