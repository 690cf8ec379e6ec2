// src/db/quote_repo.rs

use std::sync::Arc;

use serde_json::{json, Map, Value};
use uuid::Uuid;

use super::{from_doc, from_docs, to_doc};
use crate::{
    common::error::AppError,
    models::quotes::{Quote, QuoteStatus},
    store::{collections, ConditionalUpdate, DocumentStore, Filter, Query, SortOrder},
};

/// Resultado da "reivindicação" de conversão: o guard compara o status com
/// o valor observado na leitura, então um concorrente que mudou o status no
/// meio do caminho aparece como `StatusChanged` (o chamador relê e decide).
#[derive(Debug)]
pub enum ConvertClaim {
    Claimed(Quote),
    StatusChanged,
    Missing,
}

#[derive(Clone)]
pub struct QuoteRepository {
    store: Arc<dyn DocumentStore>,
}

impl QuoteRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self, limit: usize) -> Result<Vec<Quote>, AppError> {
        let docs = self
            .store
            .find(
                collections::QUOTES,
                Query::all().sort("date", SortOrder::Desc).limit(limit),
            )
            .await?;
        from_docs(docs)
    }

    pub async fn find(&self, id: Uuid) -> Result<Option<Quote>, AppError> {
        let doc = self
            .store
            .find_by_id(collections::QUOTES, &id.to_string())
            .await?;
        doc.map(from_doc).transpose()
    }

    pub async fn insert(&self, quote: &Quote) -> Result<(), AppError> {
        self.store
            .insert(collections::QUOTES, to_doc(quote)?)
            .await?;
        Ok(())
    }

    pub async fn set_status(
        &self,
        id: Uuid,
        status: QuoteStatus,
    ) -> Result<Option<Quote>, AppError> {
        let mut fields = Map::new();
        fields.insert("status".into(), json!(status.as_str()));
        let doc = self
            .store
            .set_fields(collections::QUOTES, &id.to_string(), fields)
            .await?;
        doc.map(from_doc).transpose()
    }

    /// Marca o orçamento como convertido apontando para a venda `sale_id`,
    /// mas somente se o status ainda for o que o chamador observou.
    pub async fn claim_convert(
        &self,
        id: Uuid,
        observed: QuoteStatus,
        sale_id: Uuid,
    ) -> Result<ConvertClaim, AppError> {
        let guard = Filter::new().eq("status", observed.as_str());
        let mut fields = Map::new();
        fields.insert("status".into(), json!(QuoteStatus::Converted.as_str()));
        fields.insert("convertedSaleId".into(), json!(sale_id));

        let outcome = self
            .store
            .set_fields_if(collections::QUOTES, &id.to_string(), &guard, fields)
            .await?;
        Ok(match outcome {
            ConditionalUpdate::Updated(doc) => ConvertClaim::Claimed(from_doc(doc)?),
            ConditionalUpdate::Rejected(_) => ConvertClaim::StatusChanged,
            ConditionalUpdate::NotFound => ConvertClaim::Missing,
        })
    }

    /// Desfaz a reivindicação quando a validação de estoque falhou depois
    /// do claim: o status volta ao que era e a referência de venda é limpa.
    pub async fn revert_convert(&self, id: Uuid, prior: QuoteStatus) -> Result<(), AppError> {
        let mut fields = Map::new();
        fields.insert("status".into(), json!(prior.as_str()));
        fields.insert("convertedSaleId".into(), Value::Null);
        self.store
            .set_fields(collections::QUOTES, &id.to_string(), fields)
            .await?;
        Ok(())
    }
}
