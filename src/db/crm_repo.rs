// src/db/crm_repo.rs

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::{json, Map};
use uuid::Uuid;

use super::{from_doc, from_docs, to_doc};
use crate::{
    common::error::AppError,
    models::crm::{Customer, UpdateCustomerPayload},
    store::{collections, AdjustOutcome, DocumentStore, Filter, Query},
};

#[derive(Clone)]
pub struct CrmRepository {
    store: Arc<dyn DocumentStore>,
}

impl CrmRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> Result<Vec<Customer>, AppError> {
        let docs = self.store.find(collections::CUSTOMERS, Query::all()).await?;
        from_docs(docs)
    }

    pub async fn find(&self, id: Uuid) -> Result<Option<Customer>, AppError> {
        let doc = self
            .store
            .find_by_id(collections::CUSTOMERS, &id.to_string())
            .await?;
        doc.map(from_doc).transpose()
    }

    pub async fn find_by_email(
        &self,
        email: &str,
        exclude: Option<Uuid>,
    ) -> Result<Option<Customer>, AppError> {
        let mut filter = Filter::new().eq("email", email);
        if let Some(id) = exclude {
            filter = filter.ne("id", id.to_string());
        }
        let doc = self.store.find_one(collections::CUSTOMERS, &filter).await?;
        doc.map(from_doc).transpose()
    }

    pub async fn insert(&self, customer: &Customer) -> Result<(), AppError> {
        self.store
            .insert(collections::CUSTOMERS, to_doc(customer)?)
            .await?;
        Ok(())
    }

    pub async fn update(
        &self,
        id: Uuid,
        payload: &UpdateCustomerPayload,
    ) -> Result<Option<Customer>, AppError> {
        let mut fields = Map::new();
        if let Some(name) = &payload.name {
            fields.insert("name".into(), json!(name));
        }
        if let Some(tax_id) = &payload.tax_id {
            fields.insert("taxId".into(), json!(tax_id));
        }
        if let Some(email) = &payload.email {
            fields.insert("email".into(), json!(email));
        }
        if let Some(phone) = &payload.phone {
            fields.insert("phone".into(), json!(phone));
        }
        if let Some(address) = &payload.address {
            fields.insert("address".into(), json!(address));
        }
        if let Some(credit_limit) = &payload.credit_limit {
            fields.insert("creditLimit".into(), json!(credit_limit));
        }
        fields.insert("updatedAt".into(), json!(Utc::now()));

        let doc = self
            .store
            .set_fields(collections::CUSTOMERS, &id.to_string(), fields)
            .await?;
        doc.map(from_doc).transpose()
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(self
            .store
            .delete(collections::CUSTOMERS, &id.to_string())
            .await?)
    }

    /// Movimenta a conta corrente do cliente (venda soma, anulação subtrai).
    /// Cliente apagado entre a venda e a anulação vira um aviso, não um erro.
    pub async fn adjust_balance(&self, id: Uuid, delta: Decimal) -> Result<(), AppError> {
        let outcome = self
            .store
            .adjust(
                collections::CUSTOMERS,
                &id.to_string(),
                "balance",
                delta,
                None,
            )
            .await?;
        if matches!(outcome, AdjustOutcome::NotFound) {
            tracing::warn!("cliente {} não encontrado; ajuste de saldo descartado", id);
        }
        Ok(())
    }
}
