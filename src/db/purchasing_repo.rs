// src/db/purchasing_repo.rs

use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Map};
use uuid::Uuid;

use super::{from_doc, from_docs, to_doc};
use crate::{
    common::error::AppError,
    models::auth::Actor,
    models::purchasing::{
        Purchase, PurchaseStatus, Supplier, SupplierPrice, UpdateSupplierPayload,
    },
    store::{collections, ConditionalUpdate, DocumentStore, Filter, Query, SortOrder},
};

/// Resultado de uma transição de status de compra. `Rejected` devolve o
/// status encontrado para a mensagem de erro do serviço.
#[derive(Debug)]
pub enum StatusClaim {
    Done(Purchase),
    Rejected(PurchaseStatus),
    Missing,
}

#[derive(Clone)]
pub struct PurchasingRepository {
    store: Arc<dyn DocumentStore>,
}

impl PurchasingRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    // ---
    // Fornecedores
    // ---

    pub async fn list_suppliers(&self) -> Result<Vec<Supplier>, AppError> {
        let docs = self.store.find(collections::SUPPLIERS, Query::all()).await?;
        from_docs(docs)
    }

    pub async fn find_supplier(&self, id: Uuid) -> Result<Option<Supplier>, AppError> {
        let doc = self
            .store
            .find_by_id(collections::SUPPLIERS, &id.to_string())
            .await?;
        doc.map(from_doc).transpose()
    }

    pub async fn insert_supplier(&self, supplier: &Supplier) -> Result<(), AppError> {
        self.store
            .insert(collections::SUPPLIERS, to_doc(supplier)?)
            .await?;
        Ok(())
    }

    pub async fn update_supplier(
        &self,
        id: Uuid,
        payload: &UpdateSupplierPayload,
    ) -> Result<Option<Supplier>, AppError> {
        let mut fields = Map::new();
        if let Some(name) = &payload.name {
            fields.insert("name".into(), json!(name));
        }
        if let Some(contact) = &payload.contact {
            fields.insert("contact".into(), json!(contact));
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
        if let Some(tax_id) = &payload.tax_id {
            fields.insert("taxId".into(), json!(tax_id));
        }
        if let Some(active) = &payload.active {
            fields.insert("active".into(), json!(active));
        }
        fields.insert("updatedAt".into(), json!(Utc::now()));

        let doc = self
            .store
            .set_fields(collections::SUPPLIERS, &id.to_string(), fields)
            .await?;
        doc.map(from_doc).transpose()
    }

    pub async fn delete_supplier(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(self
            .store
            .delete(collections::SUPPLIERS, &id.to_string())
            .await?)
    }

    // ---
    // Preços por fornecedor (uma linha por par produto/fornecedor)
    // ---

    pub async fn find_price(
        &self,
        product_id: Uuid,
        supplier_id: Uuid,
    ) -> Result<Option<SupplierPrice>, AppError> {
        let filter = Filter::new()
            .eq("productId", product_id.to_string())
            .eq("supplierId", supplier_id.to_string());
        let doc = self
            .store
            .find_one(collections::SUPPLIER_PRICES, &filter)
            .await?;
        doc.map(from_doc).transpose()
    }

    pub async fn insert_price(&self, price: &SupplierPrice) -> Result<(), AppError> {
        self.store
            .insert(collections::SUPPLIER_PRICES, to_doc(price)?)
            .await?;
        Ok(())
    }

    pub async fn update_price(
        &self,
        id: Uuid,
        price: rust_decimal::Decimal,
        supplier_code: Option<&str>,
    ) -> Result<Option<SupplierPrice>, AppError> {
        let mut fields = Map::new();
        fields.insert("price".into(), json!(price));
        if let Some(code) = supplier_code {
            fields.insert("supplierCode".into(), json!(code));
        }
        fields.insert("updatedAt".into(), json!(Utc::now()));
        let doc = self
            .store
            .set_fields(collections::SUPPLIER_PRICES, &id.to_string(), fields)
            .await?;
        doc.map(from_doc).transpose()
    }

    pub async fn prices_for_product(&self, product_id: Uuid) -> Result<Vec<SupplierPrice>, AppError> {
        let docs = self
            .store
            .find(
                collections::SUPPLIER_PRICES,
                Query::filtered(Filter::new().eq("productId", product_id.to_string())),
            )
            .await?;
        from_docs(docs)
    }

    // ---
    // Compras
    // ---

    pub async fn list_purchases(&self, limit: usize) -> Result<Vec<Purchase>, AppError> {
        let docs = self
            .store
            .find(
                collections::PURCHASES,
                Query::all().sort("date", SortOrder::Desc).limit(limit),
            )
            .await?;
        from_docs(docs)
    }

    pub async fn find_purchase(&self, id: Uuid) -> Result<Option<Purchase>, AppError> {
        let doc = self
            .store
            .find_by_id(collections::PURCHASES, &id.to_string())
            .await?;
        doc.map(from_doc).transpose()
    }

    pub async fn insert_purchase(&self, purchase: &Purchase) -> Result<(), AppError> {
        self.store
            .insert(collections::PURCHASES, to_doc(purchase)?)
            .await?;
        Ok(())
    }

    /// Transição pending -> received, carimbando quem recebeu e quando.
    /// O guard `status == pending` fecha a janela de recebimento duplicado:
    /// o check e a troca de status são a mesma escrita.
    pub async fn claim_receive(&self, id: Uuid, actor: &Actor) -> Result<StatusClaim, AppError> {
        let guard = Filter::new().eq("status", PurchaseStatus::Pending.as_str());
        let mut fields = Map::new();
        fields.insert("status".into(), json!(PurchaseStatus::Received.as_str()));
        fields.insert("receivedById".into(), json!(actor.id));
        fields.insert("receivedByName".into(), json!(actor.name));
        fields.insert("receivedAt".into(), json!(Utc::now()));

        self.claim(id, guard, fields).await
    }

    /// Transição pending -> cancelled. Sem efeito de estoque.
    pub async fn claim_cancel(&self, id: Uuid) -> Result<StatusClaim, AppError> {
        let guard = Filter::new().eq("status", PurchaseStatus::Pending.as_str());
        let mut fields = Map::new();
        fields.insert("status".into(), json!(PurchaseStatus::Cancelled.as_str()));

        self.claim(id, guard, fields).await
    }

    async fn claim(
        &self,
        id: Uuid,
        guard: Filter,
        fields: Map<String, serde_json::Value>,
    ) -> Result<StatusClaim, AppError> {
        let outcome = self
            .store
            .set_fields_if(collections::PURCHASES, &id.to_string(), &guard, fields)
            .await?;
        Ok(match outcome {
            ConditionalUpdate::Updated(doc) => StatusClaim::Done(from_doc(doc)?),
            ConditionalUpdate::Rejected(doc) => {
                let current: Purchase = from_doc(doc)?;
                StatusClaim::Rejected(current.status)
            }
            ConditionalUpdate::NotFound => StatusClaim::Missing,
        })
    }
}
