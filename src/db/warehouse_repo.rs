// src/db/warehouse_repo.rs

use std::sync::Arc;

use rust_decimal::Decimal;
use serde_json::{json, Map};
use uuid::Uuid;

use super::{from_doc, from_docs, to_doc};
use crate::{
    common::error::AppError,
    models::purchasing::{UpdateWarehousePayload, Warehouse, WarehouseStock},
    store::{collections, DocumentStore, Filter, Query},
};

// Depósitos e as linhas de estoque por (produto, depósito).
#[derive(Clone)]
pub struct WarehouseRepository {
    store: Arc<dyn DocumentStore>,
}

impl WarehouseRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> Result<Vec<Warehouse>, AppError> {
        let docs = self
            .store
            .find(collections::WAREHOUSES, Query::all())
            .await?;
        from_docs(docs)
    }

    pub async fn find(&self, id: Uuid) -> Result<Option<Warehouse>, AppError> {
        let doc = self
            .store
            .find_by_id(collections::WAREHOUSES, &id.to_string())
            .await?;
        doc.map(from_doc).transpose()
    }

    pub async fn insert(&self, warehouse: &Warehouse) -> Result<(), AppError> {
        self.store
            .insert(collections::WAREHOUSES, to_doc(warehouse)?)
            .await?;
        Ok(())
    }

    pub async fn update(
        &self,
        id: Uuid,
        payload: &UpdateWarehousePayload,
    ) -> Result<Option<Warehouse>, AppError> {
        let mut fields = Map::new();
        if let Some(name) = &payload.name {
            fields.insert("name".into(), json!(name));
        }
        if let Some(address) = &payload.address {
            fields.insert("address".into(), json!(address));
        }
        if let Some(manager) = &payload.manager {
            fields.insert("manager".into(), json!(manager));
        }
        if let Some(phone) = &payload.phone {
            fields.insert("phone".into(), json!(phone));
        }
        if let Some(active) = &payload.active {
            fields.insert("active".into(), json!(active));
        }
        let doc = self
            .store
            .set_fields(collections::WAREHOUSES, &id.to_string(), fields)
            .await?;
        doc.map(from_doc).transpose()
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(self
            .store
            .delete(collections::WAREHOUSES, &id.to_string())
            .await?)
    }

    // ---
    // Linhas de estoque por depósito
    // ---

    pub async fn stock_rows_for_product(
        &self,
        product_id: Uuid,
    ) -> Result<Vec<WarehouseStock>, AppError> {
        let docs = self
            .store
            .find(
                collections::PRODUCT_STOCK,
                Query::filtered(Filter::new().eq("productId", product_id.to_string())),
            )
            .await?;
        from_docs(docs)
    }

    /// Soma `quantity` na linha (produto, depósito), criando-a se ainda não
    /// existir — o upsert par-único do recebimento de compras.
    pub async fn add_stock(
        &self,
        product_id: Uuid,
        warehouse_id: Uuid,
        warehouse_name: &str,
        quantity: i64,
    ) -> Result<WarehouseStock, AppError> {
        let filter = Filter::new()
            .eq("productId", product_id.to_string())
            .eq("warehouseId", warehouse_id.to_string());
        let seed = to_doc(&WarehouseStock {
            id: Uuid::new_v4(),
            product_id,
            warehouse_id,
            warehouse_name: warehouse_name.to_string(),
            quantity,
            internal_location: None,
        })?;
        let doc = self
            .store
            .adjust_or_insert(
                collections::PRODUCT_STOCK,
                &filter,
                "quantity",
                Decimal::from(quantity),
                seed,
            )
            .await?;
        from_doc(doc)
    }
}
