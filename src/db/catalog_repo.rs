// src/db/catalog_repo.rs

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use super::{from_doc, from_docs, to_doc};
use crate::{
    common::error::AppError,
    models::catalog::{Category, Product, UpdateCategoryPayload, UpdateProductPayload},
    store::{collections, AdjustOutcome, DocumentStore, Filter, Query},
};

/// Resultado do decremento condicional de estoque (o compare-and-swap do
/// adaptador): ou o saldo foi reservado, ou era insuficiente, ou o produto
/// sumiu no meio do caminho.
#[derive(Debug)]
pub enum StockTake {
    Taken(Product),
    Insufficient(Product),
    Missing,
}

#[derive(Clone)]
pub struct CatalogRepository {
    store: Arc<dyn DocumentStore>,
}

impl CatalogRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    // ---
    // Categorias
    // ---

    pub async fn list_categories(&self) -> Result<Vec<Category>, AppError> {
        let docs = self
            .store
            .find(collections::CATEGORIES, Query::all())
            .await?;
        from_docs(docs)
    }

    pub async fn find_category(&self, id: Uuid) -> Result<Option<Category>, AppError> {
        let doc = self
            .store
            .find_by_id(collections::CATEGORIES, &id.to_string())
            .await?;
        doc.map(from_doc).transpose()
    }

    pub async fn find_category_by_name(&self, name: &str) -> Result<Option<Category>, AppError> {
        let doc = self
            .store
            .find_one(collections::CATEGORIES, &Filter::new().eq("name", name))
            .await?;
        doc.map(from_doc).transpose()
    }

    pub async fn insert_category(&self, category: &Category) -> Result<(), AppError> {
        self.store
            .insert(collections::CATEGORIES, to_doc(category)?)
            .await?;
        Ok(())
    }

    pub async fn update_category(
        &self,
        id: Uuid,
        payload: &UpdateCategoryPayload,
    ) -> Result<Option<Category>, AppError> {
        let mut fields = Map::new();
        if let Some(name) = &payload.name {
            fields.insert("name".into(), json!(name));
        }
        if let Some(description) = &payload.description {
            fields.insert("description".into(), json!(description));
        }
        let doc = self
            .store
            .set_fields(collections::CATEGORIES, &id.to_string(), fields)
            .await?;
        doc.map(from_doc).transpose()
    }

    pub async fn delete_category(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(self
            .store
            .delete(collections::CATEGORIES, &id.to_string())
            .await?)
    }

    pub async fn count_products_in_category(&self, category_id: Uuid) -> Result<u64, AppError> {
        Ok(self
            .store
            .count(
                collections::PRODUCTS,
                &Filter::new().eq("categoryId", category_id.to_string()),
            )
            .await?)
    }

    // ---
    // Produtos
    // ---

    pub async fn list_products(&self) -> Result<Vec<Product>, AppError> {
        let docs = self.store.find(collections::PRODUCTS, Query::all()).await?;
        from_docs(docs)
    }

    /// Busca por nome ou código de barras (autocomplete do PDV).
    pub async fn search_products(&self, term: &str, limit: usize) -> Result<Vec<Product>, AppError> {
        let by_name = self
            .store
            .find(
                collections::PRODUCTS,
                Query::filtered(Filter::new().contains("name", term)).limit(limit),
            )
            .await?;
        let by_barcode = self
            .store
            .find(
                collections::PRODUCTS,
                Query::filtered(Filter::new().contains("barcode", term)).limit(limit),
            )
            .await?;

        let mut merged: Vec<Value> = by_name;
        for doc in by_barcode {
            if !merged.iter().any(|d| d.get("id") == doc.get("id")) {
                merged.push(doc);
            }
        }
        merged.truncate(limit);
        from_docs(merged)
    }

    pub async fn find_product(&self, id: Uuid) -> Result<Option<Product>, AppError> {
        let doc = self
            .store
            .find_by_id(collections::PRODUCTS, &id.to_string())
            .await?;
        doc.map(from_doc).transpose()
    }

    /// Verifica duplicidade de código de barras, ignorando opcionalmente o
    /// próprio produto (caso de edição).
    pub async fn find_product_by_barcode(
        &self,
        barcode: &str,
        exclude: Option<Uuid>,
    ) -> Result<Option<Product>, AppError> {
        let mut filter = Filter::new().eq("barcode", barcode);
        if let Some(id) = exclude {
            filter = filter.ne("id", id.to_string());
        }
        let doc = self.store.find_one(collections::PRODUCTS, &filter).await?;
        doc.map(from_doc).transpose()
    }

    pub async fn insert_product(&self, product: &Product) -> Result<(), AppError> {
        self.store
            .insert(collections::PRODUCTS, to_doc(product)?)
            .await?;
        Ok(())
    }

    pub async fn update_product(
        &self,
        id: Uuid,
        payload: &UpdateProductPayload,
    ) -> Result<Option<Product>, AppError> {
        let mut fields = Map::new();
        if let Some(name) = &payload.name {
            fields.insert("name".into(), json!(name));
        }
        if let Some(description) = &payload.description {
            fields.insert("description".into(), json!(description));
        }
        if let Some(barcode) = &payload.barcode {
            fields.insert("barcode".into(), json!(barcode));
        }
        if let Some(category_id) = &payload.category_id {
            fields.insert("categoryId".into(), json!(category_id));
        }
        if let Some(retail_price) = &payload.retail_price {
            fields.insert("retailPrice".into(), json!(retail_price));
        }
        if let Some(wholesale_price) = &payload.wholesale_price {
            fields.insert("wholesalePrice".into(), json!(wholesale_price));
        }
        if let Some(stock) = &payload.stock {
            fields.insert("stock".into(), json!(stock));
        }
        if let Some(min_stock) = &payload.min_stock {
            fields.insert("minStock".into(), json!(min_stock));
        }
        if let Some(image_url) = &payload.image_url {
            fields.insert("imageUrl".into(), json!(image_url));
        }
        fields.insert("updatedAt".into(), json!(Utc::now()));

        let doc = self
            .store
            .set_fields(collections::PRODUCTS, &id.to_string(), fields)
            .await?;
        doc.map(from_doc).transpose()
    }

    pub async fn delete_product(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(self
            .store
            .delete(collections::PRODUCTS, &id.to_string())
            .await?)
    }

    // ---
    // Estoque agregado (as primitivas do ciclo de vida)
    // ---

    /// Decremento condicional: só baixa o estoque se o saldo comportar a
    /// quantidade (piso zero). É o `adjust` atômico do adaptador — duas
    /// vendas concorrentes nunca passam as duas pelo mesmo saldo.
    pub async fn try_take_stock(&self, id: Uuid, quantity: i64) -> Result<StockTake, AppError> {
        let outcome = self
            .store
            .adjust(
                collections::PRODUCTS,
                &id.to_string(),
                "stock",
                Decimal::from(-quantity),
                Some(Decimal::ZERO),
            )
            .await?;
        Ok(match outcome {
            AdjustOutcome::Updated(doc) => StockTake::Taken(from_doc(doc)?),
            AdjustOutcome::Conflict(doc) => StockTake::Insufficient(from_doc(doc)?),
            AdjustOutcome::NotFound => StockTake::Missing,
        })
    }

    /// Incremento de estoque (devolução por anulação, compensação de uma
    /// venda que falhou no meio, recebimento de compra). Sem piso.
    pub async fn increment_stock(&self, id: Uuid, quantity: i64) -> Result<(), AppError> {
        let outcome = self
            .store
            .adjust(
                collections::PRODUCTS,
                &id.to_string(),
                "stock",
                Decimal::from(quantity),
                None,
            )
            .await?;
        if matches!(outcome, AdjustOutcome::NotFound) {
            // Produto apagado depois do documento que o referencia; o saldo
            // não tem mais onde ser restaurado.
            tracing::warn!("produto {} não existe mais; incremento de estoque descartado", id);
        }
        Ok(())
    }
}
