// src/services/sale_service.rs

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{CatalogRepository, CrmRepository, SaleRepository, StockTake, VoidClaim},
    models::auth::Actor,
    models::sales::{CreateSalePayload, Sale, SaleItem, SaleStatus},
    permissions::{Permission, PermissionTable},
    services::audit::AuditTrail,
};

#[derive(Clone)]
pub struct SaleService {
    sale_repo: SaleRepository,
    catalog_repo: CatalogRepository,
    crm_repo: CrmRepository,
    permissions: Arc<PermissionTable>,
    audit: AuditTrail,
}

impl SaleService {
    pub fn new(
        sale_repo: SaleRepository,
        catalog_repo: CatalogRepository,
        crm_repo: CrmRepository,
        permissions: Arc<PermissionTable>,
        audit: AuditTrail,
    ) -> Self {
        Self {
            sale_repo,
            catalog_repo,
            crm_repo,
            permissions,
            audit,
        }
    }

    pub async fn list(&self, actor: &Actor, limit: usize) -> Result<Vec<Sale>, AppError> {
        self.permissions.require(actor.role, Permission::SalesView)?;
        self.sale_repo.list(limit).await
    }

    pub async fn get(&self, actor: &Actor, id: Uuid) -> Result<Sale, AppError> {
        self.permissions.require(actor.role, Permission::SalesView)?;
        self.sale_repo
            .find(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Venda".into()))
    }

    /// Baixa o estoque de cada linha com o decremento condicional do
    /// adaptador. Qualquer falha no meio devolve o que já foi baixado —
    /// uma venda recusada não deixa rastro no estoque.
    async fn take_stock_for_items(
        &self,
        payload_items: &[crate::models::sales::SaleItemPayload],
    ) -> Result<Vec<SaleItem>, AppError> {
        let mut applied: Vec<(Uuid, i64)> = Vec::new();
        let mut items: Vec<SaleItem> = Vec::with_capacity(payload_items.len());

        for item in payload_items {
            let outcome = self
                .catalog_repo
                .try_take_stock(item.product_id, item.quantity)
                .await;

            match outcome {
                Ok(StockTake::Taken(product)) => {
                    applied.push((item.product_id, item.quantity));
                    items.push(SaleItem {
                        product_id: item.product_id,
                        product_name: product.name,
                        quantity: item.quantity,
                        unit_price: item.unit_price,
                        subtotal: item.subtotal,
                    });
                }
                Ok(StockTake::Insufficient(product)) => {
                    self.release_stock(&applied).await;
                    return Err(AppError::InsufficientStock {
                        product: product.name,
                        available: product.stock,
                    });
                }
                Ok(StockTake::Missing) => {
                    self.release_stock(&applied).await;
                    return Err(AppError::NotFound(format!(
                        "Produto {}",
                        item.product_id
                    )));
                }
                Err(err) => {
                    self.release_stock(&applied).await;
                    return Err(err);
                }
            }
        }
        Ok(items)
    }

    async fn release_stock(&self, applied: &[(Uuid, i64)]) {
        for (product_id, quantity) in applied {
            if let Err(err) = self.catalog_repo.increment_stock(*product_id, *quantity).await {
                tracing::error!(
                    "falha ao devolver estoque do produto {}: {}",
                    product_id,
                    err
                );
            }
        }
    }

    pub async fn create(&self, actor: &Actor, payload: CreateSalePayload) -> Result<Sale, AppError> {
        self.permissions.require(actor.role, Permission::SalesCreate)?;

        let items = self.take_stock_for_items(&payload.items).await?;

        // O total é a soma dos subtotais informados.
        let total: Decimal = items.iter().map(|i| i.subtotal).sum();

        let now = Utc::now();
        let sale = Sale {
            id: Uuid::new_v4(),
            customer_id: payload.customer_id,
            items,
            payment_method: payload.payment_method,
            notes: payload.notes,
            seller_id: actor.id,
            seller_name: actor.name.clone(),
            total,
            status: SaleStatus::Completed,
            date: now,
            created_at: now,
        };
        self.sale_repo.insert(&sale).await?;

        // Venda em conta corrente: o saldo do cliente sobe pelo total.
        if let Some(customer_id) = payload.customer_id {
            self.crm_repo.adjust_balance(customer_id, total).await?;
        }

        self.audit.record(
            actor,
            "create",
            "sales",
            Some(format!("Venda criada no total de {}", total)),
        );
        Ok(sale)
    }

    /// Anulação: reverte estoque e saldo EXATAMENTE uma vez. A escrita
    /// condicional de status é o bilhete de entrada — quem chega depois
    /// recebe `InvalidState` e nada muda.
    pub async fn void(&self, actor: &Actor, id: Uuid) -> Result<Sale, AppError> {
        self.permissions.require(actor.role, Permission::SalesVoid)?;

        let sale = match self.sale_repo.claim_void(id).await? {
            VoidClaim::Voided(sale) => sale,
            VoidClaim::AlreadyVoided => {
                return Err(AppError::InvalidState("A venda já está anulada".into()));
            }
            VoidClaim::Missing => return Err(AppError::NotFound("Venda".into())),
        };

        // Devolve o estoque de cada linha original.
        for item in &sale.items {
            self.catalog_repo
                .increment_stock(item.product_id, item.quantity)
                .await?;
        }

        // E desfaz o lançamento na conta corrente, se houve.
        if let Some(customer_id) = sale.customer_id {
            self.crm_repo.adjust_balance(customer_id, -sale.total).await?;
        }

        self.audit.record(
            actor,
            "void",
            "sales",
            Some(format!("Venda anulada: {}", id)),
        );
        Ok(sale)
    }
}
