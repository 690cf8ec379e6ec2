// src/services/quote_service.rs

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{CatalogRepository, ConvertClaim, CrmRepository, QuoteRepository, SaleRepository, StockTake},
    models::auth::Actor,
    models::quotes::{ConvertedQuote, CreateQuotePayload, Quote, QuoteStatus},
    models::sales::{PaymentMethod, Sale, SaleItem, SaleStatus},
    permissions::{Permission, PermissionTable},
    services::audit::AuditTrail,
};

#[derive(Clone)]
pub struct QuoteService {
    quote_repo: QuoteRepository,
    sale_repo: SaleRepository,
    catalog_repo: CatalogRepository,
    crm_repo: CrmRepository,
    permissions: Arc<PermissionTable>,
    audit: AuditTrail,
    // Quando ligado, a conversão lança o total na conta corrente do cliente
    // como uma venda comum faria.
    convert_updates_balance: bool,
}

impl QuoteService {
    pub fn new(
        quote_repo: QuoteRepository,
        sale_repo: SaleRepository,
        catalog_repo: CatalogRepository,
        crm_repo: CrmRepository,
        permissions: Arc<PermissionTable>,
        audit: AuditTrail,
        convert_updates_balance: bool,
    ) -> Self {
        Self {
            quote_repo,
            sale_repo,
            catalog_repo,
            crm_repo,
            permissions,
            audit,
            convert_updates_balance,
        }
    }

    pub async fn list(&self, actor: &Actor, limit: usize) -> Result<Vec<Quote>, AppError> {
        self.permissions.require(actor.role, Permission::QuotesView)?;
        self.quote_repo.list(limit).await
    }

    pub async fn get(&self, actor: &Actor, id: Uuid) -> Result<Quote, AppError> {
        self.permissions.require(actor.role, Permission::QuotesView)?;
        self.quote_repo
            .find(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Orçamento".into()))
    }

    /// Orçamento não reserva estoque: só valida que os produtos existem.
    pub async fn create(&self, actor: &Actor, payload: CreateQuotePayload) -> Result<Quote, AppError> {
        self.permissions.require(actor.role, Permission::QuotesCreate)?;

        let mut items: Vec<SaleItem> = Vec::with_capacity(payload.items.len());
        for item in &payload.items {
            let product = self
                .catalog_repo
                .find_product(item.product_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Produto {}", item.product_id)))?;
            items.push(SaleItem {
                product_id: item.product_id,
                product_name: product.name,
                quantity: item.quantity,
                unit_price: item.unit_price,
                subtotal: item.subtotal,
            });
        }

        let total: Decimal = items.iter().map(|i| i.subtotal).sum();
        let now = Utc::now();
        let quote = Quote {
            id: Uuid::new_v4(),
            customer_id: payload.customer_id,
            items,
            validity_days: payload.validity_days,
            notes: payload.notes,
            seller_id: actor.id,
            seller_name: actor.name.clone(),
            total,
            status: QuoteStatus::Pending,
            converted_sale_id: None,
            date: now,
            created_at: now,
        };
        self.quote_repo.insert(&quote).await?;

        self.audit.record(
            actor,
            "create",
            "quotes",
            Some(format!("Orçamento criado no total de {}", total)),
        );
        Ok(quote)
    }

    /// Atualização parcial de status. O único trecho do grafo que é
    /// protegido é a conversão: nem sair nem entrar em `converted` por aqui.
    pub async fn update_status(
        &self,
        actor: &Actor,
        id: Uuid,
        status: QuoteStatus,
    ) -> Result<Quote, AppError> {
        self.permissions.require(actor.role, Permission::QuotesEdit)?;

        let quote = self
            .quote_repo
            .find(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Orçamento".into()))?;

        if quote.status == QuoteStatus::Converted {
            return Err(AppError::InvalidState(
                "O orçamento já foi convertido em venda".into(),
            ));
        }
        if status == QuoteStatus::Converted {
            return Err(AppError::InvalidState(
                "Use a conversão para marcar um orçamento como convertido".into(),
            ));
        }

        let updated = self
            .quote_repo
            .set_status(id, status)
            .await?
            .ok_or_else(|| AppError::NotFound("Orçamento".into()))?;

        self.audit.record(
            actor,
            "update",
            "quotes",
            Some(format!("Orçamento atualizado: {}", id)),
        );
        Ok(updated)
    }

    /// Converte o orçamento em venda exatamente uma vez.
    ///
    /// A ordem importa: primeiro a reivindicação (escrita condicional do
    /// status, que fecha a janela de conversão dupla), depois a baixa de
    /// estoque, por último a venda. Se o estoque não comportar, a
    /// reivindicação é desfeita e o orçamento volta ao status anterior.
    pub async fn convert(&self, actor: &Actor, id: Uuid) -> Result<ConvertedQuote, AppError> {
        self.permissions.require(actor.role, Permission::QuotesConvert)?;

        let sale_id = Uuid::new_v4();

        // Lê o status corrente e tenta a reivindicação com guard de
        // igualdade; se um concorrente mexeu no status no meio, relê.
        let (quote, prior_status) = loop {
            let quote = self
                .quote_repo
                .find(id)
                .await?
                .ok_or_else(|| AppError::NotFound("Orçamento".into()))?;

            if quote.status == QuoteStatus::Converted {
                return Err(AppError::InvalidState(
                    "O orçamento já foi convertido em venda".into(),
                ));
            }

            match self.quote_repo.claim_convert(id, quote.status, sale_id).await? {
                ConvertClaim::Claimed(updated) => break (updated, quote.status),
                ConvertClaim::StatusChanged => continue,
                ConvertClaim::Missing => {
                    return Err(AppError::NotFound("Orçamento".into()));
                }
            }
        };

        // Revalida o estoque item a item — o tempo passou desde que o
        // orçamento foi feito.
        let mut applied: Vec<(Uuid, i64)> = Vec::new();
        for item in &quote.items {
            let outcome = self
                .catalog_repo
                .try_take_stock(item.product_id, item.quantity)
                .await;

            let err = match outcome {
                Ok(StockTake::Taken(_)) => {
                    applied.push((item.product_id, item.quantity));
                    continue;
                }
                Ok(StockTake::Insufficient(product)) => AppError::InsufficientStock {
                    product: product.name,
                    available: product.stock,
                },
                Ok(StockTake::Missing) => {
                    AppError::NotFound(format!("Produto {}", item.product_id))
                }
                Err(err) => err,
            };

            // Falhou: devolve o que já baixou e libera o orçamento.
            for (product_id, quantity) in &applied {
                if let Err(e) = self.catalog_repo.increment_stock(*product_id, *quantity).await {
                    tracing::error!("falha ao devolver estoque do produto {}: {}", product_id, e);
                }
            }
            self.quote_repo.revert_convert(id, prior_status).await?;
            return Err(err);
        }

        // A venda carrega os itens e o total ORIGINAIS do orçamento.
        let now = Utc::now();
        let sale = Sale {
            id: sale_id,
            customer_id: Some(quote.customer_id),
            items: quote.items.clone(),
            payment_method: PaymentMethod::Cash,
            notes: Some(format!("Convertido do orçamento {}", id)),
            seller_id: actor.id,
            seller_name: actor.name.clone(),
            total: quote.total,
            status: SaleStatus::Completed,
            date: now,
            created_at: now,
        };
        self.sale_repo.insert(&sale).await?;

        if self.convert_updates_balance {
            self.crm_repo
                .adjust_balance(quote.customer_id, quote.total)
                .await?;
        }

        self.audit.record(
            actor,
            "convert",
            "quotes",
            Some(format!("Orçamento {} convertido na venda {}", id, sale_id)),
        );
        Ok(ConvertedQuote { quote, sale })
    }
}
