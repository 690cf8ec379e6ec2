// src/services/crm_service.rs

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{CrmRepository, SaleRepository},
    models::auth::Actor,
    models::crm::{CreateCustomerPayload, Customer, CustomerHistory, UpdateCustomerPayload},
    permissions::{Permission, PermissionTable},
    services::audit::AuditTrail,
};

#[derive(Clone)]
pub struct CrmService {
    crm_repo: CrmRepository,
    sale_repo: SaleRepository,
    permissions: Arc<PermissionTable>,
    audit: AuditTrail,
}

impl CrmService {
    pub fn new(
        crm_repo: CrmRepository,
        sale_repo: SaleRepository,
        permissions: Arc<PermissionTable>,
        audit: AuditTrail,
    ) -> Self {
        Self {
            crm_repo,
            sale_repo,
            permissions,
            audit,
        }
    }

    pub async fn list(&self, actor: &Actor) -> Result<Vec<Customer>, AppError> {
        self.permissions
            .require(actor.role, Permission::CustomersView)?;
        self.crm_repo.list().await
    }

    pub async fn get(&self, actor: &Actor, id: Uuid) -> Result<Customer, AppError> {
        self.permissions
            .require(actor.role, Permission::CustomersView)?;
        self.crm_repo
            .find(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Cliente".into()))
    }

    /// Histórico de compras: as vendas do cliente, mais recentes primeiro,
    /// com contagem e total gasto.
    pub async fn history(&self, actor: &Actor, id: Uuid) -> Result<CustomerHistory, AppError> {
        self.permissions
            .require(actor.role, Permission::CustomersView)?;

        let customer = self
            .crm_repo
            .find(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Cliente".into()))?;

        let sales = self.sale_repo.list_by_customer(id, 100).await?;
        let lifetime_total: Decimal = sales.iter().map(|s| s.total).sum();

        Ok(CustomerHistory {
            customer,
            purchase_count: sales.len(),
            lifetime_total,
            sales,
        })
    }

    pub async fn create(
        &self,
        actor: &Actor,
        payload: CreateCustomerPayload,
    ) -> Result<Customer, AppError> {
        self.permissions
            .require(actor.role, Permission::CustomersCreate)?;

        if let Some(email) = &payload.email {
            if self.crm_repo.find_by_email(email, None).await?.is_some() {
                return Err(AppError::Conflict(
                    "Já existe um cliente com esse e-mail".into(),
                ));
            }
        }

        let now = Utc::now();
        let customer = Customer {
            id: Uuid::new_v4(),
            name: payload.name,
            tax_id: payload.tax_id,
            email: payload.email,
            phone: payload.phone,
            address: payload.address,
            credit_limit: payload.credit_limit,
            balance: Decimal::ZERO,
            created_at: now,
            updated_at: now,
        };
        self.crm_repo.insert(&customer).await?;

        self.audit.record(
            actor,
            "create",
            "customers",
            Some(format!("Cliente criado: {}", customer.name)),
        );
        Ok(customer)
    }

    pub async fn update(
        &self,
        actor: &Actor,
        id: Uuid,
        payload: UpdateCustomerPayload,
    ) -> Result<Customer, AppError> {
        self.permissions
            .require(actor.role, Permission::CustomersEdit)?;

        if self.crm_repo.find(id).await?.is_none() {
            return Err(AppError::NotFound("Cliente".into()));
        }

        if let Some(email) = &payload.email {
            if self.crm_repo.find_by_email(email, Some(id)).await?.is_some() {
                return Err(AppError::Conflict(
                    "Já existe um cliente com esse e-mail".into(),
                ));
            }
        }

        let updated = self
            .crm_repo
            .update(id, &payload)
            .await?
            .ok_or_else(|| AppError::NotFound("Cliente".into()))?;

        self.audit.record(
            actor,
            "update",
            "customers",
            Some(format!("Cliente atualizado: {}", id)),
        );
        Ok(updated)
    }

    pub async fn delete(&self, actor: &Actor, id: Uuid) -> Result<(), AppError> {
        self.permissions
            .require(actor.role, Permission::CustomersDelete)?;

        if !self.crm_repo.delete(id).await? {
            return Err(AppError::NotFound("Cliente".into()));
        }
        self.audit.record(
            actor,
            "delete",
            "customers",
            Some(format!("Cliente excluído: {}", id)),
        );
        Ok(())
    }
}
