// src/services/purchasing_service.rs

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{CatalogRepository, PurchasingRepository, StatusClaim, WarehouseRepository},
    models::auth::Actor,
    models::purchasing::{
        CreatePurchasePayload, CreateSupplierPayload, CreateWarehousePayload, ProductStock,
        Purchase, PurchaseStatus, Supplier, SupplierPrice, UpdateSupplierPayload,
        UpdateWarehousePayload, UpsertSupplierPricePayload, Warehouse,
    },
    models::sales::SaleItem,
    permissions::{Permission, PermissionTable},
    services::audit::AuditTrail,
};

#[derive(Clone)]
pub struct PurchasingService {
    purchasing_repo: PurchasingRepository,
    warehouse_repo: WarehouseRepository,
    catalog_repo: CatalogRepository,
    permissions: Arc<PermissionTable>,
    audit: AuditTrail,
}

impl PurchasingService {
    pub fn new(
        purchasing_repo: PurchasingRepository,
        warehouse_repo: WarehouseRepository,
        catalog_repo: CatalogRepository,
        permissions: Arc<PermissionTable>,
        audit: AuditTrail,
    ) -> Self {
        Self {
            purchasing_repo,
            warehouse_repo,
            catalog_repo,
            permissions,
            audit,
        }
    }

    // ---
    // Depósitos
    // ---

    pub async fn list_warehouses(&self, actor: &Actor) -> Result<Vec<Warehouse>, AppError> {
        self.permissions
            .require(actor.role, Permission::WarehousesView)?;
        self.warehouse_repo.list().await
    }

    pub async fn create_warehouse(
        &self,
        actor: &Actor,
        payload: CreateWarehousePayload,
    ) -> Result<Warehouse, AppError> {
        self.permissions
            .require(actor.role, Permission::WarehousesCreate)?;

        let warehouse = Warehouse {
            id: Uuid::new_v4(),
            name: payload.name,
            address: payload.address,
            manager: payload.manager,
            phone: payload.phone,
            active: true,
            created_at: Utc::now(),
        };
        self.warehouse_repo.insert(&warehouse).await?;

        self.audit.record(
            actor,
            "create",
            "warehouses",
            Some(format!("Depósito criado: {}", warehouse.name)),
        );
        Ok(warehouse)
    }

    pub async fn update_warehouse(
        &self,
        actor: &Actor,
        id: Uuid,
        payload: UpdateWarehousePayload,
    ) -> Result<Warehouse, AppError> {
        self.permissions
            .require(actor.role, Permission::WarehousesEdit)?;

        let updated = self
            .warehouse_repo
            .update(id, &payload)
            .await?
            .ok_or_else(|| AppError::NotFound("Depósito".into()))?;

        self.audit.record(
            actor,
            "update",
            "warehouses",
            Some(format!("Depósito atualizado: {}", id)),
        );
        Ok(updated)
    }

    pub async fn delete_warehouse(&self, actor: &Actor, id: Uuid) -> Result<(), AppError> {
        self.permissions
            .require(actor.role, Permission::WarehousesDelete)?;

        if !self.warehouse_repo.delete(id).await? {
            return Err(AppError::NotFound("Depósito".into()));
        }
        self.audit.record(
            actor,
            "delete",
            "warehouses",
            Some(format!("Depósito excluído: {}", id)),
        );
        Ok(())
    }

    /// Visão consolidada do estoque de um produto: linhas por depósito e o
    /// agregado legado (que deve conciliar com a soma das linhas).
    pub async fn product_stock(&self, actor: &Actor, product_id: Uuid) -> Result<ProductStock, AppError> {
        self.permissions
            .require(actor.role, Permission::ProductsView)?;

        let product = self
            .catalog_repo
            .find_product(product_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Produto".into()))?;
        let warehouses = self.warehouse_repo.stock_rows_for_product(product_id).await?;
        let total = warehouses.iter().map(|row| row.quantity).sum();

        Ok(ProductStock {
            product,
            warehouses,
            total,
        })
    }

    // ---
    // Fornecedores
    // ---

    pub async fn list_suppliers(&self, actor: &Actor) -> Result<Vec<Supplier>, AppError> {
        self.permissions
            .require(actor.role, Permission::SuppliersView)?;
        self.purchasing_repo.list_suppliers().await
    }

    pub async fn create_supplier(
        &self,
        actor: &Actor,
        payload: CreateSupplierPayload,
    ) -> Result<Supplier, AppError> {
        self.permissions
            .require(actor.role, Permission::SuppliersCreate)?;

        let now = Utc::now();
        let supplier = Supplier {
            id: Uuid::new_v4(),
            name: payload.name,
            contact: payload.contact,
            email: payload.email,
            phone: payload.phone,
            address: payload.address,
            tax_id: payload.tax_id,
            active: true,
            created_at: now,
            updated_at: now,
        };
        self.purchasing_repo.insert_supplier(&supplier).await?;

        self.audit.record(
            actor,
            "create",
            "suppliers",
            Some(format!("Fornecedor criado: {}", supplier.name)),
        );
        Ok(supplier)
    }

    pub async fn update_supplier(
        &self,
        actor: &Actor,
        id: Uuid,
        payload: UpdateSupplierPayload,
    ) -> Result<Supplier, AppError> {
        self.permissions
            .require(actor.role, Permission::SuppliersEdit)?;

        let updated = self
            .purchasing_repo
            .update_supplier(id, &payload)
            .await?
            .ok_or_else(|| AppError::NotFound("Fornecedor".into()))?;

        self.audit.record(
            actor,
            "update",
            "suppliers",
            Some(format!("Fornecedor atualizado: {}", id)),
        );
        Ok(updated)
    }

    pub async fn delete_supplier(&self, actor: &Actor, id: Uuid) -> Result<(), AppError> {
        self.permissions
            .require(actor.role, Permission::SuppliersDelete)?;

        if !self.purchasing_repo.delete_supplier(id).await? {
            return Err(AppError::NotFound("Fornecedor".into()));
        }
        self.audit.record(
            actor,
            "delete",
            "suppliers",
            Some(format!("Fornecedor excluído: {}", id)),
        );
        Ok(())
    }

    /// Upsert por par (produto, fornecedor): a segunda gravação do mesmo
    /// par atualiza a linha existente em vez de duplicá-la.
    pub async fn upsert_supplier_price(
        &self,
        actor: &Actor,
        payload: UpsertSupplierPricePayload,
    ) -> Result<SupplierPrice, AppError> {
        self.permissions
            .require(actor.role, Permission::SuppliersEdit)?;

        let product = self
            .catalog_repo
            .find_product(payload.product_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Produto".into()))?;
        let supplier = self
            .purchasing_repo
            .find_supplier(payload.supplier_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Fornecedor".into()))?;

        let price = match self
            .purchasing_repo
            .find_price(payload.product_id, payload.supplier_id)
            .await?
        {
            Some(existing) => self
                .purchasing_repo
                .update_price(existing.id, payload.price, payload.supplier_code.as_deref())
                .await?
                .ok_or_else(|| AppError::NotFound("Preço de fornecedor".into()))?,
            None => {
                let price = SupplierPrice {
                    id: Uuid::new_v4(),
                    product_id: product.id,
                    product_name: product.name.clone(),
                    supplier_id: supplier.id,
                    supplier_name: supplier.name.clone(),
                    price: payload.price,
                    supplier_code: payload.supplier_code,
                    updated_at: Utc::now(),
                };
                self.purchasing_repo.insert_price(&price).await?;
                price
            }
        };

        self.audit.record(
            actor,
            "update",
            "suppliers",
            Some(format!(
                "Preço de {} atualizado para o fornecedor {}",
                product.name, supplier.name
            )),
        );
        Ok(price)
    }

    pub async fn prices_for_product(
        &self,
        actor: &Actor,
        product_id: Uuid,
    ) -> Result<Vec<SupplierPrice>, AppError> {
        self.permissions
            .require(actor.role, Permission::ProductsView)?;
        self.purchasing_repo.prices_for_product(product_id).await
    }

    // ---
    // Compras
    // ---

    pub async fn list_purchases(&self, actor: &Actor, limit: usize) -> Result<Vec<Purchase>, AppError> {
        self.permissions
            .require(actor.role, Permission::PurchasesView)?;
        self.purchasing_repo.list_purchases(limit).await
    }

    pub async fn get_purchase(&self, actor: &Actor, id: Uuid) -> Result<Purchase, AppError> {
        self.permissions
            .require(actor.role, Permission::PurchasesView)?;
        self.purchasing_repo
            .find_purchase(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Compra".into()))
    }

    /// Ordem de compra: nasce `pending`, sem nenhum efeito de estoque.
    pub async fn create_purchase(
        &self,
        actor: &Actor,
        payload: CreatePurchasePayload,
    ) -> Result<Purchase, AppError> {
        self.permissions
            .require(actor.role, Permission::PurchasesCreate)?;

        let supplier = self
            .purchasing_repo
            .find_supplier(payload.supplier_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Fornecedor".into()))?;
        let warehouse = self
            .warehouse_repo
            .find(payload.warehouse_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Depósito".into()))?;

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
        let purchase = Purchase {
            id: Uuid::new_v4(),
            supplier_id: supplier.id,
            supplier_name: supplier.name,
            warehouse_id: warehouse.id,
            warehouse_name: warehouse.name,
            items,
            invoice_number: payload.invoice_number,
            notes: payload.notes,
            total,
            status: PurchaseStatus::Pending,
            date: now,
            created_at: now,
            received_by_id: None,
            received_by_name: None,
            received_at: None,
        };
        self.purchasing_repo.insert_purchase(&purchase).await?;

        self.audit.record(
            actor,
            "create",
            "purchases",
            Some(format!("Compra criada no total de {}", total)),
        );
        Ok(purchase)
    }

    /// Recebimento: a transição condicional pending -> received carimba o
    /// recebedor e é o que impede o recebimento duplicado; só depois as
    /// linhas entram no estoque do depósito e no agregado do produto.
    pub async fn receive_purchase(&self, actor: &Actor, id: Uuid) -> Result<Purchase, AppError> {
        self.permissions
            .require(actor.role, Permission::PurchasesReceive)?;

        let purchase = match self.purchasing_repo.claim_receive(id, actor).await? {
            StatusClaim::Done(purchase) => purchase,
            StatusClaim::Rejected(status) => {
                return Err(AppError::InvalidState(format!(
                    "A compra não pode ser recebida no status '{}'",
                    status.as_str()
                )));
            }
            StatusClaim::Missing => return Err(AppError::NotFound("Compra".into())),
        };

        for item in &purchase.items {
            self.warehouse_repo
                .add_stock(
                    item.product_id,
                    purchase.warehouse_id,
                    &purchase.warehouse_name,
                    item.quantity,
                )
                .await?;
            self.catalog_repo
                .increment_stock(item.product_id, item.quantity)
                .await?;
        }

        self.audit.record(
            actor,
            "receive",
            "purchases",
            Some(format!(
                "Compra {} recebida no depósito {}",
                id, purchase.warehouse_name
            )),
        );
        Ok(purchase)
    }

    /// Cancelamento de uma ordem ainda pendente. Nenhum efeito de estoque.
    pub async fn cancel_purchase(&self, actor: &Actor, id: Uuid) -> Result<Purchase, AppError> {
        self.permissions
            .require(actor.role, Permission::PurchasesCreate)?;

        let purchase = match self.purchasing_repo.claim_cancel(id).await? {
            StatusClaim::Done(purchase) => purchase,
            StatusClaim::Rejected(status) => {
                return Err(AppError::InvalidState(format!(
                    "A compra não pode ser cancelada no status '{}'",
                    status.as_str()
                )));
            }
            StatusClaim::Missing => return Err(AppError::NotFound("Compra".into())),
        };

        self.audit.record(
            actor,
            "cancel",
            "purchases",
            Some(format!("Compra cancelada: {}", id)),
        );
        Ok(purchase)
    }
}
