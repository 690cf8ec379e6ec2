// src/services/catalog_service.rs

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::CatalogRepository,
    models::auth::Actor,
    models::catalog::{
        Category, CreateCategoryPayload, CreateProductPayload, Product, UpdateCategoryPayload,
        UpdateProductPayload,
    },
    permissions::{Permission, PermissionTable},
    services::audit::AuditTrail,
};

#[derive(Clone)]
pub struct CatalogService {
    catalog_repo: CatalogRepository,
    permissions: Arc<PermissionTable>,
    audit: AuditTrail,
}

impl CatalogService {
    pub fn new(
        catalog_repo: CatalogRepository,
        permissions: Arc<PermissionTable>,
        audit: AuditTrail,
    ) -> Self {
        Self {
            catalog_repo,
            permissions,
            audit,
        }
    }

    // ---
    // Categorias
    // ---

    pub async fn list_categories(&self) -> Result<Vec<Category>, AppError> {
        self.catalog_repo.list_categories().await
    }

    pub async fn create_category(
        &self,
        actor: &Actor,
        payload: CreateCategoryPayload,
    ) -> Result<Category, AppError> {
        self.permissions
            .require(actor.role, Permission::ProductsCreate)?;

        if self
            .catalog_repo
            .find_category_by_name(&payload.name)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "Já existe uma categoria com esse nome".into(),
            ));
        }

        let category = Category {
            id: Uuid::new_v4(),
            name: payload.name,
            description: payload.description,
            created_at: Utc::now(),
        };
        self.catalog_repo.insert_category(&category).await?;

        self.audit.record(
            actor,
            "create",
            "categories",
            Some(format!("Categoria criada: {}", category.name)),
        );
        Ok(category)
    }

    pub async fn update_category(
        &self,
        actor: &Actor,
        id: Uuid,
        payload: UpdateCategoryPayload,
    ) -> Result<Category, AppError> {
        self.permissions
            .require(actor.role, Permission::ProductsEdit)?;

        let updated = self
            .catalog_repo
            .update_category(id, &payload)
            .await?
            .ok_or_else(|| AppError::NotFound("Categoria".into()))?;

        self.audit.record(
            actor,
            "update",
            "categories",
            Some(format!("Categoria atualizada: {}", id)),
        );
        Ok(updated)
    }

    /// Uma categoria em uso não pode ser excluída.
    pub async fn delete_category(&self, actor: &Actor, id: Uuid) -> Result<(), AppError> {
        self.permissions
            .require(actor.role, Permission::ProductsDelete)?;

        if self.catalog_repo.find_category(id).await?.is_none() {
            return Err(AppError::NotFound("Categoria".into()));
        }

        let in_use = self.catalog_repo.count_products_in_category(id).await?;
        if in_use > 0 {
            return Err(AppError::InvalidState(format!(
                "Não é possível excluir: a categoria está sendo usada por {} produto(s)",
                in_use
            )));
        }

        self.catalog_repo.delete_category(id).await?;
        self.audit.record(
            actor,
            "delete",
            "categories",
            Some(format!("Categoria excluída: {}", id)),
        );
        Ok(())
    }

    // ---
    // Produtos
    // ---

    pub async fn list_products(&self, actor: &Actor) -> Result<Vec<Product>, AppError> {
        self.permissions
            .require(actor.role, Permission::ProductsView)?;
        self.catalog_repo.list_products().await
    }

    pub async fn search_products(&self, actor: &Actor, term: &str) -> Result<Vec<Product>, AppError> {
        self.permissions
            .require(actor.role, Permission::ProductsView)?;
        self.catalog_repo.search_products(term, 20).await
    }

    pub async fn get_product(&self, actor: &Actor, id: Uuid) -> Result<Product, AppError> {
        self.permissions
            .require(actor.role, Permission::ProductsView)?;
        self.catalog_repo
            .find_product(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Produto".into()))
    }

    pub async fn create_product(
        &self,
        actor: &Actor,
        payload: CreateProductPayload,
    ) -> Result<Product, AppError> {
        self.permissions
            .require(actor.role, Permission::ProductsCreate)?;

        // Código de barras é único quando presente.
        if let Some(barcode) = &payload.barcode {
            if self
                .catalog_repo
                .find_product_by_barcode(barcode, None)
                .await?
                .is_some()
            {
                return Err(AppError::Conflict(
                    "Já existe um produto com esse código de barras".into(),
                ));
            }
        }

        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4(),
            name: payload.name,
            description: payload.description,
            barcode: payload.barcode,
            category_id: payload.category_id,
            retail_price: payload.retail_price,
            wholesale_price: payload.wholesale_price,
            stock: payload.stock,
            min_stock: payload.min_stock,
            image_url: payload.image_url,
            created_at: now,
            updated_at: now,
        };
        self.catalog_repo.insert_product(&product).await?;

        self.audit.record(
            actor,
            "create",
            "products",
            Some(format!("Produto criado: {}", product.name)),
        );
        Ok(product)
    }

    pub async fn update_product(
        &self,
        actor: &Actor,
        id: Uuid,
        payload: UpdateProductPayload,
    ) -> Result<Product, AppError> {
        self.permissions
            .require(actor.role, Permission::ProductsEdit)?;

        if self.catalog_repo.find_product(id).await?.is_none() {
            return Err(AppError::NotFound("Produto".into()));
        }

        if let Some(barcode) = &payload.barcode {
            if self
                .catalog_repo
                .find_product_by_barcode(barcode, Some(id))
                .await?
                .is_some()
            {
                return Err(AppError::Conflict(
                    "Já existe um produto com esse código de barras".into(),
                ));
            }
        }

        let updated = self
            .catalog_repo
            .update_product(id, &payload)
            .await?
            .ok_or_else(|| AppError::NotFound("Produto".into()))?;

        self.audit.record(
            actor,
            "update",
            "products",
            Some(format!("Produto atualizado: {}", id)),
        );
        Ok(updated)
    }

    pub async fn delete_product(&self, actor: &Actor, id: Uuid) -> Result<(), AppError> {
        self.permissions
            .require(actor.role, Permission::ProductsDelete)?;

        if !self.catalog_repo.delete_product(id).await? {
            return Err(AppError::NotFound("Produto".into()));
        }
        self.audit.record(
            actor,
            "delete",
            "products",
            Some(format!("Produto excluído: {}", id)),
        );
        Ok(())
    }
}
