// src/config.rs

use std::{env, sync::Arc};

use crate::{
    db::{
        AuditRepository, CatalogRepository, CrmRepository, PurchasingRepository, QuoteRepository,
        SaleRepository, UserRepository, WarehouseRepository,
    },
    permissions::PermissionTable,
    services::{
        audit::AuditTrail, auth::AuthService, catalog_service::CatalogService,
        crm_service::CrmService, purchasing_service::PurchasingService,
        quote_service::QuoteService, sale_service::SaleService,
    },
    store::{DocumentStore, MemoryStore},
};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub permissions: Arc<PermissionTable>,
    pub audit: AuditTrail,
    pub audit_repo: AuditRepository,
    pub auth_service: AuthService,
    pub catalog_service: CatalogService,
    pub crm_service: CrmService,
    pub sale_service: SaleService,
    pub quote_service: QuoteService,
    pub purchasing_service: PurchasingService,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET deve ser definido");

        // Flag de compatibilidade: conversão de orçamento lança (ou não) o
        // total na conta corrente do cliente. Ligada por padrão.
        let convert_updates_balance = env::var("QUOTE_CONVERT_UPDATES_BALANCE")
            .map(|v| !matches!(v.as_str(), "0" | "false" | "off"))
            .unwrap_or(true);

        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        tracing::info!("✅ Armazenamento de documentos inicializado");

        // A tabela de permissões é imutável e montada uma única vez;
        // os serviços a recebem por injeção.
        let permissions = Arc::new(PermissionTable::builtin());

        // --- Monta o gráfico de dependências ---
        let user_repo = UserRepository::new(store.clone());
        let catalog_repo = CatalogRepository::new(store.clone());
        let crm_repo = CrmRepository::new(store.clone());
        let sale_repo = SaleRepository::new(store.clone());
        let quote_repo = QuoteRepository::new(store.clone());
        let warehouse_repo = WarehouseRepository::new(store.clone());
        let purchasing_repo = PurchasingRepository::new(store.clone());
        let audit_repo = AuditRepository::new(store.clone());

        // A trilha de auditoria consome eventos em uma task própria.
        let audit = AuditTrail::spawn(audit_repo.clone());

        let auth_service = AuthService::new(
            user_repo,
            permissions.clone(),
            audit.clone(),
            jwt_secret,
        );
        let catalog_service =
            CatalogService::new(catalog_repo.clone(), permissions.clone(), audit.clone());
        let crm_service = CrmService::new(
            crm_repo.clone(),
            sale_repo.clone(),
            permissions.clone(),
            audit.clone(),
        );
        let sale_service = SaleService::new(
            sale_repo.clone(),
            catalog_repo.clone(),
            crm_repo.clone(),
            permissions.clone(),
            audit.clone(),
        );
        let quote_service = QuoteService::new(
            quote_repo,
            sale_repo,
            catalog_repo.clone(),
            crm_repo,
            permissions.clone(),
            audit.clone(),
            convert_updates_balance,
        );
        let purchasing_service = PurchasingService::new(
            purchasing_repo,
            warehouse_repo,
            catalog_repo,
            permissions.clone(),
            audit.clone(),
        );

        Ok(Self {
            store,
            permissions,
            audit,
            audit_repo,
            auth_service,
            catalog_service,
            crm_service,
            sale_service,
            quote_service,
            purchasing_service,
        })
    }
}
