// src/permissions.rs

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::common::error::AppError;

// Os quatro papéis do sistema. O papel vive no documento do usuário; o que
// cada papel pode fazer vive na PermissionTable, montada uma única vez no
// AppState e injetada nos serviços (nada de estado global).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Seller,
    WarehouseClerk,
    Accountant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    ProductsView,
    ProductsCreate,
    ProductsEdit,
    ProductsDelete,

    SalesView,
    SalesCreate,
    SalesVoid,

    CustomersView,
    CustomersCreate,
    CustomersEdit,
    CustomersDelete,

    QuotesView,
    QuotesCreate,
    QuotesEdit,
    QuotesDelete,
    QuotesConvert,

    UsersView,
    UsersCreate,
    UsersEdit,
    UsersDelete,

    ReportsView,

    SuppliersView,
    SuppliersCreate,
    SuppliersEdit,
    SuppliersDelete,

    PurchasesView,
    PurchasesCreate,
    PurchasesReceive,

    WarehousesView,
    WarehousesCreate,
    WarehousesEdit,
    WarehousesDelete,
}

impl Permission {
    pub const fn slug(self) -> &'static str {
        match self {
            Permission::ProductsView => "products:view",
            Permission::ProductsCreate => "products:create",
            Permission::ProductsEdit => "products:edit",
            Permission::ProductsDelete => "products:delete",
            Permission::SalesView => "sales:view",
            Permission::SalesCreate => "sales:create",
            Permission::SalesVoid => "sales:void",
            Permission::CustomersView => "customers:view",
            Permission::CustomersCreate => "customers:create",
            Permission::CustomersEdit => "customers:edit",
            Permission::CustomersDelete => "customers:delete",
            Permission::QuotesView => "quotes:view",
            Permission::QuotesCreate => "quotes:create",
            Permission::QuotesEdit => "quotes:edit",
            Permission::QuotesDelete => "quotes:delete",
            Permission::QuotesConvert => "quotes:convert",
            Permission::UsersView => "users:view",
            Permission::UsersCreate => "users:create",
            Permission::UsersEdit => "users:edit",
            Permission::UsersDelete => "users:delete",
            Permission::ReportsView => "reports:view",
            Permission::SuppliersView => "suppliers:view",
            Permission::SuppliersCreate => "suppliers:create",
            Permission::SuppliersEdit => "suppliers:edit",
            Permission::SuppliersDelete => "suppliers:delete",
            Permission::PurchasesView => "purchases:view",
            Permission::PurchasesCreate => "purchases:create",
            Permission::PurchasesReceive => "purchases:receive",
            Permission::WarehousesView => "warehouses:view",
            Permission::WarehousesCreate => "warehouses:create",
            Permission::WarehousesEdit => "warehouses:edit",
            Permission::WarehousesDelete => "warehouses:delete",
        }
    }
}

const ALL_PERMISSIONS: &[Permission] = &[
    Permission::ProductsView,
    Permission::ProductsCreate,
    Permission::ProductsEdit,
    Permission::ProductsDelete,
    Permission::SalesView,
    Permission::SalesCreate,
    Permission::SalesVoid,
    Permission::CustomersView,
    Permission::CustomersCreate,
    Permission::CustomersEdit,
    Permission::CustomersDelete,
    Permission::QuotesView,
    Permission::QuotesCreate,
    Permission::QuotesEdit,
    Permission::QuotesDelete,
    Permission::QuotesConvert,
    Permission::UsersView,
    Permission::UsersCreate,
    Permission::UsersEdit,
    Permission::UsersDelete,
    Permission::ReportsView,
    Permission::SuppliersView,
    Permission::SuppliersCreate,
    Permission::SuppliersEdit,
    Permission::SuppliersDelete,
    Permission::PurchasesView,
    Permission::PurchasesCreate,
    Permission::PurchasesReceive,
    Permission::WarehousesView,
    Permission::WarehousesCreate,
    Permission::WarehousesEdit,
    Permission::WarehousesDelete,
];

/// Tabela imutável papel -> permissões.
pub struct PermissionTable {
    grants: HashMap<Role, HashSet<Permission>>,
}

impl PermissionTable {
    /// A tabela padrão do produto.
    pub fn builtin() -> Self {
        let mut grants = HashMap::new();

        // Admin tem todas as permissões.
        grants.insert(Role::Admin, ALL_PERMISSIONS.iter().copied().collect());

        // Vendedor: vendas, clientes e orçamentos completos; produtos só leitura.
        grants.insert(
            Role::Seller,
            HashSet::from([
                Permission::ProductsView,
                Permission::SalesView,
                Permission::SalesCreate,
                Permission::CustomersView,
                Permission::CustomersCreate,
                Permission::CustomersEdit,
                Permission::QuotesView,
                Permission::QuotesCreate,
                Permission::QuotesEdit,
                Permission::QuotesConvert,
            ]),
        );

        // Estoquista: produtos completos + depósitos + compras.
        grants.insert(
            Role::WarehouseClerk,
            HashSet::from([
                Permission::ProductsView,
                Permission::ProductsCreate,
                Permission::ProductsEdit,
                Permission::ProductsDelete,
                Permission::WarehousesView,
                Permission::WarehousesCreate,
                Permission::WarehousesEdit,
                Permission::PurchasesView,
                Permission::PurchasesCreate,
                Permission::PurchasesReceive,
                Permission::SuppliersView,
            ]),
        );

        // Contador: somente leitura de vendas e relatórios.
        grants.insert(
            Role::Accountant,
            HashSet::from([
                Permission::SalesView,
                Permission::ReportsView,
                Permission::CustomersView,
                Permission::ProductsView,
            ]),
        );

        Self { grants }
    }

    pub fn allowed(&self, role: Role, permission: Permission) -> bool {
        self.grants
            .get(&role)
            .map(|set| set.contains(&permission))
            .unwrap_or(false)
    }

    /// O portão em si: toda entrada de serviço que altera estado chama isto
    /// ANTES de qualquer leitura ou escrita.
    pub fn require(&self, role: Role, permission: Permission) -> Result<(), AppError> {
        if self.allowed(role, permission) {
            return Ok(());
        }
        Err(AppError::Forbidden(permission.slug()))
    }

    /// Slugs do papel, para a resposta de `/auth/permissions`.
    pub fn slugs_for(&self, role: Role) -> Vec<&'static str> {
        let mut slugs: Vec<&'static str> = self
            .grants
            .get(&role)
            .map(|set| set.iter().map(|p| p.slug()).collect())
            .unwrap_or_default();
        slugs.sort_unstable();
        slugs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_can_do_everything() {
        let table = PermissionTable::builtin();
        for perm in ALL_PERMISSIONS {
            assert!(table.allowed(Role::Admin, *perm), "admin sem {}", perm.slug());
        }
    }

    #[test]
    fn seller_cannot_void_or_receive() {
        let table = PermissionTable::builtin();
        assert!(table.allowed(Role::Seller, Permission::SalesCreate));
        assert!(table.allowed(Role::Seller, Permission::QuotesConvert));
        assert!(!table.allowed(Role::Seller, Permission::SalesVoid));
        assert!(!table.allowed(Role::Seller, Permission::PurchasesReceive));
        assert!(!table.allowed(Role::Seller, Permission::ProductsCreate));
    }

    #[test]
    fn warehouse_clerk_handles_stock_not_sales() {
        let table = PermissionTable::builtin();
        assert!(table.allowed(Role::WarehouseClerk, Permission::PurchasesReceive));
        assert!(table.allowed(Role::WarehouseClerk, Permission::ProductsDelete));
        assert!(!table.allowed(Role::WarehouseClerk, Permission::SalesCreate));
        assert!(!table.allowed(Role::WarehouseClerk, Permission::WarehousesDelete));
    }

    #[test]
    fn accountant_is_read_only() {
        let table = PermissionTable::builtin();
        assert!(table.allowed(Role::Accountant, Permission::SalesView));
        assert!(!table.allowed(Role::Accountant, Permission::SalesCreate));
        assert!(!table.allowed(Role::Accountant, Permission::CustomersEdit));
    }

    #[test]
    fn require_yields_forbidden_with_the_slug() {
        let table = PermissionTable::builtin();
        let err = table
            .require(Role::Accountant, Permission::SalesVoid)
            .unwrap_err();
        match err {
            AppError::Forbidden(slug) => assert_eq!(slug, "sales:void"),
            other => panic!("esperava Forbidden, veio {other:?}"),
        }
    }
}
