// Testes de ciclo de vida: venda, anulação, conversão de orçamento e
// recebimento de compra, exercitados de ponta a ponta sobre o motor em
// memória do adaptador de documentos.

use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;

use ferreteria_backend::common::error::AppError;
use ferreteria_backend::db::{
    AuditRepository, CatalogRepository, CrmRepository, PurchasingRepository, QuoteRepository,
    SaleRepository, UserRepository, WarehouseRepository,
};
use ferreteria_backend::models::auth::Actor;
use ferreteria_backend::models::catalog::{CreateProductPayload, Product};
use ferreteria_backend::models::crm::{CreateCustomerPayload, Customer};
use ferreteria_backend::models::purchasing::{
    CreatePurchasePayload, CreateSupplierPayload, CreateWarehousePayload, PurchaseStatus,
    Supplier, Warehouse,
};
use ferreteria_backend::models::quotes::{CreateQuotePayload, QuoteStatus};
use ferreteria_backend::models::sales::{
    CreateSalePayload, PaymentMethod, SaleItemPayload, SaleStatus,
};
use ferreteria_backend::permissions::{PermissionTable, Role};
use ferreteria_backend::services::audit::AuditTrail;
use ferreteria_backend::services::auth::AuthService;
use ferreteria_backend::services::catalog_service::CatalogService;
use ferreteria_backend::services::crm_service::CrmService;
use ferreteria_backend::services::purchasing_service::PurchasingService;
use ferreteria_backend::services::quote_service::QuoteService;
use ferreteria_backend::services::sale_service::SaleService;
use ferreteria_backend::store::{DocumentStore, MemoryStore};

struct TestApp {
    catalog_service: CatalogService,
    crm_service: CrmService,
    sale_service: SaleService,
    quote_service: QuoteService,
    purchasing_service: PurchasingService,
    auth_service: AuthService,
    audit_repo: AuditRepository,
}

fn build_app(convert_updates_balance: bool) -> TestApp {
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
    let permissions = Arc::new(PermissionTable::builtin());

    let user_repo = UserRepository::new(store.clone());
    let catalog_repo = CatalogRepository::new(store.clone());
    let crm_repo = CrmRepository::new(store.clone());
    let sale_repo = SaleRepository::new(store.clone());
    let quote_repo = QuoteRepository::new(store.clone());
    let warehouse_repo = WarehouseRepository::new(store.clone());
    let purchasing_repo = PurchasingRepository::new(store.clone());
    let audit_repo = AuditRepository::new(store.clone());

    let audit = AuditTrail::spawn(audit_repo.clone());

    TestApp {
        catalog_service: CatalogService::new(
            catalog_repo.clone(),
            permissions.clone(),
            audit.clone(),
        ),
        crm_service: CrmService::new(
            crm_repo.clone(),
            sale_repo.clone(),
            permissions.clone(),
            audit.clone(),
        ),
        sale_service: SaleService::new(
            sale_repo.clone(),
            catalog_repo.clone(),
            crm_repo.clone(),
            permissions.clone(),
            audit.clone(),
        ),
        quote_service: QuoteService::new(
            quote_repo,
            sale_repo,
            catalog_repo.clone(),
            crm_repo,
            permissions.clone(),
            audit.clone(),
            convert_updates_balance,
        ),
        purchasing_service: PurchasingService::new(
            purchasing_repo,
            warehouse_repo,
            catalog_repo,
            permissions.clone(),
            audit.clone(),
        ),
        auth_service: AuthService::new(user_repo, permissions, audit, "segredo-de-teste".into()),
        audit_repo,
    }
}

fn actor(role: Role) -> Actor {
    Actor {
        id: Uuid::new_v4(),
        name: "Usuário de Teste".into(),
        role,
    }
}

fn admin() -> Actor {
    actor(Role::Admin)
}

async fn seed_product(app: &TestApp, name: &str, stock: i64) -> Product {
    app.catalog_service
        .create_product(
            &admin(),
            CreateProductPayload {
                name: name.into(),
                description: None,
                barcode: None,
                category_id: None,
                retail_price: Decimal::from(100),
                wholesale_price: Decimal::from(80),
                stock,
                min_stock: 0,
                image_url: None,
            },
        )
        .await
        .expect("produto de teste")
}

async fn seed_customer(app: &TestApp) -> Customer {
    app.crm_service
        .create(
            &admin(),
            CreateCustomerPayload {
                name: "Cliente de Teste".into(),
                tax_id: None,
                email: None,
                phone: None,
                address: None,
                credit_limit: Decimal::ZERO,
            },
        )
        .await
        .expect("cliente de teste")
}

async fn seed_warehouse(app: &TestApp) -> Warehouse {
    app.purchasing_service
        .create_warehouse(
            &admin(),
            CreateWarehousePayload {
                name: "Depósito Central".into(),
                address: None,
                manager: None,
                phone: None,
            },
        )
        .await
        .expect("depósito de teste")
}

async fn seed_supplier(app: &TestApp) -> Supplier {
    app.purchasing_service
        .create_supplier(
            &admin(),
            CreateSupplierPayload {
                name: "Fornecedor Industrial SA".into(),
                contact: None,
                email: None,
                phone: None,
                address: None,
                tax_id: None,
            },
        )
        .await
        .expect("fornecedor de teste")
}

fn item(product: &Product, quantity: i64, subtotal: i64) -> SaleItemPayload {
    SaleItemPayload {
        product_id: product.id,
        quantity,
        unit_price: Decimal::from(subtotal / quantity.max(1)),
        subtotal: Decimal::from(subtotal),
    }
}

fn sale_payload(customer: Option<Uuid>, items: Vec<SaleItemPayload>) -> CreateSalePayload {
    CreateSalePayload {
        customer_id: customer,
        items,
        payment_method: PaymentMethod::Cash,
        notes: None,
    }
}

async fn product_stock(app: &TestApp, id: Uuid) -> i64 {
    app.catalog_service
        .get_product(&admin(), id)
        .await
        .expect("produto existente")
        .stock
}

async fn customer_balance(app: &TestApp, id: Uuid) -> Decimal {
    app.crm_service
        .get(&admin(), id)
        .await
        .expect("cliente existente")
        .balance
}

// ---
// Venda: criação e anulação
// ---

#[tokio::test]
async fn sale_decrements_stock_and_void_restores_it_once() {
    let app = build_app(true);
    let product = seed_product(&app, "Martelo", 10).await;
    let customer = seed_customer(&app).await;
    let seller = actor(Role::Seller);

    let sale = app
        .sale_service
        .create(&seller, sale_payload(Some(customer.id), vec![item(&product, 4, 400)]))
        .await
        .unwrap();

    assert_eq!(sale.status, SaleStatus::Completed);
    assert_eq!(sale.total, Decimal::from(400));
    assert_eq!(sale.items[0].product_name, "Martelo");
    assert_eq!(product_stock(&app, product.id).await, 6);
    assert_eq!(customer_balance(&app, customer.id).await, Decimal::from(400));

    // Anula: estoque e saldo voltam ao que eram.
    let voided = app.sale_service.void(&admin(), sale.id).await.unwrap();
    assert_eq!(voided.status, SaleStatus::Voided);
    assert_eq!(product_stock(&app, product.id).await, 10);
    assert_eq!(customer_balance(&app, customer.id).await, Decimal::ZERO);

    // Segunda anulação é recusada e nada muda.
    let err = app.sale_service.void(&admin(), sale.id).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidState(_)));
    assert_eq!(product_stock(&app, product.id).await, 10);
    assert_eq!(customer_balance(&app, customer.id).await, Decimal::ZERO);
}

#[tokio::test]
async fn oversized_sale_is_rejected_without_any_effect() {
    let app = build_app(true);
    let product = seed_product(&app, "Parafuso", 2).await;
    let seller = actor(Role::Seller);

    let err = app
        .sale_service
        .create(&seller, sale_payload(None, vec![item(&product, 5, 500)]))
        .await
        .unwrap_err();

    match err {
        AppError::InsufficientStock { product: name, available } => {
            assert_eq!(name, "Parafuso");
            assert_eq!(available, 2);
        }
        other => panic!("esperava InsufficientStock, veio {other:?}"),
    }

    // Nenhuma venda persistida, nenhum produto alterado.
    assert_eq!(product_stock(&app, product.id).await, 2);
    assert!(app.sale_service.list(&admin(), 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn failed_multi_item_sale_returns_stock_already_taken() {
    let app = build_app(true);
    let plenty = seed_product(&app, "Prego", 10).await;
    let scarce = seed_product(&app, "Furadeira", 1).await;
    let seller = actor(Role::Seller);

    let err = app
        .sale_service
        .create(
            &seller,
            sale_payload(None, vec![item(&plenty, 2, 20), item(&scarce, 5, 500)]),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InsufficientStock { .. }));

    // A baixa do primeiro item foi compensada.
    assert_eq!(product_stock(&app, plenty.id).await, 10);
    assert_eq!(product_stock(&app, scarce.id).await, 1);
}

#[tokio::test]
async fn sale_with_unknown_product_is_not_found() {
    let app = build_app(true);
    let seller = actor(Role::Seller);

    let ghost = Product {
        id: Uuid::new_v4(),
        name: "Fantasma".into(),
        description: None,
        barcode: None,
        category_id: None,
        retail_price: Decimal::ZERO,
        wholesale_price: Decimal::ZERO,
        stock: 0,
        min_stock: 0,
        image_url: None,
        created_at: chrono::Utc::now(),
        updated_at: chrono::Utc::now(),
    };

    let err = app
        .sale_service
        .create(&seller, sale_payload(None, vec![item(&ghost, 1, 100)]))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

// ---
// Orçamento: criação, edição de status e conversão
// ---

#[tokio::test]
async fn quote_does_not_reserve_stock_and_converts_exactly_once() {
    let app = build_app(true);
    let product = seed_product(&app, "Serrote", 5).await;
    let customer = seed_customer(&app).await;
    let seller = actor(Role::Seller);

    let quote = app
        .quote_service
        .create(
            &seller,
            CreateQuotePayload {
                customer_id: customer.id,
                items: vec![item(&product, 3, 300)],
                validity_days: 15,
                notes: None,
            },
        )
        .await
        .unwrap();

    // Orçamento não mexe no estoque.
    assert_eq!(quote.status, QuoteStatus::Pending);
    assert_eq!(quote.total, Decimal::from(300));
    assert_eq!(product_stock(&app, product.id).await, 5);

    let converted = app.quote_service.convert(&seller, quote.id).await.unwrap();
    assert_eq!(converted.quote.status, QuoteStatus::Converted);
    assert_eq!(converted.quote.converted_sale_id, Some(converted.sale.id));
    assert_eq!(converted.sale.total, quote.total);
    assert_eq!(product_stock(&app, product.id).await, 2);

    // Converter de novo falha e não cria segunda venda.
    let err = app.quote_service.convert(&seller, quote.id).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidState(_)));
    assert_eq!(app.sale_service.list(&admin(), 10).await.unwrap().len(), 1);
    assert_eq!(product_stock(&app, product.id).await, 2);
}

#[tokio::test]
async fn convert_without_stock_releases_the_quote() {
    let app = build_app(true);
    let product = seed_product(&app, "Betoneira", 1).await;
    let customer = seed_customer(&app).await;
    let seller = actor(Role::Seller);

    let quote = app
        .quote_service
        .create(
            &seller,
            CreateQuotePayload {
                customer_id: customer.id,
                items: vec![item(&product, 4, 4000)],
                validity_days: 15,
                notes: None,
            },
        )
        .await
        .unwrap();

    let err = app.quote_service.convert(&seller, quote.id).await.unwrap_err();
    assert!(matches!(err, AppError::InsufficientStock { .. }));

    // A reivindicação foi desfeita: o orçamento segue pendente e pode ser
    // convertido mais tarde, quando houver estoque.
    let reloaded = app.quote_service.get(&admin(), quote.id).await.unwrap();
    assert_eq!(reloaded.status, QuoteStatus::Pending);
    assert_eq!(reloaded.converted_sale_id, None);
    assert_eq!(product_stock(&app, product.id).await, 1);
    assert!(app.sale_service.list(&admin(), 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn convert_updates_customer_balance_according_to_the_flag() {
    for (flag, expected) in [(true, Decimal::from(300)), (false, Decimal::ZERO)] {
        let app = build_app(flag);
        let product = seed_product(&app, "Trena", 5).await;
        let customer = seed_customer(&app).await;
        let seller = actor(Role::Seller);

        let quote = app
            .quote_service
            .create(
                &seller,
                CreateQuotePayload {
                    customer_id: customer.id,
                    items: vec![item(&product, 3, 300)],
                    validity_days: 15,
                    notes: None,
                },
            )
            .await
            .unwrap();
        app.quote_service.convert(&seller, quote.id).await.unwrap();

        assert_eq!(customer_balance(&app, customer.id).await, expected);
    }
}

#[tokio::test]
async fn quote_status_updates_stop_at_conversion() {
    let app = build_app(true);
    let product = seed_product(&app, "Nível", 5).await;
    let customer = seed_customer(&app).await;
    let seller = actor(Role::Seller);

    let quote = app
        .quote_service
        .create(
            &seller,
            CreateQuotePayload {
                customer_id: customer.id,
                items: vec![item(&product, 1, 100)],
                validity_days: 15,
                notes: None,
            },
        )
        .await
        .unwrap();

    // Edição comum de status funciona.
    let approved = app
        .quote_service
        .update_status(&seller, quote.id, QuoteStatus::Approved)
        .await
        .unwrap();
    assert_eq!(approved.status, QuoteStatus::Approved);

    // Marcar como convertido na mão é recusado.
    let err = app
        .quote_service
        .update_status(&seller, quote.id, QuoteStatus::Converted)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidState(_)));

    // Depois da conversão, o status congela.
    app.quote_service.convert(&seller, quote.id).await.unwrap();
    let err = app
        .quote_service
        .update_status(&seller, quote.id, QuoteStatus::Rejected)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidState(_)));
}

// ---
// Compra: criação, recebimento e cancelamento
// ---

#[tokio::test]
async fn receiving_a_purchase_fills_warehouse_and_aggregate_stock() {
    let app = build_app(true);
    let product = seed_product(&app, "Cimento", 0).await;
    let warehouse = seed_warehouse(&app).await;
    let supplier = seed_supplier(&app).await;
    let clerk = actor(Role::WarehouseClerk);

    let purchase = app
        .purchasing_service
        .create_purchase(
            &clerk,
            CreatePurchasePayload {
                supplier_id: supplier.id,
                warehouse_id: warehouse.id,
                items: vec![item(&product, 20, 1500)],
                invoice_number: None,
                notes: None,
            },
        )
        .await
        .unwrap();

    // Ordem pendente não mexe no estoque.
    assert_eq!(purchase.status, PurchaseStatus::Pending);
    assert_eq!(purchase.total, Decimal::from(1500));
    assert_eq!(product_stock(&app, product.id).await, 0);

    let received = app
        .purchasing_service
        .receive_purchase(&clerk, purchase.id)
        .await
        .unwrap();
    assert_eq!(received.status, PurchaseStatus::Received);
    assert_eq!(received.received_by_id, Some(clerk.id));
    assert!(received.received_at.is_some());

    assert_eq!(product_stock(&app, product.id).await, 20);
    let stock = app
        .purchasing_service
        .product_stock(&clerk, product.id)
        .await
        .unwrap();
    assert_eq!(stock.total, 20);
    assert_eq!(stock.warehouses.len(), 1);
    assert_eq!(stock.warehouses[0].warehouse_id, warehouse.id);
    assert_eq!(stock.warehouses[0].quantity, 20);

    // Receber de novo falha e o estoque não muda.
    let err = app
        .purchasing_service
        .receive_purchase(&clerk, purchase.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidState(_)));
    assert_eq!(product_stock(&app, product.id).await, 20);
}

#[tokio::test]
async fn receiving_twice_reuses_the_same_warehouse_row() {
    let app = build_app(true);
    let product = seed_product(&app, "Areia", 0).await;
    let warehouse = seed_warehouse(&app).await;
    let supplier = seed_supplier(&app).await;
    let clerk = actor(Role::WarehouseClerk);

    for quantity in [4, 6] {
        let purchase = app
            .purchasing_service
            .create_purchase(
                &clerk,
                CreatePurchasePayload {
                    supplier_id: supplier.id,
                    warehouse_id: warehouse.id,
                    items: vec![item(&product, quantity, quantity * 10)],
                    invoice_number: None,
                    notes: None,
                },
            )
            .await
            .unwrap();
        app.purchasing_service
            .receive_purchase(&clerk, purchase.id)
            .await
            .unwrap();
    }

    let stock = app
        .purchasing_service
        .product_stock(&clerk, product.id)
        .await
        .unwrap();
    // Uma única linha (produto, depósito), somada.
    assert_eq!(stock.warehouses.len(), 1);
    assert_eq!(stock.warehouses[0].quantity, 10);
    assert_eq!(product_stock(&app, product.id).await, 10);
}

#[tokio::test]
async fn cancelled_purchase_cannot_be_received() {
    let app = build_app(true);
    let product = seed_product(&app, "Tijolo", 0).await;
    let warehouse = seed_warehouse(&app).await;
    let supplier = seed_supplier(&app).await;
    let clerk = actor(Role::WarehouseClerk);

    let purchase = app
        .purchasing_service
        .create_purchase(
            &clerk,
            CreatePurchasePayload {
                supplier_id: supplier.id,
                warehouse_id: warehouse.id,
                items: vec![item(&product, 8, 80)],
                invoice_number: None,
                notes: None,
            },
        )
        .await
        .unwrap();

    let cancelled = app
        .purchasing_service
        .cancel_purchase(&clerk, purchase.id)
        .await
        .unwrap();
    assert_eq!(cancelled.status, PurchaseStatus::Cancelled);

    let err = app
        .purchasing_service
        .receive_purchase(&clerk, purchase.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidState(_)));
    assert_eq!(product_stock(&app, product.id).await, 0);

    // Cancelar de novo também é inválido.
    let err = app
        .purchasing_service
        .cancel_purchase(&clerk, purchase.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidState(_)));
}

// ---
// Portão de permissões
// ---

#[tokio::test]
async fn lifecycle_entry_points_are_permission_gated() {
    let app = build_app(true);
    let product = seed_product(&app, "Chave de Fenda", 10).await;
    let seller = actor(Role::Seller);
    let clerk = actor(Role::WarehouseClerk);
    let accountant = actor(Role::Accountant);

    // Contador não cria venda.
    let err = app
        .sale_service
        .create(&accountant, sale_payload(None, vec![item(&product, 1, 100)]))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden("sales:create")));

    // Estoquista não cria venda.
    let err = app
        .sale_service
        .create(&clerk, sale_payload(None, vec![item(&product, 1, 100)]))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    // Vendedor cria, mas não anula.
    let sale = app
        .sale_service
        .create(&seller, sale_payload(None, vec![item(&product, 1, 100)]))
        .await
        .unwrap();
    let err = app.sale_service.void(&seller, sale.id).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden("sales:void")));

    // A recusa não alterou nada: a venda continua ativa.
    assert_eq!(
        app.sale_service.get(&admin(), sale.id).await.unwrap().status,
        SaleStatus::Completed
    );
}

// ---
// Unicidade
// ---

#[tokio::test]
async fn duplicate_barcode_is_a_conflict() {
    let app = build_app(true);
    let payload = |barcode: &str| CreateProductPayload {
        name: "Produto".into(),
        description: None,
        barcode: Some(barcode.into()),
        category_id: None,
        retail_price: Decimal::from(10),
        wholesale_price: Decimal::from(8),
        stock: 0,
        min_stock: 0,
        image_url: None,
    };

    app.catalog_service
        .create_product(&admin(), payload("779123"))
        .await
        .unwrap();
    let err = app
        .catalog_service
        .create_product(&admin(), payload("779123"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn duplicate_customer_email_is_a_conflict() {
    let app = build_app(true);
    let payload = || CreateCustomerPayload {
        name: "Cliente".into(),
        tax_id: None,
        email: Some("cliente@example.com".into()),
        phone: None,
        address: None,
        credit_limit: Decimal::ZERO,
    };

    app.crm_service.create(&admin(), payload()).await.unwrap();
    let err = app.crm_service.create(&admin(), payload()).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

// ---
// Auditoria e autenticação
// ---

#[tokio::test]
async fn audit_log_is_append_only_and_sorted() {
    let app = build_app(true);
    let product = seed_product(&app, "Lixa", 10).await;
    let seller = actor(Role::Seller);

    app.sale_service
        .create(&seller, sale_payload(None, vec![item(&product, 1, 100)]))
        .await
        .unwrap();

    // A gravação é assíncrona; espera o consumidor drenar o canal.
    let mut entries = Vec::new();
    for _ in 0..50 {
        entries = app.audit_repo.list(50).await.unwrap();
        if entries.iter().any(|e| e.module == "sales") {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    let sale_entry = entries
        .iter()
        .find(|e| e.module == "sales")
        .expect("entrada de auditoria da venda");
    assert_eq!(sale_entry.action, "create");
    assert_eq!(sale_entry.actor_id, seller.id);
}

#[tokio::test]
async fn login_checks_password_and_active_flag() {
    let app = build_app(true);
    app.auth_service.seed_default_admin().await.unwrap();

    // Senha errada.
    let err = app
        .auth_service
        .login("admin@ferreteria.com", "senha-errada")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidCredentials));

    // Login certo emite token que valida de volta para o mesmo usuário.
    let response = app
        .auth_service
        .login("admin@ferreteria.com", "admin123")
        .await
        .unwrap();
    let user = app
        .auth_service
        .validate_token(&response.access_token)
        .await
        .unwrap();
    assert_eq!(user.id, response.user.id);
    assert_eq!(user.role, Role::Admin);
}
