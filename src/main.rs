// src/main.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use ferreteria_backend::config::AppState;
use ferreteria_backend::middleware::auth::auth_guard;
use ferreteria_backend::{docs, handlers};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_target(false).compact().init();

    // .expect() é bom aqui: se a configuração falhar, a aplicação não deve
    // iniciar.
    let app_state = AppState::new()
        .await
        .expect("Falha ao inicializar o estado da aplicação.");

    // Primeira subida: garante o administrador padrão.
    app_state
        .auth_service
        .seed_default_admin()
        .await
        .expect("Falha ao criar o usuário administrador padrão.");

    // Rotas de autenticação: registro e login são públicos; /me e
    // /permissions exigem token.
    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .merge(
            Router::new()
                .route("/me", get(handlers::auth::get_me))
                .route("/permissions", get(handlers::auth::get_permissions))
                .layer(axum_middleware::from_fn_with_state(
                    app_state.clone(),
                    auth_guard,
                )),
        );

    let user_routes = Router::new()
        .route("/", get(handlers::users::list_users))
        .route(
            "/{id}",
            get(handlers::users::get_user)
                .put(handlers::users::update_user)
                .delete(handlers::users::delete_user),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let category_routes = Router::new()
        .route(
            "/",
            get(handlers::catalog::list_categories).post(handlers::catalog::create_category),
        )
        .route(
            "/{id}",
            axum::routing::put(handlers::catalog::update_category)
                .delete(handlers::catalog::delete_category),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let product_routes = Router::new()
        .route(
            "/",
            get(handlers::catalog::list_products).post(handlers::catalog::create_product),
        )
        .route("/search", get(handlers::catalog::search_products))
        .route(
            "/{id}",
            get(handlers::catalog::get_product)
                .put(handlers::catalog::update_product)
                .delete(handlers::catalog::delete_product),
        )
        .route(
            "/{id}/stock-by-warehouse",
            get(handlers::catalog::product_stock_by_warehouse),
        )
        .route(
            "/{id}/prices",
            get(handlers::catalog::product_supplier_prices),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let customer_routes = Router::new()
        .route(
            "/",
            get(handlers::crm::list_customers).post(handlers::crm::create_customer),
        )
        .route(
            "/{id}",
            get(handlers::crm::get_customer)
                .put(handlers::crm::update_customer)
                .delete(handlers::crm::delete_customer),
        )
        .route("/{id}/history", get(handlers::crm::get_customer_history))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let sale_routes = Router::new()
        .route(
            "/",
            get(handlers::sales::list_sales).post(handlers::sales::create_sale),
        )
        .route("/{id}", get(handlers::sales::get_sale))
        .route("/{id}/void", post(handlers::sales::void_sale))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let quote_routes = Router::new()
        .route(
            "/",
            get(handlers::quotes::list_quotes).post(handlers::quotes::create_quote),
        )
        .route(
            "/{id}",
            get(handlers::quotes::get_quote).put(handlers::quotes::update_quote),
        )
        .route("/{id}/convert", post(handlers::quotes::convert_quote))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let warehouse_routes = Router::new()
        .route(
            "/",
            get(handlers::purchasing::list_warehouses).post(handlers::purchasing::create_warehouse),
        )
        .route(
            "/{id}",
            axum::routing::put(handlers::purchasing::update_warehouse)
                .delete(handlers::purchasing::delete_warehouse),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let supplier_routes = Router::new()
        .route(
            "/",
            get(handlers::purchasing::list_suppliers).post(handlers::purchasing::create_supplier),
        )
        .route(
            "/{id}",
            axum::routing::put(handlers::purchasing::update_supplier)
                .delete(handlers::purchasing::delete_supplier),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let purchase_routes = Router::new()
        .route(
            "/",
            get(handlers::purchasing::list_purchases).post(handlers::purchasing::create_purchase),
        )
        .route("/{id}", get(handlers::purchasing::get_purchase))
        .route(
            "/{id}/receive",
            post(handlers::purchasing::receive_purchase),
        )
        .route("/{id}/cancel", post(handlers::purchasing::cancel_purchase))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Rotas avulsas: upsert de preço de fornecedor, trilha de auditoria e
    // backup.
    let misc_routes = Router::new()
        .route(
            "/api/supplier-prices",
            post(handlers::purchasing::upsert_supplier_price),
        )
        .route("/api/audit-logs", get(handlers::system::list_audit_logs))
        .route("/api/system/backup", get(handlers::system::create_backup))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Combina tudo no router principal
    let app = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/auth", auth_routes)
        .nest("/api/users", user_routes)
        .nest("/api/categories", category_routes)
        .nest("/api/products", product_routes)
        .nest("/api/customers", customer_routes)
        .nest("/api/sales", sale_routes)
        .nest("/api/quotes", quote_routes)
        .nest("/api/warehouses", warehouse_routes)
        .nest("/api/suppliers", supplier_routes)
        .nest("/api/purchases", purchase_routes)
        .merge(misc_routes)
        .merge(
            SwaggerUi::new("/docs").url("/api-docs/openapi.json", docs::ApiDoc::openapi()),
        )
        .with_state(app_state);

    // Inicia o servidor
    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = TcpListener::bind(&addr)
        .await
        .expect("Falha ao iniciar o listener TCP");
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr().unwrap());
    axum::serve(listener, app).await.expect("Erro no servidor Axum");
}
