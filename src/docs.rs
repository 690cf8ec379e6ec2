// src/docs.rs

use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::get_me,
        handlers::auth::get_permissions,

        // --- Vendas ---
        handlers::sales::list_sales,
        handlers::sales::get_sale,
        handlers::sales::create_sale,
        handlers::sales::void_sale,

        // --- Orçamentos ---
        handlers::quotes::list_quotes,
        handlers::quotes::get_quote,
        handlers::quotes::create_quote,
        handlers::quotes::update_quote,
        handlers::quotes::convert_quote,

        // --- Compras ---
        handlers::purchasing::list_purchases,
        handlers::purchasing::get_purchase,
        handlers::purchasing::create_purchase,
        handlers::purchasing::receive_purchase,
        handlers::purchasing::cancel_purchase,
    ),
    components(
        schemas(
            models::auth::RegisterPayload,
            models::auth::LoginPayload,
            models::auth::TokenResponse,
            models::auth::UserPublic,
            models::sales::Sale,
            models::sales::SaleItem,
            models::sales::SaleStatus,
            models::sales::PaymentMethod,
            models::sales::CreateSalePayload,
            models::sales::SaleItemPayload,
            models::quotes::Quote,
            models::quotes::QuoteStatus,
            models::quotes::CreateQuotePayload,
            models::quotes::UpdateQuotePayload,
            models::quotes::ConvertedQuote,
            models::purchasing::Purchase,
            models::purchasing::PurchaseStatus,
            models::purchasing::CreatePurchasePayload,
            crate::permissions::Role,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Autenticação e sessão"),
        (name = "Sales", description = "Ciclo de vida de vendas"),
        (name = "Quotes", description = "Orçamentos e conversão em venda"),
        (name = "Purchases", description = "Ordens de compra e recebimento"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "api_jwt",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}
