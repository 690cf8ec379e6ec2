// src/handlers/catalog.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::auth::Actor,
    models::catalog::{
        CreateCategoryPayload, CreateProductPayload, UpdateCategoryPayload, UpdateProductPayload,
    },
};

// ---
// Categorias
// ---

pub async fn list_categories(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let categories = app_state.catalog_service.list_categories().await?;
    Ok((StatusCode::OK, Json(categories)))
}

pub async fn create_category(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateCategoryPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let actor = Actor::from(&user.0);
    let category = app_state
        .catalog_service
        .create_category(&actor, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn update_category(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCategoryPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let actor = Actor::from(&user.0);
    let category = app_state
        .catalog_service
        .update_category(&actor, id, payload)
        .await?;
    Ok((StatusCode::OK, Json(category)))
}

pub async fn delete_category(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let actor = Actor::from(&user.0);
    app_state
        .catalog_service
        .delete_category(&actor, id)
        .await?;
    Ok((
        StatusCode::OK,
        Json(json!({ "message": "Categoria excluída com sucesso" })),
    ))
}

// ---
// Produtos
// ---

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: String,
}

pub async fn list_products(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let actor = Actor::from(&user.0);
    let products = app_state.catalog_service.list_products(&actor).await?;
    Ok((StatusCode::OK, Json(products)))
}

// Autocomplete do ponto de venda: busca por nome ou código de barras.
pub async fn search_products(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Query(params): Query<SearchParams>,
) -> Result<impl IntoResponse, AppError> {
    let actor = Actor::from(&user.0);
    let products = app_state
        .catalog_service
        .search_products(&actor, &params.q)
        .await?;
    Ok((StatusCode::OK, Json(products)))
}

pub async fn get_product(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let actor = Actor::from(&user.0);
    let product = app_state.catalog_service.get_product(&actor, id).await?;
    Ok((StatusCode::OK, Json(product)))
}

pub async fn create_product(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateProductPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let actor = Actor::from(&user.0);
    let product = app_state
        .catalog_service
        .create_product(&actor, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn update_product(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProductPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let actor = Actor::from(&user.0);
    let product = app_state
        .catalog_service
        .update_product(&actor, id, payload)
        .await?;
    Ok((StatusCode::OK, Json(product)))
}

pub async fn delete_product(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let actor = Actor::from(&user.0);
    app_state.catalog_service.delete_product(&actor, id).await?;
    Ok((
        StatusCode::OK,
        Json(json!({ "message": "Produto excluído com sucesso" })),
    ))
}

// GET /api/products/{id}/stock-by-warehouse
pub async fn product_stock_by_warehouse(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let actor = Actor::from(&user.0);
    let stock = app_state
        .purchasing_service
        .product_stock(&actor, id)
        .await?;
    Ok((StatusCode::OK, Json(stock)))
}

// GET /api/products/{id}/prices
pub async fn product_supplier_prices(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let actor = Actor::from(&user.0);
    let prices = app_state
        .purchasing_service
        .prices_for_product(&actor, id)
        .await?;
    Ok((StatusCode::OK, Json(prices)))
}
