// src/handlers/purchasing.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use utoipa::IntoParams;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::auth::Actor,
    models::purchasing::{
        CreatePurchasePayload, CreateSupplierPayload, CreateWarehousePayload, Purchase,
        UpdateSupplierPayload, UpdateWarehousePayload, UpsertSupplierPricePayload,
    },
};

// ---
// Depósitos
// ---

pub async fn list_warehouses(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let actor = Actor::from(&user.0);
    let warehouses = app_state.purchasing_service.list_warehouses(&actor).await?;
    Ok((StatusCode::OK, Json(warehouses)))
}

pub async fn create_warehouse(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateWarehousePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let actor = Actor::from(&user.0);
    let warehouse = app_state
        .purchasing_service
        .create_warehouse(&actor, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(warehouse)))
}

pub async fn update_warehouse(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateWarehousePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let actor = Actor::from(&user.0);
    let warehouse = app_state
        .purchasing_service
        .update_warehouse(&actor, id, payload)
        .await?;
    Ok((StatusCode::OK, Json(warehouse)))
}

pub async fn delete_warehouse(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let actor = Actor::from(&user.0);
    app_state
        .purchasing_service
        .delete_warehouse(&actor, id)
        .await?;
    Ok((
        StatusCode::OK,
        Json(json!({ "message": "Depósito excluído com sucesso" })),
    ))
}

// ---
// Fornecedores
// ---

pub async fn list_suppliers(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let actor = Actor::from(&user.0);
    let suppliers = app_state.purchasing_service.list_suppliers(&actor).await?;
    Ok((StatusCode::OK, Json(suppliers)))
}

pub async fn create_supplier(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateSupplierPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let actor = Actor::from(&user.0);
    let supplier = app_state
        .purchasing_service
        .create_supplier(&actor, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(supplier)))
}

pub async fn update_supplier(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateSupplierPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let actor = Actor::from(&user.0);
    let supplier = app_state
        .purchasing_service
        .update_supplier(&actor, id, payload)
        .await?;
    Ok((StatusCode::OK, Json(supplier)))
}

pub async fn delete_supplier(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let actor = Actor::from(&user.0);
    app_state
        .purchasing_service
        .delete_supplier(&actor, id)
        .await?;
    Ok((
        StatusCode::OK,
        Json(json!({ "message": "Fornecedor excluído com sucesso" })),
    ))
}

// POST /api/supplier-prices (upsert por par produto/fornecedor)
pub async fn upsert_supplier_price(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<UpsertSupplierPricePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let actor = Actor::from(&user.0);
    let price = app_state
        .purchasing_service
        .upsert_supplier_price(&actor, payload)
        .await?;
    Ok((StatusCode::OK, Json(price)))
}

// ---
// Compras
// ---

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListParams {
    pub limit: Option<usize>,
}

// GET /api/purchases
#[utoipa::path(
    get,
    path = "/api/purchases",
    tag = "Purchases",
    responses(
        (status = 200, description = "Compras mais recentes primeiro", body = Vec<Purchase>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_purchases(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, AppError> {
    let actor = Actor::from(&user.0);
    let purchases = app_state
        .purchasing_service
        .list_purchases(&actor, params.limit.unwrap_or(100))
        .await?;
    Ok((StatusCode::OK, Json(purchases)))
}

// GET /api/purchases/{id}
#[utoipa::path(
    get,
    path = "/api/purchases/{id}",
    tag = "Purchases",
    params(("id" = Uuid, Path, description = "ID da compra")),
    responses(
        (status = 200, description = "Compra", body = Purchase),
        (status = 404, description = "Compra não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_purchase(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let actor = Actor::from(&user.0);
    let purchase = app_state.purchasing_service.get_purchase(&actor, id).await?;
    Ok((StatusCode::OK, Json(purchase)))
}

// POST /api/purchases
#[utoipa::path(
    post,
    path = "/api/purchases",
    tag = "Purchases",
    request_body = CreatePurchasePayload,
    responses(
        (status = 201, description = "Ordem de compra criada (pendente, sem efeito de estoque)", body = Purchase),
        (status = 404, description = "Fornecedor, depósito ou produto não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_purchase(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreatePurchasePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let actor = Actor::from(&user.0);
    let purchase = app_state
        .purchasing_service
        .create_purchase(&actor, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(purchase)))
}

// POST /api/purchases/{id}/receive
#[utoipa::path(
    post,
    path = "/api/purchases/{id}/receive",
    tag = "Purchases",
    params(("id" = Uuid, Path, description = "ID da compra")),
    responses(
        (status = 200, description = "Compra recebida; estoque do depósito e agregado atualizados", body = Purchase),
        (status = 400, description = "Compra já recebida ou cancelada"),
        (status = 404, description = "Compra não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn receive_purchase(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let actor = Actor::from(&user.0);
    let purchase = app_state
        .purchasing_service
        .receive_purchase(&actor, id)
        .await?;
    Ok((StatusCode::OK, Json(purchase)))
}

// POST /api/purchases/{id}/cancel
#[utoipa::path(
    post,
    path = "/api/purchases/{id}/cancel",
    tag = "Purchases",
    params(("id" = Uuid, Path, description = "ID da compra")),
    responses(
        (status = 200, description = "Ordem pendente cancelada", body = Purchase),
        (status = 400, description = "Compra já recebida ou cancelada"),
        (status = 404, description = "Compra não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn cancel_purchase(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let actor = Actor::from(&user.0);
    let purchase = app_state
        .purchasing_service
        .cancel_purchase(&actor, id)
        .await?;
    Ok((StatusCode::OK, Json(purchase)))
}
