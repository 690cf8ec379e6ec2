// src/handlers/sales.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::auth::Actor,
    models::sales::{CreateSalePayload, Sale},
};

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListParams {
    pub limit: Option<usize>,
}

// GET /api/sales
#[utoipa::path(
    get,
    path = "/api/sales",
    tag = "Sales",
    responses(
        (status = 200, description = "Vendas mais recentes primeiro", body = Vec<Sale>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_sales(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, AppError> {
    let actor = Actor::from(&user.0);
    let sales = app_state
        .sale_service
        .list(&actor, params.limit.unwrap_or(100))
        .await?;
    Ok((StatusCode::OK, Json(sales)))
}

// GET /api/sales/{id}
#[utoipa::path(
    get,
    path = "/api/sales/{id}",
    tag = "Sales",
    params(("id" = Uuid, Path, description = "ID da venda")),
    responses(
        (status = 200, description = "Venda", body = Sale),
        (status = 404, description = "Venda não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_sale(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let actor = Actor::from(&user.0);
    let sale = app_state.sale_service.get(&actor, id).await?;
    Ok((StatusCode::OK, Json(sale)))
}

// POST /api/sales
#[utoipa::path(
    post,
    path = "/api/sales",
    tag = "Sales",
    request_body = CreateSalePayload,
    responses(
        (status = 201, description = "Venda criada; estoque baixado por item", body = Sale),
        (status = 400, description = "Estoque insuficiente"),
        (status = 404, description = "Produto não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_sale(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateSalePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let actor = Actor::from(&user.0);
    let sale = app_state.sale_service.create(&actor, payload).await?;
    Ok((StatusCode::CREATED, Json(sale)))
}

// POST /api/sales/{id}/void
#[utoipa::path(
    post,
    path = "/api/sales/{id}/void",
    tag = "Sales",
    params(("id" = Uuid, Path, description = "ID da venda")),
    responses(
        (status = 200, description = "Venda anulada; estoque e saldo revertidos", body = Sale),
        (status = 400, description = "Venda já anulada"),
        (status = 404, description = "Venda não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn void_sale(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let actor = Actor::from(&user.0);
    let sale = app_state.sale_service.void(&actor, id).await?;
    Ok((StatusCode::OK, Json(sale)))
}
