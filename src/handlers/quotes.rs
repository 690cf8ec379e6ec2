// src/handlers/quotes.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::auth::Actor,
    models::quotes::{ConvertedQuote, CreateQuotePayload, Quote, UpdateQuotePayload},
};

// GET /api/quotes
#[utoipa::path(
    get,
    path = "/api/quotes",
    tag = "Quotes",
    responses(
        (status = 200, description = "Orçamentos mais recentes primeiro", body = Vec<Quote>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_quotes(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let actor = Actor::from(&user.0);
    let quotes = app_state.quote_service.list(&actor, 100).await?;
    Ok((StatusCode::OK, Json(quotes)))
}

// GET /api/quotes/{id}
#[utoipa::path(
    get,
    path = "/api/quotes/{id}",
    tag = "Quotes",
    params(("id" = Uuid, Path, description = "ID do orçamento")),
    responses(
        (status = 200, description = "Orçamento", body = Quote),
        (status = 404, description = "Orçamento não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_quote(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let actor = Actor::from(&user.0);
    let quote = app_state.quote_service.get(&actor, id).await?;
    Ok((StatusCode::OK, Json(quote)))
}

// POST /api/quotes
#[utoipa::path(
    post,
    path = "/api/quotes",
    tag = "Quotes",
    request_body = CreateQuotePayload,
    responses(
        (status = 201, description = "Orçamento criado (sem reserva de estoque)", body = Quote),
        (status = 404, description = "Produto não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_quote(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateQuotePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let actor = Actor::from(&user.0);
    let quote = app_state.quote_service.create(&actor, payload).await?;
    Ok((StatusCode::CREATED, Json(quote)))
}

// PUT /api/quotes/{id}
#[utoipa::path(
    put,
    path = "/api/quotes/{id}",
    tag = "Quotes",
    params(("id" = Uuid, Path, description = "ID do orçamento")),
    request_body = UpdateQuotePayload,
    responses(
        (status = 200, description = "Status atualizado", body = Quote),
        (status = 400, description = "Orçamento já convertido")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_quote(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateQuotePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let Some(status) = payload.status else {
        // Nada a atualizar: devolve o orçamento como está.
        let actor = Actor::from(&user.0);
        let quote = app_state.quote_service.get(&actor, id).await?;
        return Ok((StatusCode::OK, Json(quote)));
    };

    let actor = Actor::from(&user.0);
    let quote = app_state
        .quote_service
        .update_status(&actor, id, status)
        .await?;
    Ok((StatusCode::OK, Json(quote)))
}

// POST /api/quotes/{id}/convert
#[utoipa::path(
    post,
    path = "/api/quotes/{id}/convert",
    tag = "Quotes",
    params(("id" = Uuid, Path, description = "ID do orçamento")),
    responses(
        (status = 200, description = "Orçamento convertido em venda", body = ConvertedQuote),
        (status = 400, description = "Já convertido ou estoque insuficiente"),
        (status = 404, description = "Orçamento não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn convert_quote(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let actor = Actor::from(&user.0);
    let converted = app_state.quote_service.convert(&actor, id).await?;
    Ok((StatusCode::OK, Json(converted)))
}
