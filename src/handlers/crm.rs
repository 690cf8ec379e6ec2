// src/handlers/crm.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::auth::Actor,
    models::crm::{CreateCustomerPayload, UpdateCustomerPayload},
};

pub async fn list_customers(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let actor = Actor::from(&user.0);
    let customers = app_state.crm_service.list(&actor).await?;
    Ok((StatusCode::OK, Json(customers)))
}

pub async fn get_customer(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let actor = Actor::from(&user.0);
    let customer = app_state.crm_service.get(&actor, id).await?;
    Ok((StatusCode::OK, Json(customer)))
}

pub async fn get_customer_history(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let actor = Actor::from(&user.0);
    let history = app_state.crm_service.history(&actor, id).await?;
    Ok((StatusCode::OK, Json(history)))
}

pub async fn create_customer(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateCustomerPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let actor = Actor::from(&user.0);
    let customer = app_state.crm_service.create(&actor, payload).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

pub async fn update_customer(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCustomerPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let actor = Actor::from(&user.0);
    let customer = app_state.crm_service.update(&actor, id, payload).await?;
    Ok((StatusCode::OK, Json(customer)))
}

pub async fn delete_customer(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let actor = Actor::from(&user.0);
    app_state.crm_service.delete(&actor, id).await?;
    Ok((
        StatusCode::OK,
        Json(json!({ "message": "Cliente excluído com sucesso" })),
    ))
}
