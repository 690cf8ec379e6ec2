// src/handlers/users.rs

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
    models::auth::{Actor, UpdateUserPayload},
};

pub async fn list_users(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let actor = Actor::from(&user.0);
    let users = app_state.auth_service.list_users(&actor).await?;
    Ok((StatusCode::OK, Json(users)))
}

pub async fn get_user(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let actor = Actor::from(&user.0);
    let found = app_state.auth_service.get_user(&actor, id).await?;
    Ok((StatusCode::OK, Json(found)))
}

pub async fn update_user(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let actor = Actor::from(&user.0);
    let updated = app_state
        .auth_service
        .update_user(&actor, id, payload)
        .await?;
    Ok((StatusCode::OK, Json(updated)))
}

pub async fn delete_user(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let actor = Actor::from(&user.0);
    app_state.auth_service.deactivate_user(&actor, id).await?;
    Ok((
        StatusCode::OK,
        Json(json!({ "message": "Usuário desativado com sucesso" })),
    ))
}
