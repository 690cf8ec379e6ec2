// src/handlers/auth.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::auth::{LoginPayload, RegisterPayload, TokenResponse, UserPublic},
};

// POST /api/auth/register
#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Auth",
    request_body = RegisterPayload,
    responses(
        (status = 201, description = "Usuário registrado", body = UserPublic),
        (status = 409, description = "E-mail já registrado")
    )
)]
pub async fn register(
    State(app_state): State<AppState>,
    Json(payload): Json<RegisterPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let user = app_state.auth_service.register(payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

// POST /api/auth/login
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginPayload,
    responses(
        (status = 200, description = "Token emitido", body = TokenResponse),
        (status = 401, description = "Credenciais inválidas")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let response = app_state
        .auth_service
        .login(&payload.email, &payload.password)
        .await?;
    Ok((StatusCode::OK, Json(response)))
}

// GET /api/auth/me
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Usuário autenticado", body = UserPublic)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_me(user: AuthenticatedUser) -> Result<impl IntoResponse, AppError> {
    Ok((StatusCode::OK, Json(UserPublic::from(&user.0))))
}

// GET /api/auth/permissions
#[utoipa::path(
    get,
    path = "/api/auth/permissions",
    tag = "Auth",
    responses(
        (status = 200, description = "Permissões do papel do usuário")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_permissions(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let slugs = app_state.auth_service.permission_slugs(user.0.role);
    Ok((
        StatusCode::OK,
        Json(json!({
            "role": user.0.role,
            "permissions": slugs,
        })),
    ))
}
