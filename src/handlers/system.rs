// src/handlers/system.rs

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::auth::Actor,
    permissions::Permission,
    store::{collections, DocumentStore, Query as StoreQuery},
};

#[derive(Debug, Deserialize)]
pub struct AuditParams {
    pub limit: Option<usize>,
}

// GET /api/audit-logs — leitura da trilha, mais recente primeiro.
pub async fn list_audit_logs(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Query(params): Query<AuditParams>,
) -> Result<impl IntoResponse, AppError> {
    let actor = Actor::from(&user.0);
    app_state
        .permissions
        .require(actor.role, Permission::UsersView)?;

    let entries = app_state
        .audit_repo
        .list(params.limit.unwrap_or(200))
        .await?;
    Ok((StatusCode::OK, Json(entries)))
}

// GET /api/system/backup — dump JSON de todas as coleções de negócio.
// Hashes de senha ficam de fora do dump.
pub async fn create_backup(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let actor = Actor::from(&user.0);
    app_state
        .permissions
        .require(actor.role, Permission::UsersView)?;

    let names = [
        collections::PRODUCTS,
        collections::CATEGORIES,
        collections::CUSTOMERS,
        collections::SALES,
        collections::QUOTES,
        collections::WAREHOUSES,
        collections::SUPPLIERS,
        collections::SUPPLIER_PRICES,
        collections::PURCHASES,
        collections::PRODUCT_STOCK,
        collections::USERS,
    ];

    let mut data = serde_json::Map::new();
    for name in names {
        let mut docs = app_state.store.find(name, StoreQuery::all()).await?;
        if name == collections::USERS {
            for doc in &mut docs {
                if let Some(obj) = doc.as_object_mut() {
                    obj.remove("passwordHash");
                }
            }
        }
        data.insert(name.to_string(), Value::Array(docs));
    }

    app_state.audit.record(
        &actor,
        "backup",
        "system",
        Some("Backup completo da base de dados".into()),
    );

    Ok((
        StatusCode::OK,
        Json(json!({
            "backupDate": Utc::now(),
            "backupBy": actor.name,
            "version": env!("CARGO_PKG_VERSION"),
            "data": data,
        })),
    ))
}
