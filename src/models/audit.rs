// src/models/audit.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

// Registro de auditoria: quem fez, o quê, em que módulo e quando.
// A coleção é append-only — nenhum fluxo normal atualiza ou apaga entradas.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuditLog {
    pub id: Uuid,
    pub actor_id: Uuid,
    pub actor_name: String,
    pub action: String,
    pub module: String,
    pub detail: Option<String>,
    pub timestamp: DateTime<Utc>,
}
