// src/services/audit.rs

use chrono::Utc;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::{db::AuditRepository, models::audit::AuditLog, models::auth::Actor};

/// Trilha de auditoria como evento emitido, não como passo do fluxo de
/// negócio: os serviços publicam num canal e uma task própria grava na
/// coleção `audit_logs`. Falha na gravação vira `warn!` — nunca desfaz a
/// operação que a originou.
#[derive(Clone)]
pub struct AuditTrail {
    tx: mpsc::UnboundedSender<AuditLog>,
}

impl AuditTrail {
    /// Sobe a task consumidora e devolve o handle clonável.
    pub fn spawn(repo: AuditRepository) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<AuditLog>();

        tokio::spawn(async move {
            while let Some(entry) = rx.recv().await {
                if let Err(err) = repo.append(&entry).await {
                    tracing::warn!(
                        "falha ao gravar auditoria ({} / {}): {}",
                        entry.module,
                        entry.action,
                        err
                    );
                }
            }
        });

        Self { tx }
    }

    /// Fire-and-forget: publica o evento depois que o efeito principal já
    /// foi persistido.
    pub fn record(&self, actor: &Actor, action: &str, module: &str, detail: Option<String>) {
        let entry = AuditLog {
            id: Uuid::new_v4(),
            actor_id: actor.id,
            actor_name: actor.name.clone(),
            action: action.to_string(),
            module: module.to_string(),
            detail,
            timestamp: Utc::now(),
        };
        if self.tx.send(entry).is_err() {
            tracing::warn!("canal de auditoria fechado; evento descartado");
        }
    }
}
