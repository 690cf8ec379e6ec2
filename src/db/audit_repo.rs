// src/db/audit_repo.rs

use std::sync::Arc;

use super::{from_docs, to_doc};
use crate::{
    common::error::AppError,
    models::audit::AuditLog,
    store::{collections, DocumentStore, Query, SortOrder},
};

#[derive(Clone)]
pub struct AuditRepository {
    store: Arc<dyn DocumentStore>,
}

impl AuditRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn append(&self, entry: &AuditLog) -> Result<(), AppError> {
        self.store
            .insert(collections::AUDIT_LOGS, to_doc(entry)?)
            .await?;
        Ok(())
    }

    pub async fn list(&self, limit: usize) -> Result<Vec<AuditLog>, AppError> {
        let docs = self
            .store
            .find(
                collections::AUDIT_LOGS,
                Query::all().sort("timestamp", SortOrder::Desc).limit(limit),
            )
            .await?;
        from_docs(docs)
    }
}
