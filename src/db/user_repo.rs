// src/db/user_repo.rs

use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Map};
use uuid::Uuid;

use super::{from_doc, from_docs, to_doc};
use crate::{
    common::error::AppError,
    models::auth::User,
    store::{collections, DocumentStore, Filter, Query},
};

// O repositório de usuários, responsável por todas as interações com a
// coleção 'users'.
#[derive(Clone)]
pub struct UserRepository {
    store: Arc<dyn DocumentStore>,
}

impl UserRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn count_all(&self) -> Result<u64, AppError> {
        Ok(self.store.count(collections::USERS, &Filter::new()).await?)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let doc = self
            .store
            .find_one(collections::USERS, &Filter::new().eq("email", email))
            .await?;
        doc.map(from_doc).transpose()
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let doc = self
            .store
            .find_by_id(collections::USERS, &id.to_string())
            .await?;
        doc.map(from_doc).transpose()
    }

    pub async fn insert(&self, user: &User) -> Result<(), AppError> {
        self.store
            .insert(collections::USERS, to_doc(user)?)
            .await?;
        Ok(())
    }

    pub async fn list(&self) -> Result<Vec<User>, AppError> {
        let docs = self.store.find(collections::USERS, Query::all()).await?;
        from_docs(docs)
    }

    /// Atualização parcial; o chamador já montou os campos (inclusive o
    /// hash de uma senha nova, se houver).
    pub async fn update_fields(
        &self,
        id: Uuid,
        mut fields: Map<String, serde_json::Value>,
    ) -> Result<Option<User>, AppError> {
        fields.insert("updatedAt".into(), json!(Utc::now()));
        let doc = self
            .store
            .set_fields(collections::USERS, &id.to_string(), fields)
            .await?;
        doc.map(from_doc).transpose()
    }

    pub async fn stamp_last_login(&self, id: Uuid) -> Result<(), AppError> {
        let mut fields = Map::new();
        fields.insert("lastLogin".into(), json!(Utc::now()));
        self.store
            .set_fields(collections::USERS, &id.to_string(), fields)
            .await?;
        Ok(())
    }
}
