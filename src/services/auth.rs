// src/services/auth.rs

use std::sync::Arc;

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde_json::{json, Map};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::UserRepository,
    models::auth::{Actor, Claims, RegisterPayload, TokenResponse, UpdateUserPayload, User, UserPublic},
    permissions::{Permission, PermissionTable, Role},
    services::audit::AuditTrail,
};

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    permissions: Arc<PermissionTable>,
    audit: AuditTrail,
    jwt_secret: String,
}

impl AuthService {
    pub fn new(
        user_repo: UserRepository,
        permissions: Arc<PermissionTable>,
        audit: AuditTrail,
        jwt_secret: String,
    ) -> Self {
        Self {
            user_repo,
            permissions,
            audit,
            jwt_secret,
        }
    }

    async fn hash_password(password: String) -> Result<String, AppError> {
        // Hashing é CPU-bound; sai do executor async.
        let hashed = tokio::task::spawn_blocking(move || hash(&password, bcrypt::DEFAULT_COST))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
        Ok(hashed)
    }

    pub async fn register(&self, payload: RegisterPayload) -> Result<UserPublic, AppError> {
        if self.user_repo.find_by_email(&payload.email).await?.is_some() {
            return Err(AppError::Conflict("O e-mail já está registrado".into()));
        }

        let password_hash = Self::hash_password(payload.password).await?;
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: payload.email,
            name: payload.name,
            role: payload.role,
            active: true,
            password_hash,
            created_at: now,
            updated_at: now,
            last_login: None,
        };
        self.user_repo.insert(&user).await?;

        Ok(UserPublic::from(&user))
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<TokenResponse, AppError> {
        let user = self
            .user_repo
            .find_by_email(email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let password = password.to_owned();
        let password_hash = user.password_hash.clone();
        let is_valid = tokio::task::spawn_blocking(move || verify(&password, &password_hash))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_valid {
            return Err(AppError::InvalidCredentials);
        }
        if !user.active {
            return Err(AppError::InactiveUser);
        }

        self.user_repo.stamp_last_login(user.id).await?;

        let token = self.create_token(user.id)?;
        let actor = Actor::from(&user);
        self.audit.record(
            &actor,
            "login",
            "auth",
            Some(format!("Login efetuado por {}", user.email)),
        );

        Ok(TokenResponse {
            access_token: token,
            user: UserPublic::from(&user),
        })
    }

    /// Valida o token e carrega o usuário do armazenamento — o guard de
    /// autenticação usa isto em toda requisição protegida.
    pub async fn validate_token(&self, token: &str) -> Result<User, AppError> {
        let validation = Validation::default();
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &validation,
        )
        .map_err(|_| AppError::InvalidToken)?;

        let user = self
            .user_repo
            .find_by_id(token_data.claims.sub)
            .await?
            .ok_or(AppError::InvalidToken)?;

        if !user.active {
            return Err(AppError::InactiveUser);
        }
        Ok(user)
    }

    pub fn permission_slugs(&self, role: Role) -> Vec<&'static str> {
        self.permissions.slugs_for(role)
    }

    // ---
    // Administração de usuários
    // ---

    pub async fn list_users(&self, actor: &Actor) -> Result<Vec<UserPublic>, AppError> {
        self.permissions.require(actor.role, Permission::UsersView)?;
        let users = self.user_repo.list().await?;
        Ok(users.iter().map(UserPublic::from).collect())
    }

    pub async fn get_user(&self, actor: &Actor, id: Uuid) -> Result<UserPublic, AppError> {
        self.permissions.require(actor.role, Permission::UsersView)?;
        let user = self
            .user_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Usuário".into()))?;
        Ok(UserPublic::from(&user))
    }

    pub async fn update_user(
        &self,
        actor: &Actor,
        id: Uuid,
        payload: UpdateUserPayload,
    ) -> Result<UserPublic, AppError> {
        self.permissions.require(actor.role, Permission::UsersEdit)?;

        if self.user_repo.find_by_id(id).await?.is_none() {
            return Err(AppError::NotFound("Usuário".into()));
        }

        let mut fields = Map::new();
        if let Some(email) = &payload.email {
            fields.insert("email".into(), json!(email));
        }
        if let Some(name) = &payload.name {
            fields.insert("name".into(), json!(name));
        }
        if let Some(role) = &payload.role {
            fields.insert("role".into(), serde_json::to_value(role)?);
        }
        if let Some(active) = &payload.active {
            fields.insert("active".into(), json!(active));
        }
        if let Some(password) = payload.password {
            let password_hash = Self::hash_password(password).await?;
            fields.insert("passwordHash".into(), json!(password_hash));
        }

        let updated = self
            .user_repo
            .update_fields(id, fields)
            .await?
            .ok_or_else(|| AppError::NotFound("Usuário".into()))?;

        self.audit.record(
            actor,
            "update",
            "users",
            Some(format!("Usuário atualizado: {}", id)),
        );
        Ok(UserPublic::from(&updated))
    }

    /// "Excluir" usuário é desativar — o histórico de vendas continua
    /// apontando para ele.
    pub async fn deactivate_user(&self, actor: &Actor, id: Uuid) -> Result<(), AppError> {
        self.permissions.require(actor.role, Permission::UsersDelete)?;

        if id == actor.id {
            return Err(AppError::InvalidState(
                "Você não pode excluir o seu próprio usuário".into(),
            ));
        }
        if self.user_repo.find_by_id(id).await?.is_none() {
            return Err(AppError::NotFound("Usuário".into()));
        }

        let mut fields = Map::new();
        fields.insert("active".into(), json!(false));
        self.user_repo.update_fields(id, fields).await?;

        self.audit.record(
            actor,
            "delete",
            "users",
            Some(format!("Usuário desativado: {}", id)),
        );
        Ok(())
    }

    /// Garante o administrador padrão quando a coleção de usuários está
    /// vazia (primeira subida do sistema).
    pub async fn seed_default_admin(&self) -> Result<(), AppError> {
        if self.user_repo.count_all().await? > 0 {
            return Ok(());
        }

        tracing::info!("Criando usuário administrador padrão...");
        let password_hash = Self::hash_password("admin123".to_string()).await?;
        let now = Utc::now();
        let admin = User {
            id: Uuid::new_v4(),
            email: "admin@ferreteria.com".to_string(),
            name: "Administrador".to_string(),
            role: Role::Admin,
            active: true,
            password_hash,
            created_at: now,
            updated_at: now,
            last_login: None,
        };
        self.user_repo.insert(&admin).await?;
        tracing::info!("Usuário administrador criado: {}", admin.email);
        Ok(())
    }

    fn create_token(&self, user_id: Uuid) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::days(7);

        let claims = Claims {
            sub: user_id,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }
}
