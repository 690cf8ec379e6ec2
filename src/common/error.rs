use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::store::StoreError;

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
// As variantes de negócio (NotFound, Forbidden, InvalidState, InsufficientStock,
// Conflict) são as que os serviços de ciclo de vida devolvem; o resto é
// infraestrutura (validação, autenticação, armazenamento).
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("{0} não encontrado")]
    NotFound(String),

    #[error("Você precisa da permissão '{0}' para realizar esta ação.")]
    Forbidden(&'static str),

    #[error("{0}")]
    InvalidState(String),

    #[error("Estoque insuficiente para {product}. Estoque atual: {available}")]
    InsufficientStock { product: String, available: i64 },

    #[error("{0}")]
    Conflict(String),

    #[error("E-mail ou senha inválidos")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Usuário inativo")]
    InactiveUser,

    // Variante para erros do adaptador de documentos
    #[error("Erro no armazenamento de documentos")]
    Store(#[from] StoreError),

    #[error("Falha ao serializar documento")]
    Serialization(#[from] serde_json::Error),

    // Variante genérica para qualquer outro erro inesperado
    // `anyhow::Error` é ótimo para capturar o contexto do erro.
    #[error("Erro interno do servidor")]
    Internal(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            // Retorna todos os detalhes da validação, campo a campo.
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let body = Json(json!({
                    "error": "Um ou mais campos são inválidos.",
                    "details": details,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }

            AppError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::Forbidden(_) => (StatusCode::FORBIDDEN, self.to_string()),
            AppError::InvalidState(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::InsufficientStock { .. } => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::Conflict(_) => (StatusCode::CONFLICT, self.to_string()),
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, self.to_string()),
            AppError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "Token de autenticação inválido ou ausente.".into(),
            ),
            AppError::InactiveUser => (StatusCode::UNAUTHORIZED, self.to_string()),

            // Todos os outros erros (Store, Internal, etc.) viram 500.
            // O `tracing` loga a mensagem detalhada que o `thiserror` nos deu.
            e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Ocorreu um erro inesperado.".into(),
                )
            }
        };

        // Resposta padrão para erros simples que só têm uma mensagem.
        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
