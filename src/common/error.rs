// src/common/error.rs

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Validation error")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("No authorization token provided")]
    MissingToken,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("MongoDB error: {0}")]
    MongoError(#[from] mongodb::error::Error),

    #[error("Mail error: {0}")]
    MailError(String),

    #[error("{0}")]
    BackupFailed(String),

    #[error("Internal server error: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Bcrypt error: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) | AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::MissingToken | AppError::InvalidToken | AppError::InvalidCredentials => {
                StatusCode::UNAUTHORIZED
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Texto que pode ir para o cliente. 500s saem genéricos, exceto falha de backup.
    pub fn public_message(&self) -> String {
        match self {
            AppError::ValidationError(_) => "One or more fields are invalid.".to_string(),
            AppError::BadRequest(message)
            | AppError::NotFound(message)
            | AppError::Conflict(message)
            | AppError::BackupFailed(message) => message.clone(),
            AppError::MissingToken | AppError::InvalidToken | AppError::InvalidCredentials => {
                self.to_string()
            }
            _ => "An unexpected error occurred.".to_string(),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let reason = status.canonical_reason().unwrap_or("Error");
        let message = self.public_message();

        match &self {
            // Devolve o detalhe de cada campo inválido.
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
                    "success": false,
                    "error": reason,
                    "message": message,
                    "details": details,
                }));
                return (status, body).into_response();
            }
            AppError::BackupFailed(detail) => tracing::error!("Falha no backup: {}", detail),
            // Tudo que sobra como 500: loga o detalhe, responde genérico.
            e if status == StatusCode::INTERNAL_SERVER_ERROR => {
                tracing::error!("Erro interno do servidor: {}", e);
            }
            _ => {}
        }

        let body = Json(json!({
            "success": false,
            "error": reason,
            "message": message,
        }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_variants_to_status_codes() {
        assert_eq!(AppError::BadRequest("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::MissingToken.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::NotFound("x".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Conflict("x".into()).status_code(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::MailError("smtp down".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn internal_errors_hide_details() {
        let response =
            AppError::InternalServerError(anyhow::anyhow!("connection refused")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "An unexpected error occurred.");
    }

    #[test]
    fn public_message_keeps_backup_failures_only() {
        assert_eq!(
            AppError::BackupFailed("No backup recipients configured".into()).public_message(),
            "No backup recipients configured"
        );
        assert_eq!(
            AppError::MongoError(mongodb::error::Error::custom("server selection timeout"))
                .public_message(),
            "An unexpected error occurred."
        );
        assert_eq!(
            AppError::MailError("smtp down".into()).public_message(),
            "An unexpected error occurred."
        );
    }
}
