// src/handlers/backup.rs

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;

use crate::{
    common::{error::AppError, response::ApiResponse},
    config::AppState,
    models::backup::{BackupKind, BackupReport},
};

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ManualBackupPayload {
    /// Somados aos destinatários padrão.
    #[serde(default)]
    pub emails: Vec<String>,
}

// POST /api/backup
#[utoipa::path(
    post,
    path = "/api/backup",
    tag = "Backup",
    request_body(content = ManualBackupPayload, description = "Corpo opcional"),
    responses(
        (status = 200, description = "Backup enviado", body = BackupReport),
        (status = 400, description = "Corpo inválido"),
        (status = 500, description = "Falha ao gerar ou enviar o backup")
    ),
    security(("api_jwt" = []))
)]
pub async fn manual_backup(State(app_state): State<AppState>, body: Bytes) -> Result<Response, AppError> {
    // O corpo é opcional: vazio equivale a `{}`.
    let payload: ManualBackupPayload = if body.iter().all(u8::is_ascii_whitespace) {
        ManualBackupPayload::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| AppError::BadRequest(e.to_string()))?
    };

    match app_state.backup_service.run(BackupKind::Manual, &payload.emails).await {
        Ok(report) => Ok(Json(
            ApiResponse::ok(report).with_message("Manual backup completed successfully"),
        )
        .into_response()),
        Err(e) => {
            tracing::error!("❌ Backup manual falhou: {}", e);
            let body = Json(json!({
                "success": false,
                "message": "Manual backup failed",
                "error": e.public_message(),
                "backupType": BackupKind::Manual,
            }));
            Ok((StatusCode::INTERNAL_SERVER_ERROR, body).into_response())
        }
    }
}
