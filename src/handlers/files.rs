// src/handlers/files.rs

use axum::{extract::State, Json};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    common::{error::AppError, extract::AppJson, response::ApiResponse},
    config::AppState,
    services::file_service::{FileAction, PresignedUrl},
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileRequestPayload {
    #[serde(default)]
    #[validate(length(min = 1, message = "fileName is required"))]
    #[schema(example = "clients/12345678-9.png")]
    pub file_name: String,

    #[schema(example = "image/png")]
    pub file_type: Option<String>,

    /// `save` (PUT) ou `retrieve` (GET).
    #[serde(default)]
    #[schema(example = "save")]
    pub action: String,
}

// POST /api/files
#[utoipa::path(
    post,
    path = "/api/files",
    tag = "Files",
    request_body = FileRequestPayload,
    responses(
        (status = 200, description = "URL pré-assinada", body = PresignedUrl),
        (status = 400, description = "Ação inválida ou fileType ausente"),
        (status = 500, description = "Armazenamento de objetos não configurado")
    ),
    security(("api_jwt" = []))
)]
pub async fn presign_file(
    State(app_state): State<AppState>,
    AppJson(payload): AppJson<FileRequestPayload>,
) -> Result<Json<ApiResponse<PresignedUrl>>, AppError> {
    payload.validate()?;
    let action = FileAction::parse(&payload.action)?;

    let presigned = app_state
        .file_service
        .presign(&payload.file_name, payload.file_type.as_deref(), action)?;

    Ok(Json(ApiResponse::ok(presigned)))
}
