// src/handlers/auth.rs

use axum::{extract::State, Json};
use validator::Validate;

use crate::{
    common::{error::AppError, extract::AppJson, response::ApiResponse},
    config::AppState,
    models::auth::{AuthResponse, LoginUserPayload},
};

// Handler de login
#[utoipa::path(
    post,
    path = "/api/login",
    tag = "Auth",
    request_body = LoginUserPayload,
    responses(
        (status = 200, description = "Token JWT emitido", body = AuthResponse),
        (status = 400, description = "Usuário ou senha em branco"),
        (status = 401, description = "Credenciais inválidas")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    AppJson(payload): AppJson<LoginUserPayload>,
) -> Result<Json<ApiResponse<AuthResponse>>, AppError> {
    payload.validate()?;

    let auth = app_state
        .auth_service
        .login_user(&payload.username, &payload.password)
        .await?;

    Ok(Json(ApiResponse::ok(auth)))
}
