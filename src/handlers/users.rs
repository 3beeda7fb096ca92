// src/handlers/users.rs

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        extract::{AppJson, AppQuery},
        lenient::{optional_string, optional_uuid},
        response::ApiResponse,
    },
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::auth::User,
};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UsersQuery {
    /// `true` devolve só o usuário do token.
    #[serde(default, deserialize_with = "optional_string")]
    pub current: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MembershipPayload {
    #[serde(default, deserialize_with = "optional_uuid")]
    pub user_id: Option<Uuid>,
    pub membership_paid: Option<bool>,
}

// GET /api/users
#[utoipa::path(
    get,
    path = "/api/users",
    tag = "Users",
    params(UsersQuery),
    responses(
        (status = 200, description = "Usuário atual (`current=true`) ou a lista", body = User),
        (status = 401, description = "Token ausente ou inválido"),
        (status = 404, description = "Usuário do token não existe mais")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_users(
    State(app_state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    AppQuery(query): AppQuery<UsersQuery>,
) -> Result<Response, AppError> {
    if query.current.as_deref() == Some("true") {
        let user = app_state.user_service.get(claims.id).await?;
        return Ok(Json(ApiResponse::ok(user)).into_response());
    }

    let users = app_state.user_service.list().await?;
    Ok(Json(ApiResponse::ok(users)).into_response())
}

// PUT /api/users/membership
#[utoipa::path(
    put,
    path = "/api/users/membership",
    tag = "Users",
    request_body = MembershipPayload,
    responses(
        (status = 200, description = "Mensalidade atualizada", body = User),
        (status = 400, description = "Campos ausentes"),
        (status = 404, description = "Usuário não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_membership(
    State(app_state): State<AppState>,
    AppJson(payload): AppJson<MembershipPayload>,
) -> Result<impl IntoResponse, AppError> {
    let (Some(user_id), Some(membership_paid)) = (payload.user_id, payload.membership_paid) else {
        return Err(AppError::BadRequest(
            "userId and membershipPaid fields are required".to_string(),
        ));
    };

    let user = app_state.user_service.set_membership(user_id, membership_paid).await?;

    Ok(Json(ApiResponse::ok(user).with_message("Membership updated successfully")))
}
