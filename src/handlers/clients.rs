// src/handlers/clients.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::{
    common::{
        error::AppError,
        extract::{AppJson, AppQuery},
        lenient::optional_string,
        response::ApiResponse,
    },
    config::AppState,
    handlers::{parse_id, IdQuery},
    models::client::{Client, ClientChanges, ClientFilter},
    services::client_service::ClientService,
};

fn client_not_found(id: &str) -> AppError {
    AppError::NotFound(format!("Client with ID {} not found", id))
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListClientsQuery {
    #[serde(default, deserialize_with = "optional_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "optional_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "optional_string")]
    pub company_name: Option<String>,
    #[serde(default, deserialize_with = "optional_string")]
    pub rut: Option<String>,
    #[serde(default, deserialize_with = "optional_string")]
    pub frequent_client: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateClientPayload {
    #[serde(default)]
    #[validate(length(min = 1, message = "Name is required"))]
    #[schema(example = "Ana Pérez")]
    pub name: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "RUT is required"))]
    #[schema(example = "12345678-9")]
    pub rut: String,

    #[serde(default, deserialize_with = "optional_string")]
    pub company_name: Option<String>,
    #[serde(default, deserialize_with = "optional_string")]
    pub company_document: Option<String>,
    #[serde(default, deserialize_with = "optional_string")]
    pub phone_number: Option<String>,
    #[serde(default, deserialize_with = "optional_string")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "optional_string")]
    #[schema(example = "No")]
    pub frequent_client: Option<String>,
    #[serde(default, deserialize_with = "optional_string")]
    pub photo_file_name: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateClientPayload {
    #[serde(default)]
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,

    #[serde(default, deserialize_with = "optional_string")]
    pub rut: Option<String>,
    #[serde(default, deserialize_with = "optional_string")]
    pub company_name: Option<String>,
    #[serde(default, deserialize_with = "optional_string")]
    pub company_document: Option<String>,
    #[serde(default, deserialize_with = "optional_string")]
    pub phone_number: Option<String>,
    #[serde(default, deserialize_with = "optional_string")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "optional_string")]
    pub frequent_client: Option<String>,
    #[serde(default, deserialize_with = "optional_string")]
    pub photo_file_name: Option<String>,
}

// GET /api/clients
#[utoipa::path(
    get,
    path = "/api/clients",
    tag = "Clients",
    params(ListClientsQuery),
    responses(
        (status = 200, description = "Lista de clientes (ou só o do id)", body = Vec<Client>),
        (status = 404, description = "Cliente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_clients(
    State(app_state): State<AppState>,
    AppQuery(query): AppQuery<ListClientsQuery>,
) -> Result<impl IntoResponse, AppError> {
    if let Some(raw_id) = query.id.as_deref() {
        let id = parse_id(raw_id, client_not_found)?;
        let client = app_state.client_service.get(id).await?;
        return Ok(Json(ApiResponse::ok(vec![client])));
    }

    let filter = ClientFilter {
        name: query.name,
        company_name: query.company_name,
        rut: query.rut,
        frequent_client: query.frequent_client,
    };
    let clients = app_state.client_service.list(&filter).await?;

    Ok(Json(ApiResponse::ok(clients)))
}

// POST /api/clients
#[utoipa::path(
    post,
    path = "/api/clients",
    tag = "Clients",
    request_body = CreateClientPayload,
    responses(
        (status = 201, description = "Cliente criado", body = Client),
        (status = 400, description = "Dados inválidos"),
        (status = 409, description = "RUT já cadastrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_client(
    State(app_state): State<AppState>,
    AppJson(payload): AppJson<CreateClientPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let new_client = ClientService::new_client(
        payload.name.trim().to_string(),
        payload.rut.trim().to_string(),
        ClientChanges {
            company_name: payload.company_name,
            company_document: payload.company_document,
            phone_number: payload.phone_number,
            address: payload.address,
            frequent_client: payload.frequent_client,
            photo_file_name: payload.photo_file_name,
            ..Default::default()
        },
    );
    let client = app_state.client_service.create(new_client).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(client).with_message("Client created successfully")),
    ))
}

// PUT /api/clients/{id}
#[utoipa::path(
    put,
    path = "/api/clients/{id}",
    tag = "Clients",
    request_body = UpdateClientPayload,
    params(("id" = String, Path, description = "ID do cliente")),
    responses(
        (status = 200, description = "Cliente atualizado", body = Client),
        (status = 400, description = "Dados inválidos"),
        (status = 404, description = "Cliente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_client(
    State(app_state): State<AppState>,
    Path(raw_id): Path<String>,
    AppJson(payload): AppJson<UpdateClientPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let id = parse_id(&raw_id, client_not_found)?;

    let changes = ClientChanges {
        name: Some(payload.name.trim().to_string()),
        rut: payload.rut,
        company_name: payload.company_name,
        company_document: payload.company_document,
        phone_number: payload.phone_number,
        address: payload.address,
        frequent_client: payload.frequent_client,
        photo_file_name: payload.photo_file_name,
    };
    let client = app_state.client_service.update(id, changes).await?;

    Ok(Json(ApiResponse::ok(client).with_message("Client updated successfully")))
}

// DELETE /api/clients?id=
#[utoipa::path(
    delete,
    path = "/api/clients",
    tag = "Clients",
    params(IdQuery),
    responses(
        (status = 200, description = "Cliente removido"),
        (status = 400, description = "ID ausente"),
        (status = 404, description = "Cliente não encontrado"),
        (status = 409, description = "Cliente ainda referenciado por aluguéis")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_client(
    State(app_state): State<AppState>,
    AppQuery(query): AppQuery<IdQuery>,
) -> Result<impl IntoResponse, AppError> {
    let id = query.require("Client ID is required", client_not_found)?;
    app_state.client_service.delete(id).await?;

    Ok(Json(ApiResponse::<()>::message("Client deleted successfully")))
}
