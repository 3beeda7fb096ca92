// src/handlers/rents.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        extract::{AppJson, AppQuery},
        lenient::{optional_decimal, optional_i32, optional_string, optional_uuid},
        response::ApiResponse,
    },
    config::AppState,
    handlers::IdQuery,
    models::rent::{
        CreateRent, FinishRentRequest, PageRequest, PaginationInfo, Rent, RentChanges, RentListType,
    },
    services::rent_service::CreatedRent,
};

fn rent_not_found() -> AppError {
    AppError::NotFound("Rent not found".to_string())
}

// =============================================================================
//  PAYLOADS
// =============================================================================

/// Números chegam como número ou string; "" e null contam como ausentes.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRentPayload {
    #[serde(default, deserialize_with = "optional_string")]
    #[schema(example = "R1")]
    pub code: Option<String>,
    #[serde(default, deserialize_with = "optional_string")]
    #[schema(example = "Mesa")]
    pub product_name: Option<String>,
    #[serde(default, deserialize_with = "optional_uuid")]
    pub product_id: Option<Uuid>,
    #[serde(default, deserialize_with = "optional_string")]
    pub product_code: Option<String>,
    #[serde(default, deserialize_with = "optional_i32")]
    #[schema(value_type = Option<i32>, example = 2)]
    pub quantity: Option<i32>,
    #[serde(default, deserialize_with = "optional_decimal")]
    #[schema(value_type = Option<f64>, example = 1000)]
    pub total_value_per_day: Option<Decimal>,
    #[serde(default, deserialize_with = "optional_string")]
    #[schema(example = "1-9")]
    pub client_rut: Option<String>,
    #[serde(default, deserialize_with = "optional_string")]
    #[schema(example = "Ana")]
    pub client_name: Option<String>,
    #[serde(default, deserialize_with = "optional_decimal")]
    #[schema(value_type = Option<f64>, example = 0)]
    pub warranty_value: Option<Decimal>,
    #[serde(default, deserialize_with = "optional_string")]
    pub warranty_type: Option<String>,
    #[serde(default, deserialize_with = "optional_string")]
    pub delivery_date: Option<String>,
    #[serde(default, deserialize_with = "optional_string")]
    pub payment_method: Option<String>,
    #[serde(default, deserialize_with = "optional_string")]
    pub observations: Option<String>,
    pub is_paid: Option<bool>,
    #[serde(default, deserialize_with = "optional_i32")]
    #[schema(value_type = Option<i32>)]
    pub total_days: Option<i32>,
    #[serde(default, deserialize_with = "optional_decimal")]
    #[schema(value_type = Option<f64>)]
    pub total_price: Option<Decimal>,
}

impl CreateRentPayload {
    /// Strings precisam vir preenchidas e `quantity`/`totalValuePerDay`
    /// diferentes de zero; `warrantyValue` só precisa estar presente (0 vale).
    pub fn into_input(self) -> Result<CreateRent, AppError> {
        let quantity = self.quantity.filter(|q| *q != 0);
        let total_value_per_day = self.total_value_per_day.filter(|v| !v.is_zero());

        match (
            self.code,
            self.product_name,
            quantity,
            total_value_per_day,
            self.client_rut,
            self.client_name,
            self.warranty_value,
        ) {
            (
                Some(code),
                Some(product_name),
                Some(quantity),
                Some(total_value_per_day),
                Some(client_rut),
                Some(client_name),
                Some(warranty_value),
            ) => Ok(CreateRent {
                code,
                product_name,
                product_id: self.product_id,
                product_code: self.product_code,
                quantity,
                total_value_per_day,
                client_rut,
                client_name,
                warranty_value,
                warranty_type: self.warranty_type,
                delivery_date: self.delivery_date,
                payment_method: self.payment_method,
                is_paid: self.is_paid.unwrap_or(false),
                total_days: self.total_days,
                total_price: self.total_price,
                observations: self.observations,
            }),
            (code, product_name, quantity, total_value_per_day, client_rut, client_name, warranty_value) => {
                let missing: Vec<&str> = [
                    ("code", code.is_none()),
                    ("productName", product_name.is_none()),
                    ("quantity", quantity.is_none()),
                    ("totalValuePerDay", total_value_per_day.is_none()),
                    ("clientRut", client_rut.is_none()),
                    ("clientName", client_name.is_none()),
                    ("warrantyValue", warranty_value.is_none()),
                ]
                .into_iter()
                .filter_map(|(field, is_missing)| is_missing.then_some(field))
                .collect();
                Err(AppError::BadRequest(format!(
                    "Missing required fields: {}",
                    missing.join(", ")
                )))
            }
        }
    }
}

/// `isFinished` não é aceito aqui: finalizar só pela rota de finish.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRentPayload {
    #[serde(default, deserialize_with = "optional_string")]
    pub code: Option<String>,
    #[serde(default, deserialize_with = "optional_string")]
    pub product_name: Option<String>,
    #[serde(default, deserialize_with = "optional_string")]
    pub client_rut: Option<String>,
    #[serde(default, deserialize_with = "optional_string")]
    pub client_name: Option<String>,
    #[serde(default, deserialize_with = "optional_i32")]
    #[schema(value_type = Option<i32>)]
    pub quantity: Option<i32>,
    #[serde(default, deserialize_with = "optional_decimal")]
    #[schema(value_type = Option<f64>)]
    pub total_value_per_day: Option<Decimal>,
    #[serde(default, deserialize_with = "optional_decimal")]
    #[schema(value_type = Option<f64>)]
    pub warranty_value: Option<Decimal>,
    #[serde(default, deserialize_with = "optional_string")]
    pub warranty_type: Option<String>,
    #[serde(default, deserialize_with = "optional_string")]
    pub delivery_date: Option<String>,
    #[serde(default, deserialize_with = "optional_string")]
    pub payment_method: Option<String>,
    pub is_paid: Option<bool>,
    #[serde(default, deserialize_with = "optional_i32")]
    #[schema(value_type = Option<i32>)]
    pub total_days: Option<i32>,
    #[serde(default, deserialize_with = "optional_decimal")]
    #[schema(value_type = Option<f64>)]
    pub total_price: Option<Decimal>,
    #[serde(default, deserialize_with = "optional_string")]
    pub observations: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FinishRentPayload {
    #[serde(default, deserialize_with = "optional_string")]
    pub delivery_date: Option<String>,
    #[serde(default, deserialize_with = "optional_string")]
    #[schema(example = "Efectivo")]
    pub payment_method: Option<String>,
    #[serde(default, deserialize_with = "optional_i32")]
    #[schema(value_type = Option<i32>)]
    pub total_days: Option<i32>,
    #[serde(default, deserialize_with = "optional_decimal")]
    #[schema(value_type = Option<f64>)]
    pub total_price: Option<Decimal>,
    #[serde(default, deserialize_with = "optional_string")]
    pub observations: Option<String>,
    pub is_paid: Option<bool>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListRentsQuery {
    /// `active`, `finished` ou vazio (todos).
    #[serde(rename = "type", default, deserialize_with = "optional_string")]
    pub list_type: Option<String>,
    #[serde(default, deserialize_with = "optional_string")]
    pub page: Option<String>,
    #[serde(default, deserialize_with = "optional_string")]
    pub page_size: Option<String>,
    #[serde(default, deserialize_with = "optional_string")]
    pub code: Option<String>,
    #[serde(default, deserialize_with = "optional_string")]
    pub product_name: Option<String>,
    #[serde(default, deserialize_with = "optional_string")]
    pub client_name: Option<String>,
    #[serde(default, deserialize_with = "optional_string")]
    pub client_rut: Option<String>,
    #[serde(default, deserialize_with = "optional_string")]
    pub is_paid: Option<String>,
    #[serde(default, deserialize_with = "optional_string")]
    pub payment_method: Option<String>,
    /// RFC 3339 ou `YYYY-MM-DD`.
    #[serde(default, deserialize_with = "optional_string")]
    pub start_date: Option<String>,
    #[serde(default, deserialize_with = "optional_string")]
    pub end_date: Option<String>,
}

// =============================================================================
//  RESPOSTAS
// =============================================================================

#[derive(Debug, Serialize, ToSchema)]
pub struct RentListResponse {
    pub success: bool,
    pub data: Vec<Rent>,
    pub count: usize,
    #[serde(rename = "type")]
    pub list_type: RentListType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PaginationInfo>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FinishedRent {
    pub id: Uuid,
    pub delivery_date: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UpdatedRent {
    pub id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteRentResponse {
    pub success: bool,
    pub message: String,
    pub deleted_count: u64,
}

/// Data pura vira o início do dia (ou o fim, para `endDate`), em UTC.
fn parse_date_filter(raw: &str, end_of_day: bool) -> Result<DateTime<Utc>, AppError> {
    if let Ok(date_time) = DateTime::parse_from_rfc3339(raw) {
        return Ok(date_time.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest(format!("Invalid date: {}", raw)))?;
    let time = if end_of_day {
        NaiveTime::from_hms_milli_opt(23, 59, 59, 999)
    } else {
        NaiveTime::from_hms_opt(0, 0, 0)
    }
    .ok_or_else(|| AppError::BadRequest(format!("Invalid date: {}", raw)))?;
    Ok(date.and_time(time).and_utc())
}

// =============================================================================
//  HANDLERS
// =============================================================================

// GET /api/rents
#[utoipa::path(
    get,
    path = "/api/rents",
    tag = "Rents",
    params(ListRentsQuery),
    responses(
        (status = 200, description = "Aluguéis filtrados; `finished` vem paginado", body = RentListResponse),
        (status = 400, description = "Filtro inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_rents(
    State(app_state): State<AppState>,
    AppQuery(query): AppQuery<ListRentsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let list_type = RentListType::parse(query.list_type.as_deref());
    let page = PageRequest::new(
        query.page.and_then(|p| p.parse().ok()),
        query.page_size.and_then(|s| s.parse().ok()),
    );

    let mut filter = app_state.rent_service.new_filter();
    filter.code = query.code;
    filter.product_name = query.product_name;
    filter.client_name = query.client_name;
    filter.client_rut = query.client_rut;
    filter.payment_method = query.payment_method;
    filter.is_paid = query
        .is_paid
        .map(|p| {
            p.parse::<bool>()
                .map_err(|_| AppError::BadRequest("isPaid must be true or false".to_string()))
        })
        .transpose()?;
    filter.start_date = query
        .start_date
        .map(|d| parse_date_filter(&d, false))
        .transpose()?;
    filter.end_date = query
        .end_date
        .map(|d| parse_date_filter(&d, true))
        .transpose()?;

    let listing = app_state.rent_service.list(list_type, filter, page).await?;

    Ok(Json(RentListResponse {
        success: true,
        count: listing.items.len(),
        data: listing.items,
        list_type,
        pagination: listing.pagination,
    }))
}

// POST /api/rents
#[utoipa::path(
    post,
    path = "/api/rents",
    tag = "Rents",
    request_body = CreateRentPayload,
    responses(
        (status = 201, description = "Aluguel criado, com cliente e produto resolvidos", body = CreatedRent),
        (status = 400, description = "Campos obrigatórios ausentes"),
        (status = 404, description = "productId informado não existe")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_rent(
    State(app_state): State<AppState>,
    AppJson(payload): AppJson<CreateRentPayload>,
) -> Result<impl IntoResponse, AppError> {
    let input = payload.into_input()?;
    let created = app_state.rent_service.create(input).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(created).with_message("Rent created successfully")),
    ))
}

// PUT /api/rents?id=
#[utoipa::path(
    put,
    path = "/api/rents",
    tag = "Rents",
    params(IdQuery),
    request_body = UpdateRentPayload,
    responses(
        (status = 200, description = "Aluguel atualizado", body = UpdatedRent),
        (status = 400, description = "ID ausente"),
        (status = 404, description = "Aluguel, cliente ou produto não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_rent(
    State(app_state): State<AppState>,
    AppQuery(query): AppQuery<IdQuery>,
    AppJson(payload): AppJson<UpdateRentPayload>,
) -> Result<impl IntoResponse, AppError> {
    let id = query.require("Rent ID is required", |_| rent_not_found())?;

    let changes = RentChanges {
        code: payload.code,
        product_name: payload.product_name,
        client_rut: payload.client_rut,
        client_name: payload.client_name,
        quantity: payload.quantity,
        total_value_per_day: payload.total_value_per_day,
        warranty_value: payload.warranty_value,
        warranty_type: payload.warranty_type,
        delivery_date: payload.delivery_date,
        payment_method: payload.payment_method,
        is_paid: payload.is_paid,
        total_days: payload.total_days,
        total_price: payload.total_price,
        observations: payload.observations,
    };
    let rent = app_state.rent_service.update(id, changes).await?;

    Ok(Json(
        ApiResponse::ok(UpdatedRent { id: rent.id }).with_message("Rent updated successfully"),
    ))
}

// PATCH /api/rents/finish?id=
#[utoipa::path(
    patch,
    path = "/api/rents/finish",
    tag = "Rents",
    params(IdQuery),
    request_body = FinishRentPayload,
    responses(
        (status = 200, description = "Aluguel finalizado", body = FinishedRent),
        (status = 400, description = "Já finalizado ou sem forma de pagamento"),
        (status = 404, description = "Aluguel não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn finish_rent(
    State(app_state): State<AppState>,
    AppQuery(query): AppQuery<IdQuery>,
    AppJson(payload): AppJson<FinishRentPayload>,
) -> Result<impl IntoResponse, AppError> {
    let id = query.require("Rent ID is required", |_| rent_not_found())?;

    let rent = app_state
        .rent_service
        .finish(
            id,
            FinishRentRequest {
                delivery_date: payload.delivery_date,
                payment_method: payload.payment_method,
                total_days: payload.total_days,
                total_price: payload.total_price,
                observations: payload.observations,
                is_paid: payload.is_paid,
            },
        )
        .await?;

    Ok(Json(
        ApiResponse::ok(FinishedRent {
            id: rent.id,
            delivery_date: rent.delivery_date,
        })
        .with_message("Rent finished successfully"),
    ))
}

// DELETE /api/rents?id=
#[utoipa::path(
    delete,
    path = "/api/rents",
    tag = "Rents",
    params(IdQuery),
    responses(
        (status = 200, description = "Aluguel removido", body = DeleteRentResponse),
        (status = 400, description = "ID ausente"),
        (status = 404, description = "Aluguel não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_rent(
    State(app_state): State<AppState>,
    AppQuery(query): AppQuery<IdQuery>,
) -> Result<impl IntoResponse, AppError> {
    let id = query.require("Rent ID is required", |_| rent_not_found())?;
    let deleted_count = app_state.rent_service.delete(id).await?;

    Ok(Json(DeleteRentResponse {
        success: true,
        message: "Rent deleted successfully".to_string(),
        deleted_count,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(json: serde_json::Value) -> CreateRentPayload {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn lists_missing_fields_in_order() {
        let err = payload(serde_json::json!({ "code": "R1", "quantity": 0 }))
            .into_input()
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::BadRequest(ref m) if m == "Missing required fields: productName, quantity, \
                totalValuePerDay, clientRut, clientName, warrantyValue"
        ));
    }

    #[test]
    fn warranty_zero_is_present_but_empty_is_not() {
        let base = serde_json::json!({
            "code": "R1", "productName": "Mesa", "quantity": "2",
            "totalValuePerDay": 1000, "clientRut": "1-9", "clientName": "Ana",
        });

        let mut with_zero = base.clone();
        with_zero["warrantyValue"] = 0.into();
        let input = payload(with_zero).into_input().unwrap();
        assert_eq!(input.warranty_value, Decimal::ZERO);
        assert_eq!(input.quantity, 2);

        let mut with_empty = base;
        with_empty["warrantyValue"] = "".into();
        let err = payload(with_empty).into_input().unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref m) if m == "Missing required fields: warrantyValue"));
    }

    #[test]
    fn date_filters_accept_plain_dates() {
        let start = parse_date_filter("2024-06-01", false).unwrap();
        let end = parse_date_filter("2024-06-01", true).unwrap();
        assert_eq!(start.to_rfc3339(), "2024-06-01T00:00:00+00:00");
        assert!(end > start);
        assert!(parse_date_filter("2024-06-01T10:00:00-03:00", false).is_ok());
        assert!(parse_date_filter("yesterday", false).is_err());
    }
}
