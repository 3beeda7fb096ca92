// src/handlers/products.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::{
    common::{
        error::AppError,
        extract::{AppJson, AppQuery},
        lenient::{optional_decimal, optional_string, parse_decimal},
        response::ApiResponse,
    },
    config::AppState,
    handlers::{parse_id, IdQuery},
    models::product::{CreateProduct, Product, ProductChanges, ProductFilter},
};

fn product_not_found() -> AppError {
    AppError::NotFound("Product not found".to_string())
}

fn parse_price(raw: Option<String>, field: &str) -> Result<Option<Decimal>, AppError> {
    raw.map(|r| {
        parse_decimal(&r).ok_or_else(|| AppError::BadRequest(format!("{} must be a number", field)))
    })
    .transpose()
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListProductsQuery {
    #[serde(default, deserialize_with = "optional_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "optional_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "optional_string")]
    pub code: Option<String>,
    #[serde(default, deserialize_with = "optional_string")]
    pub brand: Option<String>,
    #[serde(default, deserialize_with = "optional_string")]
    pub rented: Option<String>,
    #[serde(default, deserialize_with = "optional_string")]
    pub min_price: Option<String>,
    #[serde(default, deserialize_with = "optional_string")]
    pub max_price: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductPayload {
    #[serde(default)]
    #[validate(length(min = 1, message = "Name is required"))]
    #[schema(example = "Silla Plegable")]
    pub name: String,

    #[serde(default, deserialize_with = "optional_string")]
    #[schema(example = "SILLAPLEGA")]
    pub code: Option<String>,
    #[serde(default, deserialize_with = "optional_string")]
    pub brand: Option<String>,

    #[serde(default, deserialize_with = "optional_decimal")]
    #[schema(value_type = Option<f64>)]
    pub price_net: Option<Decimal>,
    #[serde(default, deserialize_with = "optional_decimal")]
    #[schema(value_type = Option<f64>)]
    pub price_iva: Option<Decimal>,
    #[serde(default, deserialize_with = "optional_decimal")]
    #[schema(value_type = Option<f64>, example = 5000)]
    pub price_total: Option<Decimal>,
    #[serde(default, deserialize_with = "optional_decimal")]
    #[schema(value_type = Option<f64>)]
    pub price_warranty: Option<Decimal>,

    pub rented: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductPayload {
    #[serde(default, deserialize_with = "optional_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "optional_string")]
    pub code: Option<String>,
    #[serde(default, deserialize_with = "optional_string")]
    pub brand: Option<String>,
    #[serde(default, deserialize_with = "optional_decimal")]
    #[schema(value_type = Option<f64>)]
    pub price_net: Option<Decimal>,
    #[serde(default, deserialize_with = "optional_decimal")]
    #[schema(value_type = Option<f64>)]
    pub price_iva: Option<Decimal>,
    #[serde(default, deserialize_with = "optional_decimal")]
    #[schema(value_type = Option<f64>)]
    pub price_total: Option<Decimal>,
    #[serde(default, deserialize_with = "optional_decimal")]
    #[schema(value_type = Option<f64>)]
    pub price_warranty: Option<Decimal>,
    pub rented: Option<bool>,
}

// GET /api/products
#[utoipa::path(
    get,
    path = "/api/products",
    tag = "Products",
    params(ListProductsQuery),
    responses(
        (status = 200, description = "Lista de produtos (ou só o do id)", body = Vec<Product>),
        (status = 400, description = "Filtro inválido"),
        (status = 404, description = "Produto não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_products(
    State(app_state): State<AppState>,
    AppQuery(query): AppQuery<ListProductsQuery>,
) -> Result<impl IntoResponse, AppError> {
    if let Some(raw_id) = query.id.as_deref() {
        let id = parse_id(raw_id, |_| product_not_found())?;
        let product = app_state.product_service.get(id).await?;
        return Ok(Json(ApiResponse::ok(vec![product])));
    }

    let rented = query
        .rented
        .map(|r| {
            r.parse::<bool>()
                .map_err(|_| AppError::BadRequest("rented must be true or false".to_string()))
        })
        .transpose()?;

    let filter = ProductFilter {
        name: query.name,
        code: query.code,
        brand: query.brand,
        rented,
        min_price: parse_price(query.min_price, "minPrice")?,
        max_price: parse_price(query.max_price, "maxPrice")?,
    };
    let products = app_state.product_service.list(&filter).await?;

    Ok(Json(ApiResponse::ok(products)))
}

// POST /api/products
#[utoipa::path(
    post,
    path = "/api/products",
    tag = "Products",
    request_body = CreateProductPayload,
    responses(
        (status = 201, description = "Produto criado", body = Product),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_product(
    State(app_state): State<AppState>,
    AppJson(payload): AppJson<CreateProductPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let product = app_state
        .product_service
        .create(CreateProduct {
            name: payload.name,
            code: payload.code,
            brand: payload.brand,
            price_net: payload.price_net,
            price_iva: payload.price_iva,
            price_total: payload.price_total,
            price_warranty: payload.price_warranty,
            rented: payload.rented,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(product).with_message("Product created successfully")),
    ))
}

// PUT /api/products/{id}
#[utoipa::path(
    put,
    path = "/api/products/{id}",
    tag = "Products",
    request_body = UpdateProductPayload,
    params(("id" = String, Path, description = "ID do produto")),
    responses(
        (status = 200, description = "Produto atualizado", body = Product),
        (status = 404, description = "Produto não encontrado"),
        (status = 409, description = "Código já usado por outro produto")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_product(
    State(app_state): State<AppState>,
    Path(raw_id): Path<String>,
    AppJson(payload): AppJson<UpdateProductPayload>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&raw_id, |_| product_not_found())?;

    let changes = ProductChanges {
        name: payload.name,
        code: payload.code,
        brand: payload.brand,
        price_net: payload.price_net,
        price_iva: payload.price_iva,
        price_total: payload.price_total,
        price_warranty: payload.price_warranty,
        rented: payload.rented,
    };
    let product = app_state.product_service.update(id, changes).await?;

    Ok(Json(ApiResponse::ok(product).with_message("Product updated successfully")))
}

// DELETE /api/products?id=
#[utoipa::path(
    delete,
    path = "/api/products",
    tag = "Products",
    params(IdQuery),
    responses(
        (status = 200, description = "Produto removido"),
        (status = 400, description = "ID ausente"),
        (status = 404, description = "Produto não encontrado"),
        (status = 409, description = "Produto ainda referenciado por aluguéis")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_product(
    State(app_state): State<AppState>,
    AppQuery(query): AppQuery<IdQuery>,
) -> Result<impl IntoResponse, AppError> {
    let id = query.require("Product ID is required", |_| product_not_found())?;
    app_state.product_service.delete(id).await?;

    Ok(Json(ApiResponse::<()>::message("Product deleted successfully")))
}
