// src/models/rent.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::common::search::WordMatch;

pub const DEFAULT_PAGE_SIZE: u32 = 25;
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Um aluguel. `code`, `productName`, `clientRut`, `clientName` e
/// `totalValuePerDay` são campos de exibição: no Postgres vêm do JOIN com
/// produto/cliente, no MongoDB ficam desnormalizados no documento.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Rent {
    pub id: Uuid,
    pub code: String,
    pub product_name: String,
    pub client_rut: String,
    pub client_name: String,
    pub quantity: i32,
    pub total_value_per_day: Decimal,
    pub warranty_value: Decimal,
    pub warranty_type: Option<String>,
    pub delivery_date: Option<String>,
    pub payment_method: Option<String>,
    pub is_finished: bool,
    pub is_paid: bool,
    pub total_days: Option<i32>,
    pub total_price: Option<Decimal>,
    pub observations: Option<String>,
    pub client_id: Uuid,
    pub product_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewRent {
    pub code: String,
    pub product_name: String,
    pub client_rut: String,
    pub client_name: String,
    pub quantity: i32,
    pub total_value_per_day: Decimal,
    pub warranty_value: Decimal,
    pub warranty_type: Option<String>,
    pub delivery_date: Option<String>,
    pub payment_method: Option<String>,
    pub is_paid: bool,
    pub total_days: Option<i32>,
    pub total_price: Option<Decimal>,
    pub observations: Option<String>,
    pub client_id: Uuid,
    pub product_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl NewRent {
    pub fn into_rent(self, id: Uuid) -> Rent {
        Rent {
            id,
            code: self.code,
            product_name: self.product_name,
            client_rut: self.client_rut,
            client_name: self.client_name,
            quantity: self.quantity,
            total_value_per_day: self.total_value_per_day,
            warranty_value: self.warranty_value,
            warranty_type: self.warranty_type,
            delivery_date: self.delivery_date,
            payment_method: self.payment_method,
            is_finished: false,
            is_paid: self.is_paid,
            total_days: self.total_days,
            total_price: self.total_price,
            observations: self.observations,
            client_id: self.client_id,
            product_id: self.product_id,
            created_at: self.created_at,
        }
    }
}

/// Entrada validada da criação de aluguel.
#[derive(Debug, Clone)]
pub struct CreateRent {
    pub code: String,
    pub product_name: String,
    pub product_id: Option<Uuid>,
    pub product_code: Option<String>,
    pub quantity: i32,
    pub total_value_per_day: Decimal,
    pub client_rut: String,
    pub client_name: String,
    pub warranty_value: Decimal,
    pub warranty_type: Option<String>,
    pub delivery_date: Option<String>,
    pub payment_method: Option<String>,
    pub is_paid: bool,
    pub total_days: Option<i32>,
    pub total_price: Option<Decimal>,
    pub observations: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RentChanges {
    pub code: Option<String>,
    pub product_name: Option<String>,
    pub client_rut: Option<String>,
    /// Renomeia o cliente do aluguel (depois de resolver `client_rut`).
    pub client_name: Option<String>,
    pub quantity: Option<i32>,
    pub total_value_per_day: Option<Decimal>,
    pub warranty_value: Option<Decimal>,
    pub warranty_type: Option<String>,
    pub delivery_date: Option<String>,
    pub payment_method: Option<String>,
    pub is_paid: Option<bool>,
    pub total_days: Option<i32>,
    pub total_price: Option<Decimal>,
    pub observations: Option<String>,
}

/// Campos gravados na transição ACTIVE -> FINISHED. Os opcionais só são
/// escritos quando vieram na requisição.
#[derive(Debug, Clone)]
pub struct FinishRent {
    pub delivery_date: String,
    pub payment_method: String,
    pub total_days: Option<i32>,
    pub total_price: Option<Decimal>,
    pub observations: Option<String>,
    pub is_paid: Option<bool>,
}

/// Pedido de finalização como chegou da requisição.
#[derive(Debug, Clone, Default)]
pub struct FinishRentRequest {
    pub delivery_date: Option<String>,
    pub payment_method: Option<String>,
    pub total_days: Option<i32>,
    pub total_price: Option<Decimal>,
    pub observations: Option<String>,
    pub is_paid: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RentListType {
    Active,
    Finished,
    All,
}

impl RentListType {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("active") => RentListType::Active,
            Some("finished") => RentListType::Finished,
            _ => RentListType::All,
        }
    }

    pub fn is_finished(self) -> Option<bool> {
        match self {
            RentListType::Active => Some(false),
            RentListType::Finished => Some(true),
            RentListType::All => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RentFilter {
    pub is_finished: Option<bool>,
    pub code: Option<String>,
    pub product_name: Option<String>,
    pub client_name: Option<String>,
    pub client_rut: Option<String>,
    pub is_paid: Option<bool>,
    pub payment_method: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub word_match: WordMatch,
}

impl RentFilter {
    pub fn new(word_match: WordMatch) -> Self {
        Self {
            is_finished: None,
            code: None,
            product_name: None,
            client_name: None,
            client_rut: None,
            is_paid: None,
            payment_method: None,
            start_date: None,
            end_date: None,
            word_match,
        }
    }

    pub fn has_text_search(&self) -> bool {
        self.text_terms().next().is_some()
    }

    /// Pares (campo, termo) dos filtros de texto livre preenchidos.
    pub fn text_terms(&self) -> impl Iterator<Item = (TextField, &str)> {
        [
            (TextField::Code, self.code.as_deref()),
            (TextField::ProductName, self.product_name.as_deref()),
            (TextField::ClientName, self.client_name.as_deref()),
            (TextField::ClientRut, self.client_rut.as_deref()),
        ]
        .into_iter()
        .filter_map(|(field, term)| {
            term.filter(|t| !t.trim().is_empty()).map(|t| (field, t))
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    Code,
    ProductName,
    ClientName,
    ClientRut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    /// Zero ou ausente cai no padrão (página 1, 25 itens); `pageSize`
    /// acima de 1000 é limitado a 1000.
    pub fn new(page: Option<u32>, page_size: Option<u32>) -> Self {
        Self {
            page: page.filter(|p| *p > 0).unwrap_or(1),
            page_size: page_size
                .filter(|s| *s > 0)
                .map_or(DEFAULT_PAGE_SIZE, |s| s.min(MAX_PAGE_SIZE)),
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.page_size)
    }
}

#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaginationInfo {
    pub total_count: u64,
    pub total_pages: u64,
    pub current_page: u32,
    pub page_size: u32,
}

impl PaginationInfo {
    pub fn new(total_count: u64, request: PageRequest) -> Self {
        Self {
            total_count,
            total_pages: total_count.div_ceil(u64::from(request.page_size)),
            current_page: request.page,
            page_size: request.page_size,
        }
    }
}
