// src/models/product.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    /// Chave natural, única.
    pub code: String,
    pub brand: String,
    pub price_net: Decimal,
    pub price_iva: Decimal,
    pub price_total: Decimal,
    pub price_warranty: Decimal,
    pub rented: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub code: String,
    pub brand: String,
    pub price_net: Decimal,
    pub price_iva: Decimal,
    pub price_total: Decimal,
    pub price_warranty: Decimal,
    pub rented: bool,
    pub created_at: DateTime<Utc>,
}

impl NewProduct {
    pub fn into_product(self, id: Uuid) -> Product {
        Product {
            id,
            name: self.name,
            code: self.code,
            brand: self.brand,
            price_net: self.price_net,
            price_iva: self.price_iva,
            price_total: self.price_total,
            price_warranty: self.price_warranty,
            rented: self.rented,
            created_at: self.created_at,
            updated_at: None,
        }
    }
}

/// Entrada do cadastro manual de produto.
#[derive(Debug, Clone, Default)]
pub struct CreateProduct {
    pub name: String,
    pub code: Option<String>,
    pub brand: Option<String>,
    pub price_net: Option<Decimal>,
    pub price_iva: Option<Decimal>,
    pub price_total: Option<Decimal>,
    pub price_warranty: Option<Decimal>,
    pub rented: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub code: Option<String>,
    pub brand: Option<String>,
    pub price_net: Option<Decimal>,
    pub price_iva: Option<Decimal>,
    pub price_total: Option<Decimal>,
    pub price_warranty: Option<Decimal>,
    pub rented: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub name: Option<String>,
    pub code: Option<String>,
    pub brand: Option<String>,
    pub rented: Option<bool>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
}
