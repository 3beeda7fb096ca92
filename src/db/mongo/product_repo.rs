// src/db/mongo/product_repo.rs

use async_trait::async_trait;
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::{
    bson::{self, doc, Document},
    Collection, Database,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{
        mongo::{
            contains_regex, decimal_bson, exact_ignore_case_regex, from_bson_datetime,
            is_duplicate_key, parse_uuid, to_bson_datetime, PRODUCTS,
        },
        ProductRepository,
    },
    models::product::{NewProduct, Product, ProductFilter},
};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductDocument {
    id: String,
    name: String,
    code: String,
    #[serde(default)]
    brand: String,
    price_net: Decimal,
    price_iva: Decimal,
    price_total: Decimal,
    #[serde(default)]
    price_warranty: Decimal,
    #[serde(default)]
    rented: bool,
    created_at: bson::DateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    updated_at: Option<bson::DateTime>,
}

impl From<&Product> for ProductDocument {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            code: product.code.clone(),
            brand: product.brand.clone(),
            price_net: product.price_net,
            price_iva: product.price_iva,
            price_total: product.price_total,
            price_warranty: product.price_warranty,
            rented: product.rented,
            created_at: to_bson_datetime(product.created_at),
            updated_at: product.updated_at.map(to_bson_datetime),
        }
    }
}

impl ProductDocument {
    fn into_product(self) -> Result<Product, AppError> {
        Ok(Product {
            id: parse_uuid(&self.id)?,
            name: self.name,
            code: self.code,
            brand: self.brand,
            price_net: self.price_net,
            price_iva: self.price_iva,
            price_total: self.price_total,
            price_warranty: self.price_warranty,
            rented: self.rented,
            created_at: from_bson_datetime(self.created_at)?,
            updated_at: self.updated_at.map(from_bson_datetime).transpose()?,
        })
    }
}

#[derive(Clone)]
pub struct MongoProductRepository {
    collection: Collection<ProductDocument>,
}

impl MongoProductRepository {
    pub fn new(database: &Database) -> Self {
        Self {
            collection: database.collection(PRODUCTS),
        }
    }

    fn conflict(code: &str) -> AppError {
        AppError::Conflict(format!("A product with code '{}' already exists.", code))
    }
}

#[async_trait]
impl ProductRepository for MongoProductRepository {
    async fn list(&self, filter: &ProductFilter) -> Result<Vec<Product>, AppError> {
        let mut query = Document::new();
        if let Some(name) = &filter.name {
            query.insert("name", contains_regex(name));
        }
        if let Some(code) = &filter.code {
            query.insert("code", contains_regex(code));
        }
        if let Some(brand) = &filter.brand {
            query.insert("brand", contains_regex(brand));
        }
        if let Some(rented) = filter.rented {
            query.insert("rented", rented);
        }
        let mut price = Document::new();
        if let Some(min) = filter.min_price {
            price.insert("$gte", decimal_bson(min));
        }
        if let Some(max) = filter.max_price {
            price.insert("$lte", decimal_bson(max));
        }
        if !price.is_empty() {
            query.insert("priceTotal", price);
        }

        let documents: Vec<ProductDocument> = self
            .collection
            .find(query)
            .sort(doc! { "createdAt": -1 })
            .await?
            .try_collect()
            .await?;
        documents.into_iter().map(ProductDocument::into_product).collect()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Product>, AppError> {
        self.collection
            .find_one(doc! { "id": id.to_string() })
            .await?
            .map(ProductDocument::into_product)
            .transpose()
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Product>, AppError> {
        self.collection
            .find_one(doc! { "code": code })
            .await?
            .map(ProductDocument::into_product)
            .transpose()
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Product>, AppError> {
        self.collection
            .find_one(doc! { "name": exact_ignore_case_regex(name) })
            .sort(doc! { "createdAt": -1 })
            .await?
            .map(ProductDocument::into_product)
            .transpose()
    }

    async fn create(&self, product: NewProduct) -> Result<Product, AppError> {
        let product = product.into_product(Uuid::new_v4());
        self.collection
            .insert_one(ProductDocument::from(&product))
            .await
            .map_err(|e| {
                if is_duplicate_key(&e) {
                    Self::conflict(&product.code)
                } else {
                    e.into()
                }
            })?;
        Ok(product)
    }

    async fn update(&self, product: &Product) -> Result<Option<Product>, AppError> {
        let result = self
            .collection
            .replace_one(doc! { "id": product.id.to_string() }, ProductDocument::from(product))
            .await
            .map_err(|e| {
                if is_duplicate_key(&e) {
                    Self::conflict(&product.code)
                } else {
                    e.into()
                }
            })?;
        Ok((result.matched_count > 0).then(|| product.clone()))
    }

    async fn set_rented(&self, id: Uuid, rented: bool) -> Result<bool, AppError> {
        let result = self
            .collection
            .update_one(
                doc! { "id": id.to_string() },
                doc! { "$set": { "rented": rented, "updatedAt": to_bson_datetime(Utc::now()) } },
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = self.collection.delete_one(doc! { "id": id.to_string() }).await?;
        Ok(result.deleted_count > 0)
    }
}
