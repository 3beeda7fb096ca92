// src/db/mongo.rs

pub mod client_repo;
pub use client_repo::MongoClientRepository;
pub mod product_repo;
pub use product_repo::MongoProductRepository;
pub mod rent_repo;
pub use rent_repo::MongoRentRepository;
pub mod user_repo;
pub use user_repo::MongoUserRepository;

use chrono::{DateTime, Utc};
use mongodb::{
    bson::{self, doc, Bson, Document},
    error::{ErrorKind, WriteFailure},
    options::IndexOptions,
    Database, IndexModel,
};
use rust_decimal::{prelude::ToPrimitive, Decimal};
use uuid::Uuid;

use crate::common::error::AppError;

pub const CLIENTS: &str = "clients";
pub const PRODUCTS: &str = "products";
pub const RENTS: &str = "rents";
pub const USERS: &str = "users";

const DUPLICATE_KEY: i32 = 11000;

pub(crate) fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(e)) => e.code == DUPLICATE_KEY,
        ErrorKind::Command(e) => e.code == DUPLICATE_KEY,
        _ => false,
    }
}

/// Filtro `$regex` case-insensitive de substring.
pub(crate) fn contains_regex(term: &str) -> Document {
    doc! { "$regex": regex::escape(term), "$options": "i" }
}

pub(crate) fn exact_ignore_case_regex(term: &str) -> Document {
    doc! { "$regex": format!("^{}$", regex::escape(term)), "$options": "i" }
}

pub(crate) fn parse_uuid(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw)
        .map_err(|e| AppError::InternalServerError(anyhow::anyhow!("invalid stored id '{}': {}", raw, e)))
}

pub(crate) fn to_bson_datetime(value: DateTime<Utc>) -> bson::DateTime {
    bson::DateTime::from_millis(value.timestamp_millis())
}

pub(crate) fn from_bson_datetime(value: bson::DateTime) -> Result<DateTime<Utc>, AppError> {
    DateTime::<Utc>::from_timestamp_millis(value.timestamp_millis()).ok_or_else(|| {
        AppError::InternalServerError(anyhow::anyhow!("stored timestamp out of range: {}", value))
    })
}

pub(crate) fn decimal_bson(value: Decimal) -> Bson {
    Bson::Double(value.to_f64().unwrap_or_default())
}

pub(crate) fn to_document<T: serde::Serialize>(value: &T) -> Result<Document, AppError> {
    bson::to_document(value)
        .map_err(|e| AppError::InternalServerError(anyhow::anyhow!("bson serialization failed: {}", e)))
}

/// Índices únicos que dão suporte às chaves naturais.
pub async fn ensure_indexes(database: &Database) -> Result<(), AppError> {
    let unique = |keys: Document| {
        IndexModel::builder()
            .keys(keys)
            .options(IndexOptions::builder().unique(true).build())
            .build()
    };

    let indexes = [
        (CLIENTS, doc! { "id": 1 }),
        (CLIENTS, doc! { "rut": 1 }),
        (PRODUCTS, doc! { "id": 1 }),
        (PRODUCTS, doc! { "code": 1 }),
        (RENTS, doc! { "id": 1 }),
        (USERS, doc! { "id": 1 }),
        (USERS, doc! { "username": 1 }),
    ];

    for (collection, keys) in indexes {
        database
            .collection::<Document>(collection)
            .create_index(unique(keys))
            .await?;
    }

    database
        .collection::<Document>(RENTS)
        .create_index(IndexModel::builder().keys(doc! { "isFinished": 1, "createdAt": -1 }).build())
        .await?;

    Ok(())
}
