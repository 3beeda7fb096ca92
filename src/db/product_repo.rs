// src/db/product_repo.rs

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::product::{NewProduct, Product, ProductFilter},
};

#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn list(&self, filter: &ProductFilter) -> Result<Vec<Product>, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Product>, AppError>;

    async fn find_by_code(&self, code: &str) -> Result<Option<Product>, AppError>;

    /// Nome exato, ignorando maiúsculas/minúsculas. Devolve o mais recente.
    async fn find_by_name(&self, name: &str) -> Result<Option<Product>, AppError>;

    /// Falha com `Conflict` se o código já existir.
    async fn create(&self, product: NewProduct) -> Result<Product, AppError>;

    async fn update(&self, product: &Product) -> Result<Option<Product>, AppError>;

    async fn set_rented(&self, id: Uuid, rented: bool) -> Result<bool, AppError>;

    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;
}
