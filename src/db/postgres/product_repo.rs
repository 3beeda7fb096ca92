// src/db/postgres/product_repo.rs

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{
        postgres::{foreign_key_violation, unique_violation},
        ProductRepository,
    },
    models::product::{NewProduct, Product, ProductFilter},
};

macro_rules! product_columns {
    () => {
        "id, name, code, brand, price_net, price_iva, price_total, price_warranty, \
         rented, created_at, updated_at"
    };
}

#[derive(Clone)]
pub struct PgProductRepository {
    pool: PgPool,
}

impl PgProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    async fn list(&self, filter: &ProductFilter) -> Result<Vec<Product>, AppError> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new(concat!("SELECT ", product_columns!(), " FROM products WHERE TRUE"));

        for (column, term) in [
            ("name", &filter.name),
            ("code", &filter.code),
            ("brand", &filter.brand),
        ] {
            if let Some(term) = term {
                qb.push(" AND strpos(lower(")
                    .push(column)
                    .push("), lower(")
                    .push_bind(term.clone())
                    .push(")) > 0");
            }
        }
        if let Some(rented) = filter.rented {
            qb.push(" AND rented = ").push_bind(rented);
        }
        if let Some(min) = filter.min_price {
            qb.push(" AND price_total >= ").push_bind(min);
        }
        if let Some(max) = filter.max_price {
            qb.push(" AND price_total <= ").push_bind(max);
        }
        qb.push(" ORDER BY created_at DESC");

        let products = qb.build_query_as::<Product>().fetch_all(&self.pool).await?;
        Ok(products)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Product>, AppError> {
        let product = sqlx::query_as::<_, Product>(concat!(
            "SELECT ",
            product_columns!(),
            " FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(product)
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Product>, AppError> {
        let product = sqlx::query_as::<_, Product>(concat!(
            "SELECT ",
            product_columns!(),
            " FROM products WHERE code = $1"
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;
        Ok(product)
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Product>, AppError> {
        let product = sqlx::query_as::<_, Product>(concat!(
            "SELECT ",
            product_columns!(),
            " FROM products WHERE lower(name) = lower($1) ORDER BY created_at DESC LIMIT 1"
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(product)
    }

    async fn create(&self, product: NewProduct) -> Result<Product, AppError> {
        let code = product.code.clone();
        sqlx::query_as::<_, Product>(concat!(
            "INSERT INTO products (id, name, code, brand, price_net, price_iva, price_total, \
             price_warranty, rented, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING ",
            product_columns!()
        ))
        .bind(Uuid::new_v4())
        .bind(product.name)
        .bind(product.code)
        .bind(product.brand)
        .bind(product.price_net)
        .bind(product.price_iva)
        .bind(product.price_total)
        .bind(product.price_warranty)
        .bind(product.rented)
        .bind(product.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| unique_violation(e, || format!("A product with code '{}' already exists.", code)))
    }

    async fn update(&self, product: &Product) -> Result<Option<Product>, AppError> {
        sqlx::query_as::<_, Product>(concat!(
            "UPDATE products SET name = $2, code = $3, brand = $4, price_net = $5, price_iva = $6, \
             price_total = $7, price_warranty = $8, rented = $9, updated_at = $10 \
             WHERE id = $1 RETURNING ",
            product_columns!()
        ))
        .bind(product.id)
        .bind(&product.name)
        .bind(&product.code)
        .bind(&product.brand)
        .bind(product.price_net)
        .bind(product.price_iva)
        .bind(product.price_total)
        .bind(product.price_warranty)
        .bind(product.rented)
        .bind(product.updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            unique_violation(e, || format!("A product with code '{}' already exists.", product.code))
        })
    }

    async fn set_rented(&self, id: Uuid, rented: bool) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE products SET rented = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(rented)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                foreign_key_violation(e, || "Product is referenced by existing rents.".to_string())
            })?;
        Ok(result.rows_affected() > 0)
    }
}
