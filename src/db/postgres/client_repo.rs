// src/db/postgres/client_repo.rs

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{
        postgres::{foreign_key_violation, unique_violation},
        ClientRepository,
    },
    models::client::{Client, ClientFilter, NewClient},
};

macro_rules! client_columns {
    () => {
        "id, name, company_name, company_document, rut, phone_number, address, \
         creation_date, frequent_client, created, photo_file_name"
    };
}

#[derive(Clone)]
pub struct PgClientRepository {
    pool: PgPool,
}

impl PgClientRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ClientRepository for PgClientRepository {
    async fn list(&self, filter: &ClientFilter) -> Result<Vec<Client>, AppError> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new(concat!("SELECT ", client_columns!(), " FROM clients WHERE TRUE"));

        if let Some(name) = &filter.name {
            qb.push(" AND strpos(lower(name), lower(").push_bind(name.clone()).push(")) > 0");
        }
        if let Some(company_name) = &filter.company_name {
            qb.push(" AND strpos(lower(company_name), lower(")
                .push_bind(company_name.clone())
                .push(")) > 0");
        }
        if let Some(rut) = &filter.rut {
            qb.push(" AND strpos(rut, ").push_bind(rut.clone()).push(") > 0");
        }
        if let Some(frequent_client) = &filter.frequent_client {
            qb.push(" AND frequent_client = ").push_bind(frequent_client.clone());
        }
        qb.push(" ORDER BY created DESC");

        let clients = qb.build_query_as::<Client>().fetch_all(&self.pool).await?;
        Ok(clients)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Client>, AppError> {
        let client = sqlx::query_as::<_, Client>(concat!(
            "SELECT ",
            client_columns!(),
            " FROM clients WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(client)
    }

    async fn find_by_rut(&self, rut: &str) -> Result<Option<Client>, AppError> {
        let client = sqlx::query_as::<_, Client>(concat!(
            "SELECT ",
            client_columns!(),
            " FROM clients WHERE rut = $1"
        ))
        .bind(rut)
        .fetch_optional(&self.pool)
        .await?;
        Ok(client)
    }

    async fn create(&self, client: NewClient) -> Result<Client, AppError> {
        let rut = client.rut.clone();
        sqlx::query_as::<_, Client>(concat!(
            "INSERT INTO clients (",
            client_columns!(),
            ") VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) RETURNING ",
            client_columns!()
        ))
        .bind(Uuid::new_v4())
        .bind(client.name)
        .bind(client.company_name)
        .bind(client.company_document)
        .bind(client.rut)
        .bind(client.phone_number)
        .bind(client.address)
        .bind(client.creation_date)
        .bind(client.frequent_client)
        .bind(client.created)
        .bind(client.photo_file_name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| unique_violation(e, || format!("A client with RUT '{}' already exists.", rut)))
    }

    async fn find_or_create_by_rut(&self, client: NewClient) -> Result<(Client, bool), AppError> {
        // ON CONFLICT fecha a corrida entre duas criações com o mesmo RUT.
        let rut = client.rut.clone();
        let inserted = sqlx::query_as::<_, Client>(concat!(
            "INSERT INTO clients (",
            client_columns!(),
            ") VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             ON CONFLICT (rut) DO NOTHING RETURNING ",
            client_columns!()
        ))
        .bind(Uuid::new_v4())
        .bind(client.name)
        .bind(client.company_name)
        .bind(client.company_document)
        .bind(client.rut)
        .bind(client.phone_number)
        .bind(client.address)
        .bind(client.creation_date)
        .bind(client.frequent_client)
        .bind(client.created)
        .bind(client.photo_file_name)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(created) = inserted {
            return Ok((created, true));
        }

        let existing = self.find_by_rut(&rut).await?.ok_or_else(|| {
            AppError::InternalServerError(anyhow::anyhow!(
                "client with RUT '{}' conflicted but could not be read back",
                rut
            ))
        })?;
        Ok((existing, false))
    }

    async fn update(&self, client: &Client) -> Result<Option<Client>, AppError> {
        sqlx::query_as::<_, Client>(concat!(
            "UPDATE clients SET name = $2, company_name = $3, company_document = $4, rut = $5, \
             phone_number = $6, address = $7, frequent_client = $8, photo_file_name = $9 \
             WHERE id = $1 RETURNING ",
            client_columns!()
        ))
        .bind(client.id)
        .bind(&client.name)
        .bind(&client.company_name)
        .bind(&client.company_document)
        .bind(&client.rut)
        .bind(&client.phone_number)
        .bind(&client.address)
        .bind(&client.frequent_client)
        .bind(&client.photo_file_name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            unique_violation(e, || format!("A client with RUT '{}' already exists.", client.rut))
        })
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM clients WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                foreign_key_violation(e, || "Client is referenced by existing rents.".to_string())
            })?;
        Ok(result.rows_affected() > 0)
    }
}
