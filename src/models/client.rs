// src/models/client.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: Uuid,
    pub name: String,
    pub company_name: String,
    pub company_document: String,
    /// Chave natural (RUT chileno).
    pub rut: String,
    pub phone_number: String,
    pub address: String,
    /// Só a data, sem hora.
    pub creation_date: NaiveDate,
    /// "Si" / "No", do jeito que o frontend manda.
    pub frequent_client: String,
    pub created: DateTime<Utc>,
    pub photo_file_name: Option<String>,
}

/// Dados para inserir um cliente; o id é gerado pelo repositório.
#[derive(Debug, Clone)]
pub struct NewClient {
    pub name: String,
    pub company_name: String,
    pub company_document: String,
    pub rut: String,
    pub phone_number: String,
    pub address: String,
    pub creation_date: NaiveDate,
    pub frequent_client: String,
    pub created: DateTime<Utc>,
    pub photo_file_name: Option<String>,
}

impl NewClient {
    pub fn into_client(self, id: Uuid) -> Client {
        Client {
            id,
            name: self.name,
            company_name: self.company_name,
            company_document: self.company_document,
            rut: self.rut,
            phone_number: self.phone_number,
            address: self.address,
            creation_date: self.creation_date,
            frequent_client: self.frequent_client,
            created: self.created,
            photo_file_name: self.photo_file_name,
        }
    }
}

/// Campos editáveis; `None` mantém o valor atual.
#[derive(Debug, Clone, Default)]
pub struct ClientChanges {
    pub name: Option<String>,
    pub company_name: Option<String>,
    pub company_document: Option<String>,
    pub rut: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub frequent_client: Option<String>,
    pub photo_file_name: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ClientFilter {
    pub name: Option<String>,
    pub company_name: Option<String>,
    pub rut: Option<String>,
    pub frequent_client: Option<String>,
}
