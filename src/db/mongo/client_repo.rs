// src/db/mongo/client_repo.rs

use async_trait::async_trait;
use chrono::NaiveDate;
use futures::TryStreamExt;
use mongodb::{
    bson::{self, doc, Document},
    options::ReturnDocument,
    Collection, Database,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{
        mongo::{
            contains_regex, from_bson_datetime, is_duplicate_key, parse_uuid, to_bson_datetime,
            to_document, CLIENTS,
        },
        ClientRepository,
    },
    models::client::{Client, ClientFilter, NewClient},
};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClientDocument {
    id: String,
    name: String,
    #[serde(default)]
    company_name: String,
    #[serde(default)]
    company_document: String,
    rut: String,
    #[serde(default)]
    phone_number: String,
    #[serde(default)]
    address: String,
    creation_date: String,
    #[serde(default)]
    frequent_client: String,
    created: bson::DateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    photo_file_name: Option<String>,
}

impl From<&Client> for ClientDocument {
    fn from(client: &Client) -> Self {
        Self {
            id: client.id.to_string(),
            name: client.name.clone(),
            company_name: client.company_name.clone(),
            company_document: client.company_document.clone(),
            rut: client.rut.clone(),
            phone_number: client.phone_number.clone(),
            address: client.address.clone(),
            creation_date: client.creation_date.format("%Y-%m-%d").to_string(),
            frequent_client: client.frequent_client.clone(),
            created: to_bson_datetime(client.created),
            photo_file_name: client.photo_file_name.clone(),
        }
    }
}

impl ClientDocument {
    fn into_client(self) -> Result<Client, AppError> {
        let creation_date = NaiveDate::parse_from_str(&self.creation_date, "%Y-%m-%d")
            .map_err(|e| {
                AppError::InternalServerError(anyhow::anyhow!(
                    "invalid creationDate '{}': {}",
                    self.creation_date,
                    e
                ))
            })?;
        Ok(Client {
            id: parse_uuid(&self.id)?,
            name: self.name,
            company_name: self.company_name,
            company_document: self.company_document,
            rut: self.rut,
            phone_number: self.phone_number,
            address: self.address,
            creation_date,
            frequent_client: self.frequent_client,
            created: from_bson_datetime(self.created)?,
            photo_file_name: self.photo_file_name,
        })
    }
}

#[derive(Clone)]
pub struct MongoClientRepository {
    collection: Collection<ClientDocument>,
}

impl MongoClientRepository {
    pub fn new(database: &Database) -> Self {
        Self {
            collection: database.collection(CLIENTS),
        }
    }

    fn conflict(rut: &str) -> AppError {
        AppError::Conflict(format!("A client with RUT '{}' already exists.", rut))
    }
}

#[async_trait]
impl ClientRepository for MongoClientRepository {
    async fn list(&self, filter: &ClientFilter) -> Result<Vec<Client>, AppError> {
        let mut query = Document::new();
        if let Some(name) = &filter.name {
            query.insert("name", contains_regex(name));
        }
        if let Some(company_name) = &filter.company_name {
            query.insert("companyName", contains_regex(company_name));
        }
        if let Some(rut) = &filter.rut {
            query.insert("rut", doc! { "$regex": regex::escape(rut) });
        }
        if let Some(frequent_client) = &filter.frequent_client {
            query.insert("frequentClient", frequent_client.as_str());
        }

        let documents: Vec<ClientDocument> = self
            .collection
            .find(query)
            .sort(doc! { "created": -1 })
            .await?
            .try_collect()
            .await?;
        documents.into_iter().map(ClientDocument::into_client).collect()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Client>, AppError> {
        self.collection
            .find_one(doc! { "id": id.to_string() })
            .await?
            .map(ClientDocument::into_client)
            .transpose()
    }

    async fn find_by_rut(&self, rut: &str) -> Result<Option<Client>, AppError> {
        self.collection
            .find_one(doc! { "rut": rut })
            .await?
            .map(ClientDocument::into_client)
            .transpose()
    }

    async fn create(&self, client: NewClient) -> Result<Client, AppError> {
        let client = client.into_client(Uuid::new_v4());
        self.collection
            .insert_one(ClientDocument::from(&client))
            .await
            .map_err(|e| {
                if is_duplicate_key(&e) {
                    Self::conflict(&client.rut)
                } else {
                    e.into()
                }
            })?;
        Ok(client)
    }

    async fn find_or_create_by_rut(&self, client: NewClient) -> Result<(Client, bool), AppError> {
        // $setOnInsert + upsert: só insere se ninguém tiver o RUT.
        let candidate = client.into_client(Uuid::new_v4());
        let mut on_insert = to_document(&ClientDocument::from(&candidate))?;
        on_insert.remove("rut");

        let result = self
            .collection
            .find_one_and_update(
                doc! { "rut": candidate.rut.as_str() },
                doc! { "$setOnInsert": on_insert },
            )
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await;

        match result {
            Ok(Some(document)) => {
                let client = document.into_client()?;
                let created = client.id == candidate.id;
                Ok((client, created))
            }
            Ok(None) => Err(AppError::InternalServerError(anyhow::anyhow!(
                "upsert for RUT '{}' returned no document",
                candidate.rut
            ))),
            // Duas inserções simultâneas: a perdedora lê a vencedora.
            Err(e) if is_duplicate_key(&e) => self
                .find_by_rut(&candidate.rut)
                .await?
                .map(|existing| (existing, false))
                .ok_or_else(|| e.into()),
            Err(e) => Err(e.into()),
        }
    }

    async fn update(&self, client: &Client) -> Result<Option<Client>, AppError> {
        let result = self
            .collection
            .replace_one(doc! { "id": client.id.to_string() }, ClientDocument::from(client))
            .await
            .map_err(|e| {
                if is_duplicate_key(&e) {
                    Self::conflict(&client.rut)
                } else {
                    e.into()
                }
            })?;
        Ok((result.matched_count > 0).then(|| client.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = self.collection.delete_one(doc! { "id": id.to_string() }).await?;
        Ok(result.deleted_count > 0)
    }
}
