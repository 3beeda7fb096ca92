// src/services/client_service.rs

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::ClientRepository,
    models::client::{Client, ClientChanges, ClientFilter, NewClient},
};

pub const DEFAULT_FREQUENT_CLIENT: &str = "No";

#[derive(Clone)]
pub struct ClientService {
    client_repo: Arc<dyn ClientRepository>,
}

impl ClientService {
    pub fn new(client_repo: Arc<dyn ClientRepository>) -> Self {
        Self { client_repo }
    }

    /// Cliente novo com os padrões do cadastro: campos de empresa vazios,
    /// `frequentClient = "No"`, data de hoje.
    pub fn new_client(name: String, rut: String, details: ClientChanges) -> NewClient {
        let now = Utc::now();
        NewClient {
            name,
            rut,
            company_name: details.company_name.unwrap_or_default(),
            company_document: details.company_document.unwrap_or_default(),
            phone_number: details.phone_number.unwrap_or_default(),
            address: details.address.unwrap_or_default(),
            frequent_client: details
                .frequent_client
                .unwrap_or_else(|| DEFAULT_FREQUENT_CLIENT.to_string()),
            creation_date: now.date_naive(),
            created: now,
            photo_file_name: details.photo_file_name,
        }
    }

    pub async fn list(&self, filter: &ClientFilter) -> Result<Vec<Client>, AppError> {
        self.client_repo.list(filter).await
    }

    pub async fn get(&self, id: Uuid) -> Result<Client, AppError> {
        self.client_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Client with ID {} not found", id)))
    }

    pub async fn find_by_rut(&self, rut: &str) -> Result<Option<Client>, AppError> {
        self.client_repo.find_by_rut(rut.trim()).await
    }

    pub async fn create(&self, client: NewClient) -> Result<Client, AppError> {
        let client = self.client_repo.create(client).await?;
        tracing::info!("👤 Cliente criado: {} ({})", client.name, client.rut);
        Ok(client)
    }

    /// Resolve-or-create pelo RUT. Atômico no armazenamento, então dois
    /// aluguéis simultâneos para o mesmo RUT novo geram um único cliente.
    pub async fn resolve_by_rut(&self, rut: &str, name: &str) -> Result<Client, AppError> {
        let candidate = Self::new_client(
            name.trim().to_string(),
            rut.trim().to_string(),
            ClientChanges::default(),
        );
        let (client, created) = self.client_repo.find_or_create_by_rut(candidate).await?;
        if created {
            tracing::info!("👤 Cliente {} não encontrado, criado com id {}", client.rut, client.id);
        } else {
            tracing::info!("👤 Cliente {} encontrado ({})", client.rut, client.id);
        }
        Ok(client)
    }

    pub async fn update(&self, id: Uuid, changes: ClientChanges) -> Result<Client, AppError> {
        let mut client = self.get(id).await?;

        if let Some(name) = changes.name {
            client.name = name;
        }
        if let Some(company_name) = changes.company_name {
            client.company_name = company_name;
        }
        if let Some(company_document) = changes.company_document {
            client.company_document = company_document;
        }
        if let Some(rut) = changes.rut {
            client.rut = rut;
        }
        if let Some(phone_number) = changes.phone_number {
            client.phone_number = phone_number;
        }
        if let Some(address) = changes.address {
            client.address = address;
        }
        if let Some(frequent_client) = changes.frequent_client {
            client.frequent_client = frequent_client;
        }
        if changes.photo_file_name.is_some() {
            client.photo_file_name = changes.photo_file_name;
        }

        self.client_repo
            .update(&client)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Client with ID {} not found", id)))
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        self.get(id).await?;
        if !self.client_repo.delete(id).await? {
            return Err(AppError::NotFound(format!("Client with ID {} not found", id)));
        }
        tracing::info!("🗑️ Cliente {} removido", id);
        Ok(())
    }
}
