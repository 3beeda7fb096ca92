// src/db/client_repo.rs

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::client::{Client, ClientFilter, NewClient},
};

#[async_trait]
pub trait ClientRepository: Send + Sync {
    /// Lista filtrada, mais recentes primeiro.
    async fn list(&self, filter: &ClientFilter) -> Result<Vec<Client>, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Client>, AppError>;

    /// Busca exata pelo RUT.
    async fn find_by_rut(&self, rut: &str) -> Result<Option<Client>, AppError>;

    /// Falha com `Conflict` se o RUT já existir.
    async fn create(&self, client: NewClient) -> Result<Client, AppError>;

    /// Upsert pelo RUT: devolve o cliente existente ou insere `client`.
    /// O booleano indica se houve inserção.
    async fn find_or_create_by_rut(&self, client: NewClient) -> Result<(Client, bool), AppError>;

    /// Grava todos os campos; `None` se o id não existir.
    async fn update(&self, client: &Client) -> Result<Option<Client>, AppError>;

    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;
}
