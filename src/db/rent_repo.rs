// src/db/rent_repo.rs

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::rent::{FinishRent, NewRent, Page, PageRequest, Rent, RentFilter},
};

#[async_trait]
pub trait RentRepository: Send + Sync {
    /// Lista filtrada, mais recentes primeiro.
    async fn list(&self, filter: &RentFilter) -> Result<Vec<Rent>, AppError>;

    async fn list_page(&self, filter: &RentFilter, page: PageRequest) -> Result<Page<Rent>, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Rent>, AppError>;

    async fn create(&self, rent: NewRent) -> Result<Rent, AppError>;

    /// Grava os campos editáveis e as referências a cliente/produto.
    async fn update(&self, rent: &Rent) -> Result<Option<Rent>, AppError>;

    /// Update parcial condicionado a `isFinished = false`. `None` quando o
    /// aluguel não existe ou já estava finalizado.
    async fn finish(&self, id: Uuid, finish: &FinishRent) -> Result<Option<Rent>, AppError>;

    /// Quantidade de registros removidos.
    async fn delete(&self, id: Uuid) -> Result<u64, AppError>;
}
