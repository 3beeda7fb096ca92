// src/db/user_repo.rs

use async_trait::async_trait;
use uuid::Uuid;

use crate::{common::error::AppError, models::auth::User};

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<User>, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError>;

    async fn update_membership(&self, id: Uuid, membership_paid: bool) -> Result<Option<User>, AppError>;
}
