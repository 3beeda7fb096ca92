// src/services/user_service.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::{common::error::AppError, db::UserRepository, models::auth::User};

#[derive(Clone)]
pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(user_repo: Arc<dyn UserRepository>) -> Self {
        Self { user_repo }
    }

    pub async fn list(&self) -> Result<Vec<User>, AppError> {
        self.user_repo.list().await
    }

    pub async fn get(&self, id: Uuid) -> Result<User, AppError> {
        self.user_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    pub async fn set_membership(&self, id: Uuid, membership_paid: bool) -> Result<User, AppError> {
        let user = self
            .user_repo
            .update_membership(id, membership_paid)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        tracing::info!("💳 Mensalidade de {} agora {}", user.username, membership_paid);
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryUserRepository;

    #[tokio::test]
    async fn membership_toggle() {
        let id = Uuid::new_v4();
        let service = UserService::new(Arc::new(MemoryUserRepository::new(vec![User {
            id,
            username: "ana".into(),
            password: "x".into(),
            name: "Ana".into(),
            role: "user".into(),
            membership_paid: false,
        }])));

        assert!(service.set_membership(id, true).await.unwrap().membership_paid);
        assert!(service.get(id).await.unwrap().membership_paid);
        assert!(matches!(
            service.set_membership(Uuid::new_v4(), true).await,
            Err(AppError::NotFound(_))
        ));
    }
}
