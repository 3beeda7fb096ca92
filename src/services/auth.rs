// src/services/auth.rs

use std::sync::Arc;

use bcrypt::verify;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::{
    common::error::AppError,
    db::UserRepository,
    models::auth::{AuthResponse, Claims, User},
};

fn is_bcrypt_hash(stored: &str) -> bool {
    ["$2a$", "$2b$", "$2x$", "$2y$"]
        .iter()
        .any(|prefix| stored.starts_with(prefix))
}

#[derive(Clone)]
pub struct AuthService {
    user_repo: Arc<dyn UserRepository>,
    jwt_secret: String,
    expiration_secs: i64,
    allow_plaintext_passwords: bool,
}

impl AuthService {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        jwt_secret: String,
        expiration_secs: i64,
        allow_plaintext_passwords: bool,
    ) -> Self {
        Self {
            user_repo,
            jwt_secret,
            expiration_secs,
            allow_plaintext_passwords,
        }
    }

    pub async fn login_user(&self, username: &str, password: &str) -> Result<AuthResponse, AppError> {
        let user = self
            .user_repo
            .find_by_username(username.trim())
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let is_password_valid = if is_bcrypt_hash(&user.password) {
            let password_clone = password.to_owned();
            let password_hash_clone = user.password.clone();

            // Executa a verificação em um thread separado
            tokio::task::spawn_blocking(move || verify(&password_clone, &password_hash_clone))
                .await
                .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??
        } else if self.allow_plaintext_passwords {
            tracing::warn!(
                "⚠️ Usuário {} ainda tem senha em texto puro; migre para bcrypt",
                user.username
            );
            user.password == password
        } else {
            false
        };

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }

        tracing::info!("🔑 Login de {}", user.username);
        self.create_token(&user)
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims, AppError> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|_| AppError::InvalidToken)
    }

    pub fn create_token(&self, user: &User) -> Result<AuthResponse, AppError> {
        let now = Utc::now();
        let expires_at = now + Duration::seconds(self.expiration_secs);

        let claims = Claims {
            id: user.id,
            username: user.username.clone(),
            name: user.name.clone(),
            role: user.role.clone(),
            membership_paid: user.membership_paid,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?;

        Ok(AuthResponse {
            token,
            expires_in: self.expiration_secs,
        })
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::db::memory::MemoryUserRepository;

    fn user(username: &str, password: String) -> User {
        User {
            id: Uuid::new_v4(),
            username: username.into(),
            password,
            name: "Ana".into(),
            role: "admin".into(),
            membership_paid: true,
        }
    }

    fn service(allow_plaintext: bool) -> AuthService {
        let users = vec![
            user("hashed", bcrypt::hash("s3cret", 4).unwrap()),
            user("plain", "s3cret".into()),
        ];
        AuthService::new(
            Arc::new(MemoryUserRepository::new(users)),
            "test-secret".into(),
            3600,
            allow_plaintext,
        )
    }

    #[tokio::test]
    async fn bcrypt_login_issues_a_verifiable_token() {
        let service = service(false);
        let auth = service.login_user("hashed", "s3cret").await.unwrap();
        assert_eq!(auth.expires_in, 3600);

        let claims = service.validate_token(&auth.token).unwrap();
        assert_eq!(claims.username, "hashed");
        assert_eq!(claims.role, "admin");
        assert!(claims.membership_paid);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[tokio::test]
    async fn wrong_password_or_unknown_user_fails() {
        let service = service(true);
        assert!(matches!(
            service.login_user("hashed", "nope").await,
            Err(AppError::InvalidCredentials)
        ));
        assert!(matches!(
            service.login_user("ghost", "s3cret").await,
            Err(AppError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn plaintext_passwords_depend_on_config() {
        assert!(service(true).login_user("plain", "s3cret").await.is_ok());
        assert!(matches!(
            service(false).login_user("plain", "s3cret").await,
            Err(AppError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn tokens_from_another_secret_are_rejected() {
        let auth = service(true).login_user("plain", "s3cret").await.unwrap();
        let other = AuthService::new(
            Arc::new(MemoryUserRepository::new(Vec::new())),
            "another-secret".into(),
            3600,
            true,
        );
        assert!(matches!(other.validate_token(&auth.token), Err(AppError::InvalidToken)));
        assert!(matches!(other.validate_token("garbage"), Err(AppError::InvalidToken)));
    }
}
