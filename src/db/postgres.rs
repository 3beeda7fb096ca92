// src/db/postgres.rs

pub mod client_repo;
pub use client_repo::PgClientRepository;
pub mod product_repo;
pub use product_repo::PgProductRepository;
pub mod rent_repo;
pub use rent_repo::PgRentRepository;
pub mod user_repo;
pub use user_repo::PgUserRepository;

use crate::common::error::AppError;

/// Violação de UNIQUE vira `Conflict`; o resto segue como erro de banco.
pub(crate) fn unique_violation(e: sqlx::Error, message: impl FnOnce() -> String) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return AppError::Conflict(message());
        }
    }
    e.into()
}

/// Idem para FOREIGN KEY (apagar cliente/produto ainda referenciado).
pub(crate) fn foreign_key_violation(e: sqlx::Error, message: impl FnOnce() -> String) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_foreign_key_violation() {
            return AppError::Conflict(message());
        }
    }
    e.into()
}
