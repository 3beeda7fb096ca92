pub mod auth;
pub mod backup;
pub mod clients;
pub mod files;
pub mod products;
pub mod rents;
pub mod users;

use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::common::{error::AppError, lenient::optional_string};

/// `?id=` das rotas que recebem o id pela query string.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct IdQuery {
    #[serde(default, deserialize_with = "optional_string")]
    pub id: Option<String>,
}

impl IdQuery {
    /// `BadRequest(missing)` sem id. Um id que nem é UUID não pode existir,
    /// então vira o mesmo 404 de um id desconhecido.
    pub fn require(
        &self,
        missing: &str,
        not_found: impl FnOnce(&str) -> AppError,
    ) -> Result<Uuid, AppError> {
        let raw = self
            .id
            .as_deref()
            .ok_or_else(|| AppError::BadRequest(missing.to_string()))?;
        parse_id(raw, not_found)
    }
}

pub fn parse_id(raw: &str, not_found: impl FnOnce(&str) -> AppError) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim()).map_err(|_| not_found(raw))
}
