// src/config.rs

use std::{env, sync::Arc};

use anyhow::{bail, Context};
use chrono::{FixedOffset, NaiveTime};

use crate::{
    common::search::WordMatch,
    db::Repositories,
    services::{
        auth::AuthService,
        backup_service::BackupService,
        client_service::ClientService,
        file_service::FileService,
        mailer::Mailer,
        product_service::ProductService,
        rent_service::RentService,
        user_service::UserService,
    },
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseConfig {
    Postgres { url: String, max_connections: u32 },
    MongoDb { uri: String, database: String },
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupConfig {
    pub recipients: Vec<String>,
    pub file_prefix: String,
    pub utc_offset: FixedOffset,
    /// Horário local do backup diário; `None` desliga o agendamento.
    pub daily_time: Option<NaiveTime>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailConfig {
    pub smtp_url: Option<String>,
    pub from: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectStorageConfig {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub region: String,
    pub bucket: String,
    pub url_expiration_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub server_addr: String,
    pub database: DatabaseConfig,
    pub search_word_match: WordMatch,
    pub jwt_secret: String,
    pub jwt_expiration_secs: i64,
    pub allow_plaintext_passwords: bool,
    pub backup: BackupConfig,
    pub mail: MailConfig,
    pub object_storage: Option<ObjectStorageConfig>,
    pub debug: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Variáveis vazias contam como não definidas.
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let require = |key: &str| get(key).with_context(|| format!("{} must be set", key));

        let database = match get("DATABASE_TYPE")
            .unwrap_or_else(|| "postgres".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "postgres" | "postgresql" | "relational" | "prisma" => DatabaseConfig::Postgres {
                url: require("DATABASE_URL")?,
                max_connections: parse_or(get("DATABASE_MAX_CONNECTIONS"), 5, "DATABASE_MAX_CONNECTIONS")?,
            },
            "mongodb" | "mongo" => DatabaseConfig::MongoDb {
                uri: require("MONGO_DB_URI")?,
                database: require("MONGO_DB_DATABASE")?,
            },
            "memory" => DatabaseConfig::Memory,
            other => bail!("unsupported DATABASE_TYPE '{}'", other),
        };

        let search_word_match = match get("SEARCH_WORD_MATCH") {
            Some(raw) => raw
                .parse::<WordMatch>()
                .map_err(|e| anyhow::anyhow!("SEARCH_WORD_MATCH: {}", e))?,
            None => match database {
                DatabaseConfig::MongoDb { .. } => WordMatch::Any,
                _ => WordMatch::All,
            },
        };

        let utc_offset_hours: i32 = parse_or(get("BACKUP_UTC_OFFSET_HOURS"), -3, "BACKUP_UTC_OFFSET_HOURS")?;
        let utc_offset = FixedOffset::east_opt(utc_offset_hours * 3600)
            .with_context(|| format!("BACKUP_UTC_OFFSET_HOURS out of range: {}", utc_offset_hours))?;

        let daily_time = get("DAILY_BACKUP_TIME")
            .map(|raw| {
                NaiveTime::parse_from_str(&raw, "%H:%M")
                    .with_context(|| format!("DAILY_BACKUP_TIME must be HH:MM, got '{}'", raw))
            })
            .transpose()?;

        let backup = BackupConfig {
            recipients: split_recipients(get("BACKUP_EMAIL_RECIPIENTS").as_deref().unwrap_or("")),
            file_prefix: get("BACKUP_FILE_PREFIX").unwrap_or_else(|| "BACKUP".to_string()),
            utc_offset,
            daily_time,
        };

        let mail = MailConfig {
            smtp_url: get("SMTP_URL"),
            from: get("FROM_EMAIL").unwrap_or_else(|| "donotreply@localhost".to_string()),
        };

        // Só liga o storage quando as quatro credenciais existem.
        let object_storage = match (
            get("AWS_ACCESS_KEY_ID"),
            get("AWS_SECRET_ACCESS_KEY"),
            get("AWS_REGION"),
            get("AWS_BUCKET_NAME"),
        ) {
            (Some(access_key_id), Some(secret_access_key), Some(region), Some(bucket)) => {
                Some(ObjectStorageConfig {
                    access_key_id,
                    secret_access_key,
                    region,
                    bucket,
                    url_expiration_secs: parse_or(
                        get("PRESIGNED_URL_EXPIRATION"),
                        60,
                        "PRESIGNED_URL_EXPIRATION",
                    )?,
                })
            }
            _ => None,
        };

        Ok(Self {
            server_addr: get("SERVER_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            database,
            search_word_match,
            jwt_secret: require("JWT_SECRET")?,
            jwt_expiration_secs: parse_or(get("JWT_EXPIRATION"), 3600, "JWT_EXPIRATION")?,
            allow_plaintext_passwords: parse_bool(get("ALLOW_PLAINTEXT_PASSWORDS"), true),
            backup,
            mail,
            object_storage,
            debug: parse_bool(get("DEBUG"), false),
        })
    }
}

fn parse_or<T>(raw: Option<String>, default: T, key: &str) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{} has an invalid value '{}': {}", key, raw, e)),
        None => Ok(default),
    }
}

fn parse_bool(raw: Option<String>, default: bool) -> bool {
    match raw.map(|v| v.to_ascii_lowercase()) {
        Some(v) => matches!(v.as_str(), "1" | "true" | "yes" | "on"),
        None => default,
    }
}

pub fn split_recipients(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

// =============================================================================
//  ESTADO DA APLICAÇÃO
// =============================================================================

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub auth_service: AuthService,
    pub user_service: UserService,
    pub client_service: ClientService,
    pub product_service: ProductService,
    pub rent_service: RentService,
    pub backup_service: BackupService,
    pub file_service: FileService,
}

impl AppState {
    /// Monta o grafo de dependências sobre os repositórios já conectados.
    pub fn new(config: Arc<Config>, repositories: Repositories, mailer: Arc<dyn Mailer>) -> Self {
        let auth_service = AuthService::new(
            repositories.users.clone(),
            config.jwt_secret.clone(),
            config.jwt_expiration_secs,
            config.allow_plaintext_passwords,
        );
        let user_service = UserService::new(repositories.users.clone());
        let client_service = ClientService::new(repositories.clients.clone());
        let product_service = ProductService::new(repositories.products.clone());
        let rent_service = RentService::new(
            repositories.rents.clone(),
            client_service.clone(),
            product_service.clone(),
            config.search_word_match,
        );
        let backup_service = BackupService::new(
            client_service.clone(),
            product_service.clone(),
            rent_service.clone(),
            mailer,
            config.backup.clone(),
        );
        let file_service = FileService::new(config.object_storage.clone());

        Self {
            config,
            auth_service,
            user_service,
            client_service,
            product_service,
            rent_service,
            backup_service,
            file_service,
        }
    }
}
