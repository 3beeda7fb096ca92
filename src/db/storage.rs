// src/db/storage.rs

use std::{sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    config::DatabaseConfig,
    db::{
        memory::{
            MemoryClientRepository, MemoryProductRepository, MemoryRentRepository,
            MemoryUserRepository,
        },
        mongo::{
            self, MongoClientRepository, MongoProductRepository, MongoRentRepository,
            MongoUserRepository,
        },
        postgres::{PgClientRepository, PgProductRepository, PgRentRepository, PgUserRepository},
        ClientRepository, ProductRepository, RentRepository, UserRepository,
    },
    models::auth::User,
};

/// Um repositório por entidade, todos do mesmo backend.
#[derive(Clone)]
pub struct Repositories {
    pub clients: Arc<dyn ClientRepository>,
    pub products: Arc<dyn ProductRepository>,
    pub rents: Arc<dyn RentRepository>,
    pub users: Arc<dyn UserRepository>,
}

impl Repositories {
    pub fn in_memory(users: Vec<User>) -> Self {
        Self {
            clients: Arc::new(MemoryClientRepository::new()),
            products: Arc::new(MemoryProductRepository::new()),
            rents: Arc::new(MemoryRentRepository::new()),
            users: Arc::new(MemoryUserRepository::new(users)),
        }
    }
}

/// Conexão com o backend escolhido. Aberta no início do processo e
/// fechada explicitamente no shutdown.
pub enum Storage {
    Postgres(PgPool),
    MongoDb {
        client: mongodb::Client,
        database: mongodb::Database,
    },
    Memory(Repositories),
}

impl Storage {
    pub async fn connect(config: &DatabaseConfig) -> anyhow::Result<Self> {
        match config {
            DatabaseConfig::Postgres { url, max_connections } => {
                let pool = PgPoolOptions::new()
                    .max_connections(*max_connections)
                    .acquire_timeout(Duration::from_secs(3))
                    .connect(url)
                    .await
                    .context("failed to connect to Postgres")?;
                tracing::info!("✅ Conexão com o Postgres estabelecida");
                Ok(Storage::Postgres(pool))
            }
            DatabaseConfig::MongoDb { uri, database } => {
                let client = mongodb::Client::with_uri_str(uri)
                    .await
                    .context("failed to create the MongoDB client")?;
                let database = client.database(database);
                database
                    .run_command(mongodb::bson::doc! { "ping": 1 })
                    .await
                    .context("failed to reach MongoDB")?;
                tracing::info!("✅ Conexão com o MongoDB estabelecida ({})", database.name());
                Ok(Storage::MongoDb { client, database })
            }
            DatabaseConfig::Memory => {
                tracing::warn!("⚠️ Usando armazenamento em memória: nada será persistido");
                Ok(Storage::Memory(Repositories::in_memory(Vec::new())))
            }
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            Storage::Postgres(_) => "postgres",
            Storage::MongoDb { .. } => "mongodb",
            Storage::Memory(_) => "memory",
        }
    }

    /// Migrações do SQLx no Postgres, índices únicos no MongoDB.
    pub async fn migrate(&self) -> anyhow::Result<()> {
        match self {
            Storage::Postgres(pool) => {
                sqlx::migrate!()
                    .run(pool)
                    .await
                    .context("failed to run database migrations")?;
                tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");
            }
            Storage::MongoDb { database, .. } => {
                mongo::ensure_indexes(database)
                    .await
                    .map_err(|e| anyhow::anyhow!("failed to create MongoDB indexes: {}", e))?;
                tracing::info!("✅ Índices do MongoDB garantidos");
            }
            Storage::Memory(_) => {}
        }
        Ok(())
    }

    pub fn repositories(&self) -> Repositories {
        match self {
            Storage::Postgres(pool) => Repositories {
                clients: Arc::new(PgClientRepository::new(pool.clone())),
                products: Arc::new(PgProductRepository::new(pool.clone())),
                rents: Arc::new(PgRentRepository::new(pool.clone())),
                users: Arc::new(PgUserRepository::new(pool.clone())),
            },
            Storage::MongoDb { database, .. } => Repositories {
                clients: Arc::new(MongoClientRepository::new(database)),
                products: Arc::new(MongoProductRepository::new(database)),
                rents: Arc::new(MongoRentRepository::new(database)),
                users: Arc::new(MongoUserRepository::new(database)),
            },
            Storage::Memory(repositories) => repositories.clone(),
        }
    }

    pub async fn close(self) {
        match self {
            Storage::Postgres(pool) => pool.close().await,
            Storage::MongoDb { client, .. } => client.shutdown().await,
            Storage::Memory(_) => {}
        }
        tracing::info!("🔌 Conexão com o armazenamento encerrada");
    }
}
