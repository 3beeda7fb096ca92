// src/main.rs

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use rental_backend::{
    config::{AppState, Config},
    db::Storage,
    routes::create_router,
    services::{
        mailer::{DisabledMailer, Mailer, SmtpMailer},
        scheduler::spawn_daily_backup,
    },
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Falha ao carregar a configuração")?;

    // RUST_LOG tem prioridade; sem ele, DEBUG decide o nível.
    let default_level = if config.debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    let storage = Storage::connect(&config.database).await?;
    storage.migrate().await?;

    let mailer: Arc<dyn Mailer> = match config.mail.smtp_url.as_deref() {
        Some(url) => Arc::new(SmtpMailer::new(url, &config.mail.from)?),
        None => {
            tracing::warn!("⚠️ SMTP_URL não definido: backups por e-mail vão falhar");
            Arc::new(DisabledMailer)
        }
    };

    let config = Arc::new(config);
    let app_state = AppState::new(config.clone(), storage.repositories(), mailer);
    let scheduler = spawn_daily_backup(app_state.backup_service.clone());

    let app = create_router(app_state);

    // Inicia o servidor
    let listener = TcpListener::bind(&config.server_addr)
        .await
        .with_context(|| format!("Falha ao iniciar o listener TCP em {}", config.server_addr))?;
    tracing::info!(
        "🚀 Servidor escutando em {} (armazenamento: {})",
        listener.local_addr()?,
        storage.backend_name()
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Erro no servidor Axum")?;

    if let Some(handle) = scheduler {
        handle.abort();
    }
    storage.close().await;
    tracing::info!("👋 Servidor encerrado");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("❌ Falha ao escutar o sinal de encerramento: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("🛑 Sinal de encerramento recebido");
}
