// src/services/backup_service.rs

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Timelike, Utc};

use crate::{
    common::error::AppError,
    config::BackupConfig,
    models::{
        backup::{BackupData, BackupKind, BackupReport, BackupSummary},
        client::ClientFilter,
        product::ProductFilter,
    },
    services::{
        client_service::ClientService,
        mailer::{EmailAttachment, Mailer, OutgoingEmail},
        product_service::ProductService,
        rent_service::RentService,
    },
};

/// Endereços informados primeiro, depois os padrão; sem vazios nem repetidos.
pub fn resolve_recipients(custom: &[String], defaults: &[String]) -> Vec<String> {
    let mut recipients: Vec<String> = Vec::new();
    for address in custom.iter().chain(defaults) {
        let address = address.trim();
        if !address.is_empty() && !recipients.iter().any(|r| r == address) {
            recipients.push(address.to_string());
        }
    }
    recipients
}

/// `<prefix>_<Backup|ManualBackup>_<YYYY-MM-DD>_<H>-<M>.json`, hora sem zero à esquerda.
pub fn backup_filename(prefix: &str, kind: BackupKind, local: &DateTime<FixedOffset>) -> String {
    format!(
        "{}_{}_{}_{}-{}.json",
        prefix,
        kind.file_label(),
        local.format("%Y-%m-%d"),
        local.hour(),
        local.minute()
    )
}

#[derive(Clone)]
pub struct BackupService {
    client_service: ClientService,
    product_service: ProductService,
    rent_service: RentService,
    mailer: Arc<dyn Mailer>,
    config: BackupConfig,
}

impl BackupService {
    pub fn new(
        client_service: ClientService,
        product_service: ProductService,
        rent_service: RentService,
        mailer: Arc<dyn Mailer>,
        config: BackupConfig,
    ) -> Self {
        Self {
            client_service,
            product_service,
            rent_service,
            mailer,
            config,
        }
    }

    pub fn config(&self) -> &BackupConfig {
        &self.config
    }

    async fn snapshot(&self, timestamp: DateTime<Utc>) -> Result<BackupData, AppError> {
        let client_filter = ClientFilter::default();
        let product_filter = ProductFilter::default();
        let (clients, products, rents) = tokio::try_join!(
            self.client_service.list(&client_filter),
            self.product_service.list(&product_filter),
            self.rent_service.list_all(),
        )?;

        let summary = BackupSummary {
            total_clients: clients.len(),
            total_products: products.len(),
            total_rents: rents.len(),
            active_rents: rents.iter().filter(|r| !r.is_finished).count(),
        };

        Ok(BackupData {
            timestamp,
            clients,
            products,
            rents,
            summary,
        })
    }

    /// Gera o snapshot e manda um e-mail por destinatário, em sequência.
    /// A primeira falha interrompe os envios seguintes.
    pub async fn run(&self, kind: BackupKind, custom_recipients: &[String]) -> Result<BackupReport, AppError> {
        let recipients = resolve_recipients(custom_recipients, &self.config.recipients);
        if recipients.is_empty() {
            return Err(AppError::BackupFailed("No backup recipients configured".to_string()));
        }

        let timestamp = Utc::now();
        let local = timestamp.with_timezone(&self.config.utc_offset);
        let data = self.snapshot(timestamp).await?;
        let filename = backup_filename(&self.config.file_prefix, kind, &local);

        let body = serde_json::to_vec_pretty(&data)
            .map_err(|e| AppError::InternalServerError(e.into()))?;
        let subject = format!(
            "{} - {} - {}",
            self.config.file_prefix,
            kind.subject_label(),
            local.format("%Y-%m-%d")
        );
        let text = format!(
            "{}\n\nGenerated at: {}\nClients: {}\nProducts: {}\nRents: {} ({} active)\n",
            subject,
            local.to_rfc3339(),
            data.summary.total_clients,
            data.summary.total_products,
            data.summary.total_rents,
            data.summary.active_rents
        );

        for recipient in &recipients {
            let email = OutgoingEmail {
                to: recipient.clone(),
                subject: subject.clone(),
                text: text.clone(),
                attachment: Some(EmailAttachment {
                    filename: filename.clone(),
                    content_type: "application/json".to_string(),
                    body: body.clone(),
                }),
            };
            self.mailer.send(&email).await.map_err(|e| {
                AppError::BackupFailed(format!("Failed to send backup to {}: {}", recipient, e))
            })?;
            tracing::info!("💾 Backup {} enviado para {}", filename, recipient);
        }

        Ok(BackupReport {
            timestamp,
            summary: data.summary,
            filename,
            recipients,
            backup_type: kind,
        })
    }
}
