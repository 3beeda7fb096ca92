// src/models/backup.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::models::{client::Client, product::Product, rent::Rent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BackupKind {
    Daily,
    Manual,
}

impl BackupKind {
    pub fn file_label(self) -> &'static str {
        match self {
            BackupKind::Daily => "Backup",
            BackupKind::Manual => "ManualBackup",
        }
    }

    pub fn subject_label(self) -> &'static str {
        match self {
            BackupKind::Daily => "Daily Backup",
            BackupKind::Manual => "Manual Backup",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BackupSummary {
    pub total_clients: usize,
    pub total_products: usize,
    pub total_rents: usize,
    pub active_rents: usize,
}

/// Documento JSON anexado ao e-mail.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupData {
    pub timestamp: DateTime<Utc>,
    pub clients: Vec<Client>,
    pub products: Vec<Product>,
    pub rents: Vec<Rent>,
    pub summary: BackupSummary,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BackupReport {
    pub timestamp: DateTime<Utc>,
    pub summary: BackupSummary,
    pub filename: String,
    pub recipients: Vec<String>,
    pub backup_type: BackupKind,
}
