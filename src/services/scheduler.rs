// src/services/scheduler.rs

use chrono::{DateTime, Duration, FixedOffset, NaiveTime, Utc};
use tokio::task::JoinHandle;

use crate::{models::backup::BackupKind, services::backup_service::BackupService};

/// Próximo instante (em UTC) em que o relógio local marca `at`.
pub fn next_occurrence(now: DateTime<Utc>, at: NaiveTime, offset: FixedOffset) -> DateTime<Utc> {
    let local_date = now.with_timezone(&offset).date_naive();
    let to_utc = Duration::seconds(i64::from(offset.local_minus_utc()));

    let today = (local_date.and_time(at) - to_utc).and_utc();
    if today > now {
        today
    } else {
        today + Duration::days(1)
    }
}

/// Sobe a task do backup diário. `None` quando não há horário configurado.
pub fn spawn_daily_backup(backup: BackupService) -> Option<JoinHandle<()>> {
    let config = backup.config().clone();
    let Some(at) = config.daily_time else {
        tracing::warn!("⚠️ DAILY_BACKUP_TIME não definido: backup diário desativado");
        return None;
    };

    tracing::info!("⏰ Backup diário agendado para {} (UTC{})", at.format("%H:%M"), config.utc_offset);

    Some(tokio::spawn(async move {
        loop {
            let now = Utc::now();
            let next = next_occurrence(now, at, config.utc_offset);
            tokio::time::sleep((next - now).to_std().unwrap_or_default()).await;

            match backup.run(BackupKind::Daily, &[]).await {
                Ok(report) => tracing::info!(
                    "💾 Backup diário {} enviado para {} destinatário(s)",
                    report.filename,
                    report.recipients.len()
                ),
                Err(e) => tracing::error!("❌ Backup diário falhou: {}", e),
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn chile() -> FixedOffset {
        FixedOffset::west_opt(3 * 3600).unwrap()
    }

    #[test]
    fn later_today_in_local_time() {
        // 10:00 UTC = 07:00 local; 08:30 local = 11:30 UTC
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap();
        let next = next_occurrence(now, NaiveTime::from_hms_opt(8, 30, 0).unwrap(), chile());
        assert_eq!(next, Utc.with_ymd_and_hms(2024, 6, 1, 11, 30, 0).unwrap());
    }

    #[test]
    fn rolls_over_to_tomorrow() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let next = next_occurrence(now, NaiveTime::from_hms_opt(8, 30, 0).unwrap(), chile());
        assert_eq!(next, Utc.with_ymd_and_hms(2024, 6, 2, 11, 30, 0).unwrap());
    }

    #[test]
    fn local_date_differs_from_utc_date() {
        // 01:00 UTC de 2/jun ainda é 22:00 de 1/jun no horário local
        let now = Utc.with_ymd_and_hms(2024, 6, 2, 1, 0, 0).unwrap();
        let next = next_occurrence(now, NaiveTime::from_hms_opt(23, 0, 0).unwrap(), chile());
        assert_eq!(next, Utc.with_ymd_and_hms(2024, 6, 2, 2, 0, 0).unwrap());
    }
}
