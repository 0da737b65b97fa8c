use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use tokio::time::interval;
use tracing::{error, info, warn};

use crate::application::use_cases::{client::ClientUseCases, reminder::ReminderUseCases};

/// Send due-date reminders and overdue notices on a fixed interval.
pub async fn run_reminder_loop(reminder_use_cases: Arc<ReminderUseCases>, poll_secs: u64) {
    let mut ticker = interval(Duration::from_secs(poll_secs.max(1)));

    info!("Reminder worker started (polling every {}s)", poll_secs);

    loop {
        ticker.tick().await;

        match reminder_use_cases.run(Local::now().date_naive()).await {
            Ok(run) if run.failed > 0 => {
                warn!(sent = run.sent, failed = run.failed, "Some reminders failed to send");
            }
            Ok(_) => {}
            Err(e) => {
                error!(error = %e, "Reminder run failed");
            }
        }
    }
}

/// Rebuild client snapshots from payment history and repair any drift.
pub async fn run_snapshot_audit_loop(client_use_cases: Arc<ClientUseCases>, every_secs: u64) {
    let mut ticker = interval(Duration::from_secs(every_secs.max(1)));

    info!("Snapshot audit worker started (every {}s)", every_secs);

    loop {
        ticker.tick().await;

        match client_use_cases.audit_all_snapshots(true).await {
            Ok(report) if !report.drifted.is_empty() => {
                warn!(
                    checked = report.checked,
                    repaired = report.drifted.len(),
                    "Repaired drifted client snapshots"
                );
            }
            Ok(report) => {
                info!(checked = report.checked, "Client snapshots consistent");
            }
            Err(e) => {
                error!(error = %e, "Snapshot audit failed");
            }
        }
    }
}
