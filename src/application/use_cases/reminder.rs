use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use serde::Serialize;
use tracing::instrument;

use crate::{
    app_error::AppResult,
    application::{
        email_templates::{payment_overdue_email, payment_reminder_email},
        use_cases::client::{ClientRepoTrait, EmailLogRepoTrait, ReminderCandidate},
    },
    domain::entities::email_log::{EmailKind, EmailStatus},
};

/// How far back an unpaid due date still gets an overdue notice.
pub const OVERDUE_LOOKBACK_DAYS: i64 = 30;

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html: &str) -> AppResult<()>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReminderRun {
    pub sent: usize,
    pub failed: usize,
    pub skipped: usize,
}

#[derive(Clone)]
pub struct ReminderUseCases {
    clients: Arc<dyn ClientRepoTrait>,
    email_logs: Arc<dyn EmailLogRepoTrait>,
    sender: Arc<dyn EmailSender>,
    days_before: i64,
}

impl ReminderUseCases {
    pub fn new(
        clients: Arc<dyn ClientRepoTrait>,
        email_logs: Arc<dyn EmailLogRepoTrait>,
        sender: Arc<dyn EmailSender>,
        days_before: i64,
    ) -> Self {
        Self {
            clients,
            email_logs,
            sender,
            days_before,
        }
    }

    /// Send every reminder and overdue notice due on `today`.
    ///
    /// Each client gets at most one email per kind and due date; a failed
    /// send is logged and retried on the next run.
    #[instrument(skip(self))]
    pub async fn run(&self, today: NaiveDate) -> AppResult<ReminderRun> {
        let from = today - Duration::days(OVERDUE_LOOKBACK_DAYS);
        let to = today + Duration::days(self.days_before);
        let candidates = self.clients.list_reminder_candidates(from, to).await?;

        let mut run = ReminderRun::default();
        for candidate in candidates {
            let client = &candidate.client;
            let (Some(email), Some(due_date)) =
                (client.email.as_deref(), client.snapshot.next_payment_date)
            else {
                run.skipped += 1;
                continue;
            };

            let kind = if due_date < today {
                EmailKind::PaymentOverdue
            } else {
                EmailKind::PaymentReminder
            };
            if self.email_logs.has_sent(client.id, kind, due_date).await? {
                run.skipped += 1;
                continue;
            }

            let (subject, html) = render(&candidate, kind, due_date);
            let status = match self.sender.send(email, &subject, &html).await {
                Ok(()) => {
                    run.sent += 1;
                    EmailStatus::Sent
                }
                Err(e) => {
                    tracing::warn!(client_id = %client.id, error = %e, "Reminder email failed");
                    run.failed += 1;
                    EmailStatus::Failed
                }
            };
            // A lost log at worst means the email goes out again next run.
            if let Err(e) = self
                .email_logs
                .insert(client.id, kind, &subject, Some(due_date), status)
                .await
            {
                tracing::error!(client_id = %client.id, error = %e, "Failed to log reminder email");
            }
        }

        if run.sent + run.failed > 0 {
            tracing::info!(sent = run.sent, failed = run.failed, "Reminder run finished");
        }
        Ok(run)
    }
}

fn render(candidate: &ReminderCandidate, kind: EmailKind, due_date: NaiveDate) -> (String, String) {
    let client = &candidate.client;
    let debt = client.snapshot.current_debt_cents;
    match kind {
        EmailKind::PaymentReminder => {
            payment_reminder_email(&candidate.gym_name, &client.name, due_date, debt)
        }
        EmailKind::PaymentOverdue => {
            payment_overdue_email(&candidate.gym_name, &client.name, due_date, debt)
        }
    }
}
