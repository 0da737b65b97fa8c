use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    domain::entities::email_log::{EmailKind, EmailLog, EmailStatus},
    use_cases::client::EmailLogRepoTrait,
};

const EMAIL_LOG_COLUMNS: &str = "id, client_id, sent_at, type, subject, due_date, status";

#[async_trait]
impl EmailLogRepoTrait for PostgresPersistence {
    async fn list_for_client(&self, client_id: Uuid) -> AppResult<Vec<EmailLog>> {
        sqlx::query_as::<_, EmailLog>(&format!(
            "SELECT {EMAIL_LOG_COLUMNS} FROM email_logs
             WHERE client_id = $1
             ORDER BY sent_at DESC"
        ))
        .bind(client_id)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)
    }

    async fn has_sent(
        &self,
        client_id: Uuid,
        kind: EmailKind,
        due_date: NaiveDate,
    ) -> AppResult<bool> {
        let sent = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (
                 SELECT 1 FROM email_logs
                 WHERE client_id = $1 AND type = $2 AND due_date = $3 AND status = $4
             )",
        )
        .bind(client_id)
        .bind(kind.as_ref())
        .bind(due_date)
        .bind(EmailStatus::Sent.as_ref())
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(sent)
    }

    async fn insert(
        &self,
        client_id: Uuid,
        kind: EmailKind,
        subject: &str,
        due_date: Option<NaiveDate>,
        status: EmailStatus,
    ) -> AppResult<EmailLog> {
        sqlx::query_as::<_, EmailLog>(&format!(
            "INSERT INTO email_logs (id, client_id, type, subject, due_date, status)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {EMAIL_LOG_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(client_id)
        .bind(kind.as_ref())
        .bind(subject)
        .bind(due_date)
        .bind(status.as_ref())
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)
    }
}
