use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    adapters::persistence::{PostgresPersistence, client::CLIENT_COLUMNS},
    app_error::{AppError, AppResult},
    domain::entities::{client::Client, payment::Payment},
    use_cases::{
        client::{PaymentDraft, PaymentRepoTrait},
        payment::RecordedPayment,
    },
};

const PAYMENT_COLUMNS: &str = "id, seq, client_id, amount_cents, plan, discount_cents, debt_cents, \
     period_from, period_to, next_payment_date, idempotency_key, created_at";

#[async_trait]
impl PaymentRepoTrait for PostgresPersistence {
    async fn list_for_client(&self, client_id: Uuid) -> AppResult<Vec<Payment>> {
        sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments
             WHERE client_id = $1
             ORDER BY created_at DESC, seq DESC"
        ))
        .bind(client_id)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)
    }

    async fn list_for_clients(&self, client_ids: &[Uuid]) -> AppResult<Vec<Payment>> {
        sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments
             WHERE client_id = ANY($1)
             ORDER BY created_at DESC, seq DESC"
        ))
        .bind(client_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)
    }

    async fn record(
        &self,
        gym_id: Uuid,
        client_id: Uuid,
        idempotency_key: Option<&str>,
        draft: &PaymentDraft<'_>,
    ) -> AppResult<RecordedPayment> {
        let mut tx = self.pool.begin().await.map_err(AppError::from)?;

        // Serializes submissions for one client until commit.
        let client = sqlx::query_as::<_, Client>(&format!(
            "SELECT {CLIENT_COLUMNS} FROM clients WHERE id = $1 AND gym_id = $2 FOR UPDATE"
        ))
        .bind(client_id)
        .bind(gym_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(AppError::from)?
        .ok_or(AppError::NotFound)?;

        if let Some(key) = idempotency_key {
            let existing = sqlx::query_as::<_, Payment>(&format!(
                "SELECT {PAYMENT_COLUMNS} FROM payments
                 WHERE client_id = $1 AND idempotency_key = $2"
            ))
            .bind(client.id)
            .bind(key)
            .fetch_optional(&mut *tx)
            .await
            .map_err(AppError::from)?;
            if let Some(payment) = existing {
                tx.rollback().await.map_err(AppError::from)?;
                return Ok(RecordedPayment {
                    payment,
                    replayed: true,
                });
            }
        }

        let history = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments
             WHERE client_id = $1
             ORDER BY created_at DESC, seq DESC"
        ))
        .bind(client.id)
        .fetch_all(&mut *tx)
        .await
        .map_err(AppError::from)?;

        let (payment, snapshot) = draft(&client, &history)?;

        // Lock order, not transaction start.
        let inserted = sqlx::query_as::<_, Payment>(&format!(
            "INSERT INTO payments
                (id, client_id, amount_cents, plan, discount_cents, debt_cents,
                 period_from, period_to, next_payment_date, idempotency_key, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8, $9, clock_timestamp())
             ON CONFLICT (client_id, idempotency_key) DO NOTHING
             RETURNING {PAYMENT_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(client.id)
        .bind(payment.amount_cents)
        .bind(payment.plan.as_ref())
        .bind(payment.discount_cents)
        .bind(payment.debt_cents)
        .bind(payment.period_from)
        .bind(payment.period_to)
        .bind(&payment.idempotency_key)
        .fetch_optional(&mut *tx)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::Internal("Idempotency key raced past the client lock".into()))?;

        sqlx::query(
            "UPDATE clients
             SET current_plan = $2, current_debt_cents = $3, active_until = $4,
                 last_payment_date = $5, next_payment_date = $6
             WHERE id = $1",
        )
        .bind(client.id)
        .bind(&snapshot.current_plan)
        .bind(snapshot.current_debt_cents)
        .bind(snapshot.active_until)
        .bind(snapshot.last_payment_date)
        .bind(snapshot.next_payment_date)
        .execute(&mut *tx)
        .await
        .map_err(AppError::from)?;

        tx.commit().await.map_err(AppError::from)?;
        Ok(RecordedPayment {
            payment: inserted,
            replayed: false,
        })
    }
}
