use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    domain::entities::client::{Client, ClientDetails, ClientSnapshot},
    use_cases::client::{ClientRepoTrait, ReminderCandidate},
};

pub(super) const CLIENT_COLUMNS: &str = "id, gym_id, name, email, phone, address, address_number, \
     due_day, current_plan, current_debt_cents, active_until, last_payment_date, \
     next_payment_date, created_at";

#[derive(sqlx::FromRow)]
struct ReminderRow {
    #[sqlx(flatten)]
    client: Client,
    gym_name: String,
}

#[async_trait]
impl ClientRepoTrait for PostgresPersistence {
    async fn create(&self, gym_id: Uuid, details: &ClientDetails) -> AppResult<Client> {
        sqlx::query_as::<_, Client>(&format!(
            "INSERT INTO clients (id, gym_id, name, email, phone, address, address_number, due_day)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {CLIENT_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(gym_id)
        .bind(&details.name)
        .bind(&details.email)
        .bind(&details.phone)
        .bind(&details.address)
        .bind(&details.address_number)
        .bind(details.due_day)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)
    }

    async fn get(&self, gym_id: Uuid, client_id: Uuid) -> AppResult<Option<Client>> {
        sqlx::query_as::<_, Client>(&format!(
            "SELECT {CLIENT_COLUMNS} FROM clients WHERE id = $1 AND gym_id = $2"
        ))
        .bind(client_id)
        .bind(gym_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)
    }

    async fn list_by_gym(&self, gym_id: Uuid) -> AppResult<Vec<Client>> {
        sqlx::query_as::<_, Client>(&format!(
            "SELECT {CLIENT_COLUMNS} FROM clients WHERE gym_id = $1 ORDER BY created_at, id"
        ))
        .bind(gym_id)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)
    }

    async fn list_all(&self) -> AppResult<Vec<Client>> {
        sqlx::query_as::<_, Client>(&format!(
            "SELECT {CLIENT_COLUMNS} FROM clients ORDER BY created_at, id"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)
    }

    async fn update(
        &self,
        gym_id: Uuid,
        client_id: Uuid,
        details: &ClientDetails,
    ) -> AppResult<Option<Client>> {
        sqlx::query_as::<_, Client>(&format!(
            "UPDATE clients
             SET name = $3, email = $4, phone = $5, address = $6, address_number = $7, due_day = $8
             WHERE id = $1 AND gym_id = $2
             RETURNING {CLIENT_COLUMNS}"
        ))
        .bind(client_id)
        .bind(gym_id)
        .bind(&details.name)
        .bind(&details.email)
        .bind(&details.phone)
        .bind(&details.address)
        .bind(&details.address_number)
        .bind(details.due_day)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)
    }

    async fn delete(&self, gym_id: Uuid, client_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM clients WHERE id = $1 AND gym_id = $2")
            .bind(client_id)
            .bind(gym_id)
            .execute(&self.pool)
            .await
            .map_err(AppError::from)?;
        Ok(result.rows_affected() > 0)
    }

    async fn overwrite_snapshot(
        &self,
        client_id: Uuid,
        snapshot: &ClientSnapshot,
    ) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE clients
             SET current_plan = $2, current_debt_cents = $3, active_until = $4,
                 last_payment_date = $5, next_payment_date = $6
             WHERE id = $1",
        )
        .bind(client_id)
        .bind(&snapshot.current_plan)
        .bind(snapshot.current_debt_cents)
        .bind(snapshot.active_until)
        .bind(snapshot.last_payment_date)
        .bind(snapshot.next_payment_date)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    async fn list_reminder_candidates(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> AppResult<Vec<ReminderCandidate>> {
        let rows = sqlx::query_as::<_, ReminderRow>(
            "SELECT c.id, c.gym_id, c.name, c.email, c.phone, c.address, c.address_number,
                    c.due_day, c.current_plan, c.current_debt_cents, c.active_until,
                    c.last_payment_date, c.next_payment_date, c.created_at,
                    g.name AS gym_name
             FROM clients c
             JOIN gyms g ON g.id = c.gym_id
             WHERE c.next_payment_date BETWEEN $1 AND $2
             ORDER BY c.next_payment_date, c.id",
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(rows
            .into_iter()
            .map(|r| ReminderCandidate {
                client: r.client,
                gym_name: r.gym_name,
            })
            .collect())
    }
}
