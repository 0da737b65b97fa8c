use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    domain::entities::gym::Gym,
    use_cases::gym::{DUPLICATE_GYM_EMAIL, GymRepoTrait},
};

const GYM_COLUMNS: &str = "id, name, email, password_hash, created_at";
const GYMS_EMAIL_KEY: &str = "gyms_email_key";

#[async_trait]
impl GymRepoTrait for PostgresPersistence {
    async fn create(&self, name: &str, email: &str, password_hash: &str) -> AppResult<Gym> {
        sqlx::query_as::<_, Gym>(&format!(
            "INSERT INTO gyms (id, name, email, password_hash)
             VALUES ($1, $2, $3, $4)
             RETURNING {GYM_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(create_error)
    }

    async fn get_by_email(&self, email: &str) -> AppResult<Option<Gym>> {
        sqlx::query_as::<_, Gym>(&format!("SELECT {GYM_COLUMNS} FROM gyms WHERE email = $1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from)
    }

    async fn get_by_id(&self, gym_id: Uuid) -> AppResult<Option<Gym>> {
        sqlx::query_as::<_, Gym>(&format!("SELECT {GYM_COLUMNS} FROM gyms WHERE id = $1"))
            .bind(gym_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from)
    }
}

/// A registration that lost the race for its email gets the same answer as
/// one caught by the lookup.
fn create_error(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db_err)
            if db_err.is_unique_violation() && db_err.constraint() == Some(GYMS_EMAIL_KEY) =>
        {
            AppError::InvalidInput(DUPLICATE_GYM_EMAIL.into())
        }
        _ => AppError::from(err),
    }
}
