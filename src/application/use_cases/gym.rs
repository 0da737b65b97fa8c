use std::sync::Arc;

use async_trait::async_trait;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::{
        password::{hash_password, verify_password},
        validators::{MIN_PASSWORD_LEN, is_valid_email, is_valid_password},
    },
    domain::entities::gym::Gym,
};

pub const DUPLICATE_GYM_EMAIL: &str = "A gym with that email already exists";

#[async_trait]
pub trait GymRepoTrait: Send + Sync {
    /// Fails with `DUPLICATE_GYM_EMAIL` when the email is taken.
    async fn create(&self, name: &str, email: &str, password_hash: &str) -> AppResult<Gym>;
    async fn get_by_email(&self, email: &str) -> AppResult<Option<Gym>>;
    async fn get_by_id(&self, gym_id: Uuid) -> AppResult<Option<Gym>>;
}

#[derive(Clone)]
pub struct GymUseCases {
    repo: Arc<dyn GymRepoTrait>,
}

impl GymUseCases {
    pub fn new(repo: Arc<dyn GymRepoTrait>) -> Self {
        Self { repo }
    }

    #[instrument(skip(self, password))]
    pub async fn register(&self, name: &str, email: &str, password: &str) -> AppResult<Gym> {
        let name = name.trim();
        let email = email.trim().to_lowercase();
        if name.is_empty() || email.is_empty() || password.is_empty() {
            return Err(AppError::InvalidInput(
                "Missing fields: name, email, password".into(),
            ));
        }
        if !is_valid_email(&email) {
            return Err(AppError::InvalidInput("Invalid email address".into()));
        }
        if !is_valid_password(password) {
            return Err(AppError::InvalidInput(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        if self.repo.get_by_email(&email).await?.is_some() {
            return Err(AppError::InvalidInput(DUPLICATE_GYM_EMAIL.into()));
        }

        let password_hash = hash_password(password)?;
        let gym = self.repo.create(name, &email, &password_hash).await?;
        tracing::info!(gym_id = %gym.id, "Gym registered");
        Ok(gym)
    }

    /// Unknown email and wrong password are indistinguishable to the caller.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> AppResult<Gym> {
        let email = email.trim().to_lowercase();
        if email.is_empty() || password.is_empty() {
            return Err(AppError::InvalidInput(
                "Missing fields: email, password".into(),
            ));
        }

        let Some(gym) = self.repo.get_by_email(&email).await? else {
            return Err(AppError::InvalidCredentials);
        };
        if !verify_password(password, &gym.password_hash) {
            return Err(AppError::InvalidCredentials);
        }
        Ok(gym)
    }

    #[instrument(skip(self))]
    pub async fn profile(&self, gym_id: Uuid) -> AppResult<Gym> {
        self.repo
            .get_by_id(gym_id)
            .await?
            .ok_or(AppError::InvalidCredentials)
    }
}
