use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A tenant account. Every client belongs to exactly one gym.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Gym {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    /// Argon2 PHC string, never serialized.
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}
