use thiserror::Error;

/// Errors that can occur during application startup.
///
/// Display messages are safe for logs. Debug output includes the `#[source]`
/// chain, which may contain connection strings; log with `%e`, not `?e`.
#[derive(Error, Debug)]
pub enum InfraError {
    #[error("Database connection failed. Check DATABASE_URL and ensure the database is running.")]
    DatabaseConnection(#[source] sqlx::Error),

    #[error("Redis connection failed. Check REDIS_URL and credentials.")]
    RedisConnection(#[source] redis::RedisError),

    #[error("HTTP client initialization failed")]
    HttpClient(#[source] reqwest::Error),
}
