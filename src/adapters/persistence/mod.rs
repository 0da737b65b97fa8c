use sqlx::PgPool;

use crate::app_error::AppError;

pub mod client;
pub mod email_log;
pub mod gym;
pub mod payment;

#[derive(Clone)]
pub struct PostgresPersistence {
    pool: PgPool,
}

impl PostgresPersistence {
    pub fn new(pool: PgPool) -> Self {
        PostgresPersistence { pool }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => AppError::NotFound,
            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();
                if msg.contains("duplicate key") || msg.contains("unique constraint") {
                    AppError::InvalidInput("A record with this value already exists".into())
                } else if msg.contains("foreign key") {
                    AppError::InvalidInput("Referenced record not found".into())
                } else if msg.contains("violates check constraint") {
                    AppError::InvalidInput("Value out of range".into())
                } else {
                    // Details stay in the logs.
                    tracing::error!(error = ?err, "Database error");
                    AppError::Database("Database operation failed".into())
                }
            }
            _ => {
                tracing::error!(error = ?err, "Database error");
                AppError::Database("Database operation failed".into())
            }
        }
    }
}
