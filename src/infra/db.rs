use sqlx::{PgPool, postgres::PgPoolOptions};
use tracing::info;

use crate::infra::InfraError;

pub async fn init_db(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
        .map_err(InfraError::DatabaseConnection)?;

    info!("Connected to database!");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Database migration failed: {e}"))?;

    info!("Migrations applied");
    Ok(pool)
}
