use anyhow::Context;
use sqlx::{migrate::MigrateError, postgres::PgPoolOptions, PgPool};

pub async fn connect(database_url: &str) -> anyhow::Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .context("connect to database")
}

/// Apply the embedded migrations in `./migrations`.
pub async fn migrate(db: &PgPool) -> Result<(), MigrateError> {
    sqlx::migrate!("./migrations").run(db).await
}
