use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::info;

use crate::config::AppConfig;

const CREATE_USERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id            BIGSERIAL PRIMARY KEY,
    password_hash VARCHAR(255) NOT NULL,
    email         VARCHAR(120) NOT NULL UNIQUE,
    first_name    VARCHAR(50)  NOT NULL,
    last_name     VARCHAR(50)  NOT NULL,
    created_at    TIMESTAMPTZ  NOT NULL DEFAULT now()
)
"#;

pub async fn connect(config: &AppConfig) -> anyhow::Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await
        .context("connect to database")
}

/// Creates the users table on first start; existing tables are left alone.
pub async fn ensure_schema(db: &PgPool) -> anyhow::Result<()> {
    sqlx::query(CREATE_USERS_TABLE)
        .execute(db)
        .await
        .context("create users table")?;
    info!("users table ready");
    Ok(())
}
