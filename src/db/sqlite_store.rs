use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};
use tracing::{error, info};

use crate::db::KeyValueStore;
use crate::errors::AppError;

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens `database_url` and applies the bundled migrations.
    pub async fn connect(database_url: &str) -> Result<Self, AppError> {
        // An in-memory database only lives as long as its connection.
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(AppError::DatabaseConnectionFailed)?;

        sqlx::migrate!("./migrations").run(&pool).await.map_err(|e| {
            error!("Failed to run database migrations: {e}");
            AppError::Unexpected(format!("Failed to run database migrations: {e}"))
        })?;

        info!("Key-value store ready at {database_url}");
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        let row = sqlx::query("SELECT value FROM kv_store WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to read key {key}: {e}");
                AppError::db_query(format!("Failed to read key {key}"), e)
            })?;

        row.map(|r| {
            r.try_get::<String, _>("value")
                .map_err(|e| AppError::db_query("Failed to read value", e))
        })
        .transpose()
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO kv_store (key, value) VALUES ($1, $2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to write key {key}: {e}");
            AppError::db_query(format!("Failed to write key {key}"), e)
        })?;
        Ok(())
    }
}
