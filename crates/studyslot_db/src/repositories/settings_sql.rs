//! SQL implementation of [`SettingsStore`].

use crate::error::DbError;
use crate::DbClient;
use async_trait::async_trait;
use sqlx::Row;
use studyslot_common::{SettingKey, SettingsStore, StoreError};
use tracing::{error, info};

#[derive(Debug, Clone)]
pub struct SqlSettingsStore {
    db_client: DbClient,
}

impl SqlSettingsStore {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }
}

#[async_trait]
impl SettingsStore for SqlSettingsStore {
    async fn get_setting(&self, key: SettingKey) -> Result<Option<String>, StoreError> {
        let row = sqlx::query("SELECT v FROM settings WHERE k = $1")
            .bind(key.as_str())
            .fetch_optional(self.db_client.pool())
            .await
            .map_err(|e| DbError::QueryError(e.to_string()))?;
        row.map(|r| r.try_get::<String, _>("v"))
            .transpose()
            .map_err(|e| DbError::DecodeError(e.to_string()).into())
    }

    async fn put_setting(&self, key: SettingKey, value: &str) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO settings (k, v) VALUES ($1, $2) \
             ON CONFLICT (k) DO UPDATE SET v = excluded.v",
        )
        .bind(key.as_str())
        .bind(value)
        .execute(self.db_client.pool())
        .await
        .map_err(|e| {
            error!("Failed to store setting {}: {}", key, e);
            DbError::QueryError(e.to_string())
        })?;
        info!("Setting {} updated", key);
        Ok(())
    }
}
