//! Connection pool for the booking database.

use crate::error::DbError;
use sqlx::pool::PoolOptions;
use sqlx::Pool;
use std::str::FromStr;
use std::time::Duration;
use studyslot_config::{AppConfig, DatabaseConfig};
use tracing::{debug, error, info};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS participants (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        email TEXT NOT NULL,
        token TEXT NOT NULL UNIQUE,
        revoked INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS bookings (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        participant_id INTEGER NOT NULL,
        slot_start TEXT NOT NULL,
        slot_end TEXT NOT NULL,
        status TEXT NOT NULL,
        created_at TEXT NOT NULL,
        decided_at TEXT,
        decided_by TEXT,
        external_event_id TEXT,
        version INTEGER NOT NULL DEFAULT 0
    )
    "#,
    // One active request per slot, also across processes
    r#"
    CREATE UNIQUE INDEX IF NOT EXISTS bookings_active_slot
        ON bookings (slot_start)
        WHERE status IN ('pending', 'approved', 'confirmed')
    "#,
    "CREATE INDEX IF NOT EXISTS bookings_status ON bookings (status)",
    "CREATE TABLE IF NOT EXISTS settings (k TEXT PRIMARY KEY, v TEXT NOT NULL)",
    "CREATE INDEX IF NOT EXISTS bookings_participant ON bookings (participant_id)",
];

#[derive(Debug, Clone)]
pub struct DbClient {
    pool: Pool<sqlx::Any>,
}

impl DbClient {
    /// Connects using the `[database]` section of the configuration.
    pub async fn new(config: &AppConfig) -> Result<Self, DbError> {
        let db_config = config
            .database
            .as_ref()
            .ok_or_else(|| DbError::ConfigError("Database configuration is missing".to_string()))?;
        Self::from_config(db_config).await
    }

    pub async fn from_config(db_config: &DatabaseConfig) -> Result<Self, DbError> {
        Self::connect(&db_config.url, db_config.max_connections).await
    }

    /// In-memory SQLite databases exist per connection, so pass `max_connections = 1` for them.
    pub async fn connect(db_url: &str, max_connections: u32) -> Result<Self, DbError> {
        if db_url.is_empty() {
            return Err(DbError::ConfigError("Database URL is empty".to_string()));
        }
        debug!("Creating database pool with URL: {}", db_url);
        sqlx::any::install_default_drivers();

        let pool = PoolOptions::new()
            .max_connections(max_connections.max(1))
            .acquire_timeout(Duration::from_secs(3))
            .idle_timeout(Duration::from_secs(600))
            .connect_with(sqlx::any::AnyConnectOptions::from_str(db_url)?)
            .await
            .map_err(|e| {
                error!("Failed to create database pool: {}", e);
                DbError::PoolError(e.to_string())
            })?;

        info!("Database pool created successfully");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<sqlx::Any> {
        &self.pool
    }

    /// Creates tables and indexes if they do not exist yet.
    pub async fn init_schema(&self) -> Result<(), DbError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    error!("Failed to initialize schema: {}", e);
                    DbError::QueryError(e.to_string())
                })?;
        }
        info!("Booking schema initialized successfully");
        Ok(())
    }

    pub async fn is_healthy(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

impl std::fmt::Display for DbClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DbClient")
    }
}
