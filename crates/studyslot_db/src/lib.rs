//! SQLite persistence for bookings, participants and settings.
//!
//! The stores share one [`DbClient`]; call [`DbClient::init_schema`] once at startup.
//!
//! ```rust,no_run
//! use studyslot_db::{DbClient, SqlBookingStore};
//!
//! async fn setup() -> Result<SqlBookingStore, Box<dyn std::error::Error>> {
//!     let client = DbClient::connect("sqlite://study.db?mode=rwc", 5).await?;
//!     client.init_schema().await?;
//!     Ok(SqlBookingStore::new(client))
//! }
//! ```

pub mod client;
pub mod error;
pub mod repositories;

pub use client::DbClient;
pub use error::DbError;
pub use repositories::{SqlBookingStore, SqlParticipantStore, SqlSettingsStore};
