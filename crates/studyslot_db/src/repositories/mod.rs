pub mod booking_sql;
#[cfg(test)]
mod booking_sql_test;
mod codec;
pub mod participant_sql;
#[cfg(test)]
mod participant_sql_test;
pub mod settings_sql;

pub use booking_sql::SqlBookingStore;
pub use participant_sql::SqlParticipantStore;
pub use settings_sql::SqlSettingsStore;
