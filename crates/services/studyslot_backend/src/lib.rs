// --- File: crates/services/studyslot_backend/src/lib.rs ---
pub mod app_state;
pub mod auth;
pub mod error;
pub mod handlers;
pub mod messages;
#[cfg(test)]
mod messages_test;
pub mod routes;
pub mod startup;

pub use app_state::AppState;
pub use routes::{app, routes};
pub use startup::{build_state, spawn_expiry_sweeper, StartupError};
