// --- File: crates/studyslot_gcal/src/lib.rs ---
pub mod auth;
#[cfg(test)]
mod auth_test;
pub mod calendar;

pub use auth::{create_calendar_hub, GcalSetupError, HubType};
pub use calendar::GoogleCalendar;
