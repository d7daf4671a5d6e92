// --- File: crates/studyslot_booking/src/lib.rs ---
// Declare modules within this crate
pub mod availability;
#[cfg(test)]
mod availability_proptest;
pub mod calendar;
pub mod clock;
pub mod dispatcher;
pub mod grid;
#[cfg(test)]
mod grid_test;
pub mod locks;
pub mod machine;
pub mod memory;
pub mod notify;
pub mod service;

pub use availability::{AvailabilityResolver, AvailabilitySnapshot, DayAvailability, SlotState};
pub use calendar::InMemoryCalendar;
pub use clock::{ManualClock, SystemClock};
pub use dispatcher::SyncDispatcher;
pub use grid::{Schedule, SlotGrid};
pub use locks::KeyedLocks;
pub use memory::InMemoryStore;
pub use notify::{ChannelNotificationSink, EventHandler, RecordingSink, TracingSink};
pub use service::{BookingDeps, BookingOptions, BookingService, Decision, DecisionOutcome};
