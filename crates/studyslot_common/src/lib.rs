// --- File: crates/studyslot_common/src/lib.rs ---

pub mod error; // Error taxonomy
pub mod logging; // Logging utilities
pub mod models; // Domain model and events
pub mod services; // Collaborator traits

pub use error::{
    configuration_error, not_found, BookingError, CalendarError, HttpStatusCode, StoreError,
};

pub use logging::{init, init_with_level, log_error, log_result};

pub use models::{
    BookingEvent, BookingId, BookingRequest, BookingStatus, EventDraft, EventReference, Interval,
    NewBookingRequest, Participant, ParticipantId, SettingKey, Slot,
};

pub use services::{
    Clock, ExternalCalendar, NotificationSink, ParticipantStore, PersistenceStore, SettingsStore,
};
