use crate::models::{BookingId, BookingStatus, ParticipantId};
use chrono::{DateTime, Utc};
use std::fmt;
use thiserror::Error;

/// Every error the booking core returns to its calling layer.
///
/// Only `Configuration` is fatal; it is raised while the slot grid is built at startup.
/// All other variants are recoverable and tell the caller what to do next.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookingError {
    /// Invalid grid parameters
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The slot is past, booked, or blocked on the external calendar.
    /// The caller should re-render availability.
    #[error("Slot starting at {0} is not available")]
    SlotUnavailable(DateTime<Utc>),

    /// The request is not in a state that allows the operation (stale UI or duplicate action)
    #[error("Cannot move booking from {from} to {to}")]
    InvalidTransition {
        from: BookingStatus,
        to: BookingStatus,
    },

    /// Stale reference to a booking or participant
    #[error("Not found: {0}")]
    NotFound(String),

    /// The stored booking changed between read and write; retry the whole sequence.
    #[error("Booking {0} was modified concurrently")]
    ConcurrentModification(BookingId),

    /// The external calendar did not acknowledge the event. The approval is kept for retry.
    #[error("Calendar sync failed: {0}")]
    Sync(String),

    /// The selection is not a slot of the current grid.
    #[error("Invalid slot: {0}")]
    InvalidSlot(String),

    #[error("Participant {0} has been revoked")]
    ParticipantRevoked(ParticipantId),

    #[error("Participant {0} already holds an active booking")]
    ActiveBookingExists(ParticipantId),

    /// The busy-interval query failed, so availability cannot be decided.
    #[error("External calendar unavailable: {0}")]
    CalendarUnavailable(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

/// Errors raised by a [`crate::services::PersistenceStore`] or
/// [`crate::services::ParticipantStore`] implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Record {0} was modified concurrently")]
    ConcurrentModification(BookingId),

    #[error("Record not found: {0}")]
    NotFound(String),

    /// A uniqueness rule rejected the write (e.g. an active request already holds the slot).
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Backend error: {0}")]
    Backend(String),
}

/// Errors raised by an [`crate::services::ExternalCalendar`] implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CalendarError {
    #[error("Calendar request timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Calendar rejected the request: {0}")]
    Rejected(String),

    #[error("Calendar unreachable: {0}")]
    Unavailable(String),
}

impl From<StoreError> for BookingError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ConcurrentModification(id) => BookingError::ConcurrentModification(id),
            StoreError::NotFound(what) => BookingError::NotFound(what),
            StoreError::Conflict(msg) | StoreError::Backend(msg) => BookingError::Storage(msg),
        }
    }
}

/// Maps errors to HTTP status codes for the calling layer.
pub trait HttpStatusCode {
    fn status_code(&self) -> u16;
}

impl HttpStatusCode for BookingError {
    fn status_code(&self) -> u16 {
        match self {
            BookingError::Configuration(_) => 500,
            BookingError::SlotUnavailable(_) => 409,
            BookingError::InvalidTransition { .. } => 409,
            BookingError::NotFound(_) => 404,
            BookingError::ConcurrentModification(_) => 409,
            BookingError::Sync(_) => 502,
            BookingError::InvalidSlot(_) => 400,
            BookingError::ParticipantRevoked(_) => 403,
            BookingError::ActiveBookingExists(_) => 409,
            BookingError::CalendarUnavailable(_) => 503,
            BookingError::Storage(_) => 500,
        }
    }
}

pub fn configuration_error<T: fmt::Display>(message: T) -> BookingError {
    BookingError::Configuration(message.to_string())
}

pub fn not_found<T: fmt::Display>(message: T) -> BookingError {
    BookingError::NotFound(message.to_string())
}
