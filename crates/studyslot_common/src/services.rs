// --- File: crates/studyslot_common/src/services.rs ---
//! Collaborator abstractions consumed by the booking core.
//!
//! The core only ever holds `Arc<dyn …>` of these traits, so storage engines, calendar
//! backends and notification channels can be swapped and faked in tests.

use crate::error::{CalendarError, StoreError};
use crate::models::{
    BookingEvent, BookingId, BookingRequest, BookingStatus, EventDraft, EventReference, Interval,
    NewBookingRequest, Participant, ParticipantId, SettingKey,
};
use async_trait::async_trait;
use chrono::DateTime;
use chrono_tz::Tz;

/// Storage of booking requests.
#[async_trait]
pub trait PersistenceStore: Send + Sync {
    /// Active (`pending`, `approved`, `confirmed`) requests whose slot overlaps `window`.
    async fn list_active_requests(&self, window: &Interval)
        -> Result<Vec<BookingRequest>, StoreError>;

    async fn get_request(&self, id: BookingId) -> Result<Option<BookingRequest>, StoreError>;

    /// All requests with the given status, oldest first. `None` lists everything.
    async fn list_requests(
        &self,
        status: Option<BookingStatus>,
    ) -> Result<Vec<BookingRequest>, StoreError>;

    async fn active_requests_for_participant(
        &self,
        participant_id: ParticipantId,
    ) -> Result<Vec<BookingRequest>, StoreError>;

    /// Stores a new `pending` request.
    ///
    /// Fails with [`StoreError::Conflict`] if an active request already holds the slot.
    async fn insert(&self, request: NewBookingRequest) -> Result<BookingRequest, StoreError>;

    /// Writes `request` if the stored version still equals `request.version`.
    ///
    /// Returns the stored request with its bumped version, or
    /// [`StoreError::ConcurrentModification`] when the version moved.
    async fn update(&self, request: &BookingRequest) -> Result<BookingRequest, StoreError>;
}

/// Storage of participants and their access tokens.
#[async_trait]
pub trait ParticipantStore: Send + Sync {
    /// Creates a participant with a freshly generated access token.
    async fn create_participant(&self, name: &str, email: &str)
        -> Result<Participant, StoreError>;

    async fn get_participant(&self, id: ParticipantId) -> Result<Option<Participant>, StoreError>;

    async fn find_by_token(&self, token: &str) -> Result<Option<Participant>, StoreError>;

    async fn list_participants(&self) -> Result<Vec<Participant>, StoreError>;

    async fn revoke_participant(&self, id: ParticipantId) -> Result<Participant, StoreError>;

    /// Returns `false` if there was nothing to delete.
    async fn delete_participant(&self, id: ParticipantId) -> Result<bool, StoreError>;
}

/// The calendar owner's real calendar.
#[async_trait]
pub trait ExternalCalendar: Send + Sync {
    /// Periods in `window` during which the owner is busy, sorted by start.
    async fn query_busy(&self, window: &Interval) -> Result<Vec<Interval>, CalendarError>;

    /// Creates the appointment; any non-success outcome is an error.
    async fn create_event(&self, draft: &EventDraft) -> Result<EventReference, CalendarError>;

    /// Removes an event. Deleting an event that no longer exists succeeds.
    async fn delete_event(&self, reference: &EventReference) -> Result<(), CalendarError>;

    /// The event an earlier `create_event` made for `booking_id`, if it exists.
    ///
    /// A create that timed out on our side may still have succeeded remotely.
    async fn find_event(
        &self,
        booking_id: BookingId,
    ) -> Result<Option<EventReference>, CalendarError>;
}

/// Administrator-editable texts.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// The stored value, `None` if it was never set.
    async fn get_setting(&self, key: SettingKey) -> Result<Option<String>, StoreError>;

    async fn put_setting(&self, key: SettingKey, value: &str) -> Result<(), StoreError>;
}

/// Receives domain events. Implementations must hand off and return immediately.
pub trait NotificationSink: Send + Sync {
    fn publish(&self, event: BookingEvent);
}

/// Source of "now" in the single operating timezone.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Tz>;

    fn time_zone(&self) -> Tz;
}
