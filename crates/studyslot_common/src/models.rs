// --- File: crates/studyslot_common/src/models.rs ---
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type ParticipantId = i64;
pub type BookingId = i64;

/// A study participant reachable through a personal booking link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
    pub email: String,
    /// Access token embedded in the booking link.
    pub token: String,
    pub revoked: bool,
    pub created_at: DateTime<Utc>,
}

/// Half-open time range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Interval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Interval {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Two half-open ranges overlap when each starts before the other ends.
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// One bookable interval of the grid, identified by its start instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Slot {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Slot {
    pub fn interval(&self) -> Interval {
        Interval::new(self.start, self.end)
    }

    pub fn is_past(&self, now: DateTime<Utc>) -> bool {
        self.end <= now
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Approved,
    Rejected,
    Confirmed,
    Cancelled,
    Expired,
}

impl BookingStatus {
    pub const ACTIVE: [BookingStatus; 3] = [
        BookingStatus::Pending,
        BookingStatus::Approved,
        BookingStatus::Confirmed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Approved => "approved",
            BookingStatus::Rejected => "rejected",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Expired => "expired",
        }
    }

    /// Active requests hold their slot.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            BookingStatus::Pending | BookingStatus::Approved | BookingStatus::Confirmed
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BookingStatus::Confirmed
                | BookingStatus::Rejected
                | BookingStatus::Cancelled
                | BookingStatus::Expired
        )
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BookingStatus::Pending),
            "approved" => Ok(BookingStatus::Approved),
            "rejected" => Ok(BookingStatus::Rejected),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            "expired" => Ok(BookingStatus::Expired),
            other => Err(format!("unknown booking status: {other}")),
        }
    }
}

/// Opaque id of an event on the external calendar.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventReference(pub String);

impl fmt::Display for EventReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A participant's claim on one slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub id: BookingId,
    pub participant_id: ParticipantId,
    pub slot_start: DateTime<Utc>,
    pub slot_end: DateTime<Utc>,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
    pub decided_by: Option<String>,
    pub external_event: Option<EventReference>,
    /// Optimistic concurrency token, bumped by every stored update.
    pub version: i64,
}

impl BookingRequest {
    pub fn slot(&self) -> Slot {
        Slot {
            start: self.slot_start,
            end: self.slot_end,
        }
    }

    pub fn interval(&self) -> Interval {
        Interval::new(self.slot_start, self.slot_end)
    }
}

/// Values supplied when a request is first stored; the store assigns id and version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBookingRequest {
    pub participant_id: ParticipantId,
    pub slot: Slot,
    pub created_at: DateTime<Utc>,
}

/// What the external calendar needs to create the appointment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventDraft {
    pub slot: Slot,
    pub summary: String,
    pub description: String,
    pub attendee_email: String,
    /// Stable tag linking the external event back to the booking.
    pub booking_id: BookingId,
}

/// Texts the administrator can edit at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingKey {
    /// Invitation body; `{{name}}` and `{{link}}` are substituted.
    InvitationTemplate,
    /// HTML served as the consent form.
    ConsentHtml,
}

impl SettingKey {
    pub const ALL: [SettingKey; 2] = [SettingKey::InvitationTemplate, SettingKey::ConsentHtml];

    pub fn as_str(&self) -> &'static str {
        match self {
            SettingKey::InvitationTemplate => "invitation_template",
            SettingKey::ConsentHtml => "consent_html",
        }
    }

    /// Used until the administrator stores a value.
    pub fn default_value(&self) -> &'static str {
        match self {
            SettingKey::InvitationTemplate => {
                "Hi {{name}},\n\n\
                 Thank you for volunteering to participate in our user study!\n\n\
                 Please open your personal booking link and pick a time slot:\n\n\
                 {{link}}\n\n\
                 After you pick a slot, your request is reviewed by our team. Once approved, \
                 you will receive a calendar invitation with all study details."
            }
            SettingKey::ConsentHtml => {
                "<h2>Consent Form</h2><p>Please read this consent carefully before booking. \
                 You agree to participate voluntarily. Contact us with any questions.</p>"
            }
        }
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SettingKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SettingKey::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown setting: {s}"))
    }
}

/// Domain events emitted on every booking transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "booking")]
pub enum BookingEvent {
    BookingCreated(BookingRequest),
    BookingApproved(BookingRequest),
    BookingRejected(BookingRequest),
    BookingConfirmed(BookingRequest),
    BookingCancelled(BookingRequest),
    BookingExpired(BookingRequest),
    BookingReopened(BookingRequest),
    BookingSyncFailed(BookingRequest),
}

impl BookingEvent {
    pub fn request(&self) -> &BookingRequest {
        match self {
            BookingEvent::BookingCreated(r)
            | BookingEvent::BookingApproved(r)
            | BookingEvent::BookingRejected(r)
            | BookingEvent::BookingConfirmed(r)
            | BookingEvent::BookingCancelled(r)
            | BookingEvent::BookingExpired(r)
            | BookingEvent::BookingReopened(r)
            | BookingEvent::BookingSyncFailed(r) => r,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BookingEvent::BookingCreated(_) => "BookingCreated",
            BookingEvent::BookingApproved(_) => "BookingApproved",
            BookingEvent::BookingRejected(_) => "BookingRejected",
            BookingEvent::BookingConfirmed(_) => "BookingConfirmed",
            BookingEvent::BookingCancelled(_) => "BookingCancelled",
            BookingEvent::BookingExpired(_) => "BookingExpired",
            BookingEvent::BookingReopened(_) => "BookingReopened",
            BookingEvent::BookingSyncFailed(_) => "BookingSyncFailed",
        }
    }
}
