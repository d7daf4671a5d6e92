// --- File: crates/services/studyslot_backend/src/messages.rs ---
//! Participant-facing messages. Delivery is out of scope: composed messages are logged.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use std::error::Error;
use std::sync::Arc;
use studyslot_booking::EventHandler;
use studyslot_common::{BookingEvent, BookingRequest, Participant, ParticipantStore};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Composes messages with times rendered in the operating timezone.
#[derive(Debug, Clone)]
pub struct MessageComposer {
    time_zone: Tz,
    from_address: String,
    host_base: String,
}

impl MessageComposer {
    pub fn new(time_zone: Tz, from_address: impl Into<String>, host_base: impl Into<String>) -> Self {
        Self {
            time_zone,
            from_address: from_address.into(),
            host_base: host_base.into(),
        }
    }

    pub fn booking_link(&self, participant: &Participant) -> String {
        format!(
            "{}/invite/{}",
            self.host_base.trim_end_matches('/'),
            participant.token
        )
    }

    /// "Mon May 5, 2:00 PM – 3:00 PM (America/Toronto time)"
    pub fn when(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> String {
        let start = start.with_timezone(&self.time_zone);
        let end = end.with_timezone(&self.time_zone);
        format!(
            "{} – {} ({} time)",
            start.format("%a %b %-d, %-I:%M %p"),
            end.format("%-I:%M %p"),
            self.time_zone.name()
        )
    }

    fn message(&self, participant: &Participant, subject: &str, body: String) -> Message {
        Message {
            from: self.from_address.clone(),
            to: format!("{} <{}>", participant.name, participant.email),
            subject: subject.to_string(),
            body,
        }
    }

    pub fn consent_url(&self) -> String {
        format!("{}/api/consent", self.host_base.trim_end_matches('/'))
    }

    /// Fills `{{name}}` and `{{link}}` in the administrator's `template` and points to
    /// the consent form.
    pub fn invitation(&self, participant: &Participant, template: &str) -> Message {
        let body = format!(
            "{}\n\nPlease review the consent form before booking: {}",
            template
                .replace("{{name}}", &participant.name)
                .replace("{{link}}", &self.booking_link(participant)),
            self.consent_url()
        );
        self.message(participant, "User Study Invitation - Pick Your Time Slot", body)
    }

    /// The message for `event`, if the participant should hear about it.
    pub fn for_event(&self, event: &BookingEvent, participant: &Participant) -> Option<Message> {
        let request: &BookingRequest = event.request();
        let when = self.when(request.slot_start, request.slot_end);
        let (subject, body) = match event {
            BookingEvent::BookingCreated(_) => (
                "User Study Booking Request Received",
                format!(
                    "Hi {},\n\nWe received your request for\n\n{}\n\n\
                     Our team will review it shortly.",
                    participant.name, when
                ),
            ),
            BookingEvent::BookingConfirmed(_) => (
                "User Study Booking CONFIRMED - Calendar Invite Coming Soon",
                format!(
                    "Hi {},\n\nGreat news! Your user study booking has been CONFIRMED.\n\n\
                     CONFIRMED APPOINTMENT:\n{}\n\n\
                     You will receive a calendar invitation shortly with all study details, \
                     including location or meeting link.\n\n\
                     Thank you for participating in our research!",
                    participant.name, when
                ),
            ),
            BookingEvent::BookingRejected(_) => (
                "User Study Booking Not Accepted",
                format!(
                    "Hi {},\n\nUnfortunately we cannot accept your request for\n\n{}\n\n\
                     Please pick another time slot using your booking link:\n{}",
                    participant.name,
                    when,
                    self.booking_link(participant)
                ),
            ),
            BookingEvent::BookingExpired(_) => (
                "User Study Booking Request Expired",
                format!(
                    "Hi {},\n\nYour request for\n\n{}\n\nexpired before it could be reviewed. \
                     Please pick a new time slot:\n{}",
                    participant.name,
                    when,
                    self.booking_link(participant)
                ),
            ),
            BookingEvent::BookingCancelled(_) => (
                "User Study Booking Cancelled",
                format!(
                    "Hi {},\n\nYour booking for\n\n{}\n\nhas been cancelled.",
                    participant.name, when
                ),
            ),
            // Internal transitions
            BookingEvent::BookingApproved(_)
            | BookingEvent::BookingReopened(_)
            | BookingEvent::BookingSyncFailed(_) => return None,
        };
        Some(self.message(participant, subject, body))
    }
}

/// Event handler composing a participant message per booking event and logging it.
pub struct ParticipantNotifier {
    composer: MessageComposer,
    participants: Arc<dyn ParticipantStore>,
}

impl ParticipantNotifier {
    pub fn new(composer: MessageComposer, participants: Arc<dyn ParticipantStore>) -> Self {
        Self {
            composer,
            participants,
        }
    }
}

#[async_trait]
impl EventHandler for ParticipantNotifier {
    async fn handle(&self, event: BookingEvent) -> Result<(), Box<dyn Error + Send + Sync>> {
        let request = event.request();
        let participant = self
            .participants
            .get_participant(request.participant_id)
            .await?
            .ok_or_else(|| format!("participant {} not found", request.participant_id))?;

        match self.composer.for_event(&event, &participant) {
            Some(message) => info!(
                to = %message.to,
                subject = %message.subject,
                "Outgoing message:\n{}",
                message.body
            ),
            None => debug!("{} for booking {} needs no message", event.name(), request.id),
        }
        Ok(())
    }
}
