// --- File: crates/studyslot_booking/src/dispatcher.rs ---
//! Creates the external calendar event for an approved request and confirms it.

use crate::machine::{self, Transition};
use std::sync::Arc;
use std::time::Duration as StdDuration;
use studyslot_common::{
    BookingError, BookingEvent, BookingId, BookingRequest, BookingStatus, CalendarError,
    EventDraft, EventReference, ExternalCalendar, NotificationSink, Participant,
    ParticipantStore, PersistenceStore,
};
use tracing::{error, info, warn};

pub struct SyncDispatcher {
    store: Arc<dyn PersistenceStore>,
    participants: Arc<dyn ParticipantStore>,
    calendar: Arc<dyn ExternalCalendar>,
    sink: Arc<dyn NotificationSink>,
    timeout: StdDuration,
    event_summary: String,
    consent_url: Option<String>,
}

impl SyncDispatcher {
    pub fn new(
        store: Arc<dyn PersistenceStore>,
        participants: Arc<dyn ParticipantStore>,
        calendar: Arc<dyn ExternalCalendar>,
        sink: Arc<dyn NotificationSink>,
        timeout: StdDuration,
        event_summary: impl Into<String>,
        consent_url: Option<String>,
    ) -> Self {
        Self {
            store,
            participants,
            calendar,
            sink,
            timeout,
            event_summary: event_summary.into(),
            consent_url,
        }
    }

    pub fn draft(&self, request: &BookingRequest, participant: &Participant) -> EventDraft {
        let mut description = format!("Participant: {} <{}>\n", participant.name, participant.email);
        if let Some(url) = &self.consent_url {
            description.push_str(&format!("Consent: {url}\n"));
        }
        description.push_str(&format!(
            "Booking: #{}\n\nStatus: CONFIRMED by admin",
            request.id
        ));

        EventDraft {
            slot: request.slot(),
            summary: format!("{} — {}", self.event_summary, participant.name),
            description,
            attendee_email: participant.email.clone(),
            booking_id: request.id,
        }
    }

    /// The event a previous attempt already created for `booking_id`.
    pub async fn find_existing(
        &self,
        booking_id: BookingId,
    ) -> Result<Option<EventReference>, CalendarError> {
        tokio::time::timeout(self.timeout, self.calendar.find_event(booking_id))
            .await
            .unwrap_or(Err(CalendarError::Timeout(self.timeout)))
    }

    /// Creates the external event for an `approved` request and moves it to `confirmed`.
    ///
    /// An event already tagged with the request is adopted instead of creating a second
    /// one. On any calendar failure, including the timeout, the request stays `approved`
    /// and a [`BookingError::Sync`] is returned for a later retry. The caller must hold
    /// the slot's lock.
    pub async fn sync_confirm(
        &self,
        request: &BookingRequest,
    ) -> Result<BookingRequest, BookingError> {
        let existing = match self.find_existing(request.id).await {
            Ok(existing) => existing,
            Err(e) => return Err(self.sync_failed(request, e)),
        };
        self.confirm(request, existing).await
    }

    /// Confirms with `existing` if given, otherwise creates the event first.
    pub async fn confirm(
        &self,
        request: &BookingRequest,
        existing: Option<EventReference>,
    ) -> Result<BookingRequest, BookingError> {
        if request.status != BookingStatus::Approved {
            return Err(BookingError::InvalidTransition {
                from: request.status,
                to: BookingStatus::Confirmed,
            });
        }

        let reference = match existing {
            Some(reference) => {
                info!(
                    "Booking {} already has calendar event {}, adopting it",
                    request.id, reference
                );
                reference
            }
            None => {
                let participant = self
                    .participants
                    .get_participant(request.participant_id)
                    .await?
                    .ok_or_else(|| {
                        BookingError::NotFound(format!("participant {}", request.participant_id))
                    })?;
                let draft = self.draft(request, &participant);
                match self.create_event(&draft).await {
                    Ok(reference) => reference,
                    Err(e) => return Err(self.sync_failed(request, e)),
                }
            }
        };

        let transition = Transition::Confirm {
            event: reference.clone(),
        };
        let mut confirmed = request.clone();
        machine::apply(&mut confirmed, &transition)?;

        match self.store.update(&confirmed).await {
            Ok(stored) => {
                info!(
                    "Booking {} confirmed as calendar event {}",
                    stored.id, reference
                );
                self.sink.publish(transition.event(stored.clone()));
                Ok(stored)
            }
            Err(e) => {
                // The event exists but the booking could not say so: take the event back.
                error!(
                    "Recording confirmation of booking {} failed: {}; removing event {}",
                    request.id, e, reference
                );
                self.remove_event(&reference).await;
                Err(e.into())
            }
        }
    }

    /// Removes any event created for `booking_id` by an attempt that reported failure.
    pub async fn release(&self, booking_id: BookingId) {
        match self.find_existing(booking_id).await {
            Ok(Some(reference)) => {
                info!(
                    "Removing calendar event {} of booking {}",
                    reference, booking_id
                );
                self.remove_event(&reference).await;
            }
            Ok(None) => {}
            Err(e) => warn!(
                "Could not look up a calendar event for booking {}: {}",
                booking_id, e
            ),
        }
    }

    fn sync_failed(&self, request: &BookingRequest, e: CalendarError) -> BookingError {
        warn!(
            "Calendar sync for booking {} failed, keeping it approved: {}",
            request.id, e
        );
        self.sink.publish(BookingEvent::BookingSyncFailed(request.clone()));
        BookingError::Sync(e.to_string())
    }

    async fn create_event(&self, draft: &EventDraft) -> Result<EventReference, CalendarError> {
        tokio::time::timeout(self.timeout, self.calendar.create_event(draft))
            .await
            .unwrap_or(Err(CalendarError::Timeout(self.timeout)))
    }

    async fn remove_event(&self, reference: &EventReference) {
        let result = tokio::time::timeout(self.timeout, self.calendar.delete_event(reference))
            .await
            .unwrap_or(Err(CalendarError::Timeout(self.timeout)));
        if let Err(e) = result {
            error!(
                "Calendar event {} is orphaned and must be removed by hand: {}",
                reference, e
            );
        }
    }
}
