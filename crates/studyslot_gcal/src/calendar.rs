// --- File: crates/studyslot_gcal/src/calendar.rs ---
//! [`ExternalCalendar`] backed by the Google Calendar API.

use crate::auth::HubType;
use async_trait::async_trait;
use chrono_tz::Tz;
use google_calendar3::api::{
    Event, EventAttendee, EventDateTime, EventExtendedProperties, Events, FreeBusyRequest,
    FreeBusyRequestItem, FreeBusyResponse,
};
use std::collections::HashMap;
use std::sync::Arc;
use studyslot_common::{
    BookingId, CalendarError, EventDraft, EventReference, ExternalCalendar, Interval,
};
use tracing::{debug, info, warn};

/// Private extended property linking an event back to its booking.
pub const BOOKING_ID_PROPERTY: &str = "studyslot_booking_id";

pub struct GoogleCalendar {
    hub: Arc<HubType>,
    calendar_id: String,
    time_zone: Tz,
}

impl GoogleCalendar {
    pub fn new(hub: Arc<HubType>, calendar_id: impl Into<String>, time_zone: Tz) -> Self {
        Self {
            hub,
            calendar_id: calendar_id.into(),
            time_zone,
        }
    }
}

/// The event sent to Google for `draft`. The participant is invited as attendee.
pub fn build_event(draft: &EventDraft, time_zone: Tz) -> Event {
    let at = |instant| EventDateTime {
        date_time: Some(instant),
        time_zone: Some(time_zone.name().to_string()),
        ..Default::default()
    };
    Event {
        summary: Some(draft.summary.clone()),
        description: Some(draft.description.clone()),
        start: Some(at(draft.slot.start)),
        end: Some(at(draft.slot.end)),
        attendees: Some(vec![EventAttendee {
            email: Some(draft.attendee_email.clone()),
            ..Default::default()
        }]),
        extended_properties: Some(EventExtendedProperties {
            private: Some(HashMap::from([(
                BOOKING_ID_PROPERTY.to_string(),
                draft.booking_id.to_string(),
            )])),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// `privateExtendedProperty` filter matching the events of one booking.
pub fn booking_filter(booking_id: BookingId) -> String {
    format!("{BOOKING_ID_PROPERTY}={booking_id}")
}

/// The first live event of a listing. Cancelled events do not count.
pub fn first_live_event(events: Events) -> Option<EventReference> {
    events
        .items
        .unwrap_or_default()
        .into_iter()
        .filter(|e| e.status.as_deref() != Some("cancelled"))
        .find_map(|e| e.id)
        .map(EventReference)
}

/// Busy periods of `calendar_id`, sorted by start.
///
/// A calendar reported with errors (unknown id, no access) is unavailable, not free.
pub fn busy_periods(
    response: FreeBusyResponse,
    calendar_id: &str,
) -> Result<Vec<Interval>, CalendarError> {
    let calendar = response
        .calendars
        .and_then(|mut calendars| calendars.remove(calendar_id))
        .ok_or_else(|| {
            CalendarError::Unavailable(format!("no free/busy data for calendar {calendar_id}"))
        })?;

    if let Some(errors) = calendar.errors.filter(|e| !e.is_empty()) {
        return Err(CalendarError::Unavailable(format!(
            "free/busy query for {calendar_id} failed: {errors:?}"
        )));
    }

    let mut busy = Vec::new();
    for period in calendar.busy.unwrap_or_default() {
        match (period.start, period.end) {
            (Some(start), Some(end)) => busy.push(Interval::new(start, end)),
            _ => warn!("Skipping busy period with missing start/end: {:?}", period),
        }
    }
    busy.sort_by_key(|i| i.start);
    Ok(busy)
}

/// Auth and validation failures will not go away on retry; anything else might.
pub fn classify_api_error(message: String) -> CalendarError {
    if ["400", "401", "403"].iter().any(|code| message.contains(code)) {
        CalendarError::Rejected(message)
    } else {
        CalendarError::Unavailable(message)
    }
}

#[async_trait]
impl ExternalCalendar for GoogleCalendar {
    async fn query_busy(&self, window: &Interval) -> Result<Vec<Interval>, CalendarError> {
        let req = FreeBusyRequest {
            time_min: Some(window.start),
            time_max: Some(window.end),
            time_zone: Some("UTC".to_string()),
            items: Some(vec![FreeBusyRequestItem {
                id: Some(self.calendar_id.clone()),
                ..Default::default()
            }]),
            ..Default::default()
        };

        let (_response, freebusy) = self
            .hub
            .freebusy()
            .query(req)
            .doit()
            .await
            .map_err(|e| classify_api_error(e.to_string()))?;

        let busy = busy_periods(freebusy, &self.calendar_id)?;
        debug!(
            "{} busy periods between {} and {}",
            busy.len(),
            window.start,
            window.end
        );
        Ok(busy)
    }

    async fn create_event(&self, draft: &EventDraft) -> Result<EventReference, CalendarError> {
        let event = build_event(draft, self.time_zone);

        let (_response, created) = self
            .hub
            .events()
            .insert(event, &self.calendar_id)
            .send_updates("all")
            .doit()
            .await
            .map_err(|e| classify_api_error(e.to_string()))?;

        let id = created.id.ok_or_else(|| {
            CalendarError::Rejected("Google returned an event without id".to_string())
        })?;
        info!("Created calendar event {} for booking {}", id, draft.booking_id);
        Ok(EventReference(id))
    }

    async fn delete_event(&self, reference: &EventReference) -> Result<(), CalendarError> {
        let result = self
            .hub
            .events()
            .delete(&self.calendar_id, &reference.0)
            .send_updates("all")
            .doit()
            .await;

        match result {
            Ok(_) => {
                info!("Deleted calendar event {}", reference);
                Ok(())
            }
            // Already gone
            Err(e) if e.to_string().contains("404") || e.to_string().contains("410") => {
                debug!("Calendar event {} no longer exists", reference);
                Ok(())
            }
            Err(e) => Err(classify_api_error(e.to_string())),
        }
    }

    async fn find_event(
        &self,
        booking_id: BookingId,
    ) -> Result<Option<EventReference>, CalendarError> {
        let (_response, events) = self
            .hub
            .events()
            .list(&self.calendar_id)
            .add_private_extended_property(&booking_filter(booking_id))
            .show_deleted(false)
            .doit()
            .await
            .map_err(|e| classify_api_error(e.to_string()))?;

        let found = first_live_event(events);
        if let Some(reference) = &found {
            debug!("Booking {} has calendar event {}", booking_id, reference);
        }
        Ok(found)
    }
}
