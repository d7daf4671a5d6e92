//! Calendar kept in process memory, used when no external calendar is configured.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use studyslot_common::{
    BookingId, CalendarError, EventDraft, EventReference, ExternalCalendar, Interval,
};
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Default)]
struct Entries {
    busy: Vec<Interval>,
    events: BTreeMap<String, EventDraft>,
}

/// Created events count as busy time, like on a real calendar.
#[derive(Debug, Default)]
pub struct InMemoryCalendar {
    entries: Mutex<Entries>,
}

impl InMemoryCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, Entries> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Blocks `interval`, as if the owner had added something by hand.
    pub fn add_busy(&self, interval: Interval) {
        self.entries().busy.push(interval);
    }

    pub fn clear_busy(&self) {
        self.entries().busy.clear();
    }

    pub fn events(&self) -> Vec<(EventReference, EventDraft)> {
        self.entries()
            .events
            .iter()
            .map(|(id, draft)| (EventReference(id.clone()), draft.clone()))
            .collect()
    }
}

#[async_trait]
impl ExternalCalendar for InMemoryCalendar {
    async fn query_busy(&self, window: &Interval) -> Result<Vec<Interval>, CalendarError> {
        let entries = self.entries();
        let mut busy: Vec<Interval> = entries
            .busy
            .iter()
            .copied()
            .chain(entries.events.values().map(|d| d.slot.interval()))
            .filter(|i| i.overlaps(window))
            .collect();
        busy.sort_by_key(|i| i.start);
        Ok(busy)
    }

    async fn create_event(&self, draft: &EventDraft) -> Result<EventReference, CalendarError> {
        let id = Uuid::new_v4().simple().to_string();
        debug!("Created in-memory event {} for booking {}", id, draft.booking_id);
        self.entries().events.insert(id.clone(), draft.clone());
        Ok(EventReference(id))
    }

    async fn delete_event(&self, reference: &EventReference) -> Result<(), CalendarError> {
        self.entries().events.remove(&reference.0);
        Ok(())
    }

    async fn find_event(
        &self,
        booking_id: BookingId,
    ) -> Result<Option<EventReference>, CalendarError> {
        Ok(self
            .entries()
            .events
            .iter()
            .find(|(_, draft)| draft.booking_id == booking_id)
            .map(|(id, _)| EventReference(id.clone())))
    }
}
