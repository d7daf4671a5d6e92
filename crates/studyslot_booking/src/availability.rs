// --- File: crates/studyslot_booking/src/availability.rs ---
//! Classification of grid slots into available, booked and past.
//!
//! Nothing here is cached: every read asks the store and the external calendar again,
//! because the calendar owner may edit their calendar at any time.

use crate::grid::SlotGrid;
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration as StdDuration;
use studyslot_common::{
    BookingError, BookingId, BookingRequest, CalendarError, ExternalCalendar, Interval,
    PersistenceStore, Slot,
};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotState {
    Available,
    Booked,
    Past,
}

/// `past` wins over `booked`, which wins over `available`.
pub fn classify(
    slot: &Slot,
    now: DateTime<Utc>,
    active: &[BookingRequest],
    busy: &[Interval],
) -> SlotState {
    if slot.is_past(now) {
        return SlotState::Past;
    }
    let interval = slot.interval();
    let claimed = active
        .iter()
        .any(|request| request.status.is_active() && request.interval().overlaps(&interval));
    if claimed || busy.iter().any(|b| b.overlaps(&interval)) {
        return SlotState::Booked;
    }
    SlotState::Available
}

/// Merges overlapping or touching intervals into a sorted, disjoint list.
pub fn merge_intervals(intervals: &[Interval]) -> Vec<Interval> {
    let mut sorted = intervals.to_vec();
    sorted.sort_by_key(|i| i.start);

    let mut merged: Vec<Interval> = Vec::with_capacity(sorted.len());
    for interval in sorted {
        match merged.last_mut() {
            Some(last) if interval.start <= last.end => {
                last.end = last.end.max(interval.end);
            }
            _ => merged.push(interval),
        }
    }
    merged
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SlotAvailability {
    pub slot: Slot,
    pub state: SlotState,
}

/// Every slot of one window with its state at `generated_at`. Lives for one read only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvailabilitySnapshot {
    pub generated_at: DateTime<Utc>,
    pub slots: Vec<SlotAvailability>,
}

/// One local day of a snapshot, for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayAvailability {
    pub date: NaiveDate,
    pub slots: Vec<SlotAvailability>,
}

impl AvailabilitySnapshot {
    pub fn resolve(
        grid: &SlotGrid,
        now: DateTime<Utc>,
        active: &[BookingRequest],
        busy: &[Interval],
    ) -> Self {
        let mut claimed: Vec<Interval> = active
            .iter()
            .filter(|r| r.status.is_active())
            .map(BookingRequest::interval)
            .collect();
        claimed.extend_from_slice(busy);
        let blocked = merge_intervals(&claimed);

        let slots = grid
            .iter()
            .map(|slot| SlotAvailability {
                slot,
                state: classify(&slot, now, &[], &blocked),
            })
            .collect();

        Self {
            generated_at: now,
            slots,
        }
    }

    pub fn state_of(&self, start: DateTime<Utc>) -> Option<SlotState> {
        self.slots
            .iter()
            .find(|s| s.slot.start == start)
            .map(|s| s.state)
    }

    pub fn available(&self) -> impl Iterator<Item = &Slot> {
        self.slots
            .iter()
            .filter(|s| s.state == SlotState::Available)
            .map(|s| &s.slot)
    }

    /// Groups slots by their local date, keeping chronological order.
    pub fn by_day(&self, time_zone: Tz) -> Vec<DayAvailability> {
        let mut days: Vec<DayAvailability> = Vec::new();
        for entry in &self.slots {
            let date = entry.slot.start.with_timezone(&time_zone).date_naive();
            match days.last_mut() {
                Some(day) if day.date == date => day.slots.push(*entry),
                _ => days.push(DayAvailability {
                    date,
                    slots: vec![*entry],
                }),
            }
        }
        days
    }
}

/// Reads the store and the external calendar and classifies slots.
#[derive(Clone)]
pub struct AvailabilityResolver {
    store: Arc<dyn PersistenceStore>,
    calendar: Arc<dyn ExternalCalendar>,
    calendar_timeout: StdDuration,
}

impl AvailabilityResolver {
    pub fn new(
        store: Arc<dyn PersistenceStore>,
        calendar: Arc<dyn ExternalCalendar>,
        calendar_timeout: StdDuration,
    ) -> Self {
        Self {
            store,
            calendar,
            calendar_timeout,
        }
    }

    /// Fresh snapshot of the whole window.
    pub async fn snapshot(
        &self,
        grid: &SlotGrid,
        now: DateTime<Utc>,
    ) -> Result<AvailabilitySnapshot, BookingError> {
        let Some(window) = grid.window() else {
            return Ok(AvailabilitySnapshot {
                generated_at: now,
                slots: Vec::new(),
            });
        };
        let active = self.store.list_active_requests(&window).await?;
        let busy = self.busy(&window).await?;
        debug!(
            "Resolving availability for {} - {}: {} active requests, {} busy periods",
            window.start,
            window.end,
            active.len(),
            busy.len()
        );
        Ok(AvailabilitySnapshot::resolve(grid, now, &active, &busy))
    }

    /// Fresh state of a single slot, ignoring the request `exclude` (the one being decided).
    pub async fn slot_state(
        &self,
        slot: &Slot,
        now: DateTime<Utc>,
        exclude: Option<BookingId>,
    ) -> Result<SlotState, BookingError> {
        if slot.is_past(now) {
            return Ok(SlotState::Past);
        }
        let window = slot.interval();
        let active: Vec<BookingRequest> = self
            .store
            .list_active_requests(&window)
            .await?
            .into_iter()
            .filter(|r| Some(r.id) != exclude)
            .collect();
        let busy = self.busy(&window).await?;
        Ok(classify(slot, now, &active, &busy))
    }

    async fn busy(&self, window: &Interval) -> Result<Vec<Interval>, BookingError> {
        let result = tokio::time::timeout(self.calendar_timeout, self.calendar.query_busy(window))
            .await
            .unwrap_or(Err(CalendarError::Timeout(self.calendar_timeout)));
        result.map_err(|e| {
            warn!("Busy query for {} - {} failed: {}", window.start, window.end, e);
            BookingError::CalendarUnavailable(e.to_string())
        })
    }
}
