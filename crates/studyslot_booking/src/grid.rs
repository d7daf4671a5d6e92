// --- File: crates/studyslot_booking/src/grid.rs ---
//! The canonical set of bookable slots for a rolling window of days.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use studyslot_common::{configuration_error, BookingError, Interval, Slot};
use studyslot_config::SchedulingConfig;

/// Validated shape of the grid: which hours of which days, in which timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    time_zone: Tz,
    window_days: u32,
    day_start_hour: u32,
    day_end_hour: u32,
    slot_duration: Duration,
}

impl Schedule {
    /// Fails with [`BookingError::Configuration`] if the end hour is not after the start
    /// hour, or the slot duration does not evenly divide the daily range.
    pub fn new(
        time_zone: Tz,
        window_days: u32,
        day_start_hour: u32,
        day_end_hour: u32,
        slot_duration: Duration,
    ) -> Result<Self, BookingError> {
        if day_end_hour <= day_start_hour {
            return Err(configuration_error(format!(
                "day end hour {day_end_hour} must be after day start hour {day_start_hour}"
            )));
        }
        if day_end_hour > 24 {
            return Err(configuration_error(format!(
                "day end hour {day_end_hour} is past midnight"
            )));
        }
        if window_days == 0 {
            return Err(configuration_error("window must cover at least one day"));
        }
        let range_secs = i64::from(day_end_hour - day_start_hour) * 3600;
        let slot_secs = slot_duration.num_seconds();
        if slot_secs <= 0 || range_secs % slot_secs != 0 {
            return Err(configuration_error(format!(
                "slot duration of {} minutes does not evenly divide {}:00-{}:00",
                slot_duration.num_minutes(),
                day_start_hour,
                day_end_hour
            )));
        }

        Ok(Self {
            time_zone,
            window_days,
            day_start_hour,
            day_end_hour,
            slot_duration,
        })
    }

    pub fn from_config(config: &SchedulingConfig) -> Result<Self, BookingError> {
        let time_zone: Tz = config.time_zone.parse().map_err(|e| {
            configuration_error(format!("unknown time zone {}: {}", config.time_zone, e))
        })?;
        Self::new(
            time_zone,
            config.window_days,
            config.day_start_hour,
            config.day_end_hour,
            Duration::minutes(i64::from(config.slot_minutes)),
        )
    }

    pub fn time_zone(&self) -> Tz {
        self.time_zone
    }

    pub fn window_days(&self) -> u32 {
        self.window_days
    }

    pub fn slot_duration(&self) -> Duration {
        self.slot_duration
    }

    pub fn slots_per_day(&self) -> u32 {
        let range_secs = i64::from(self.day_end_hour - self.day_start_hour) * 3600;
        (range_secs / self.slot_duration.num_seconds()) as u32
    }

    /// Grid for the window beginning on `window_start` (a local date).
    pub fn grid(&self, window_start: NaiveDate) -> SlotGrid {
        SlotGrid {
            schedule: *self,
            window_start,
        }
    }

    /// Grid for the window beginning on the local date of `now`.
    pub fn grid_for(&self, now: DateTime<Tz>) -> SlotGrid {
        self.grid(now.with_timezone(&self.time_zone).date_naive())
    }
}

/// The slots of one window. Cheap to copy; iterate as often as needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotGrid {
    schedule: Schedule,
    window_start: NaiveDate,
}

impl SlotGrid {
    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn window_start(&self) -> NaiveDate {
        self.window_start
    }

    /// Lazy, chronological walk over every slot of the window.
    pub fn iter(&self) -> SlotIter<'_> {
        SlotIter {
            grid: self,
            day: 0,
            index: 0,
        }
    }

    /// From the first slot's start to the last slot's end.
    pub fn window(&self) -> Option<Interval> {
        let first = self.iter().next()?;
        let last = self.iter().last()?;
        Some(Interval::new(first.start, last.end))
    }

    /// The grid slot starting exactly at `start`, if there is one.
    pub fn slot_at(&self, start: DateTime<Utc>) -> Option<Slot> {
        let local_date = start.with_timezone(&self.schedule.time_zone).date_naive();
        let offset = (local_date - self.window_start).num_days();
        if offset < 0 || offset >= i64::from(self.schedule.window_days) {
            return None;
        }
        self.iter().find(|slot| slot.start == start)
    }
}

impl<'a> IntoIterator for &'a SlotGrid {
    type Item = Slot;
    type IntoIter = SlotIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub struct SlotIter<'a> {
    grid: &'a SlotGrid,
    day: u32,
    index: u32,
}

impl Iterator for SlotIter<'_> {
    type Item = Slot;

    fn next(&mut self) -> Option<Slot> {
        let schedule = &self.grid.schedule;
        let per_day = schedule.slots_per_day();
        let day_start = NaiveTime::from_hms_opt(schedule.day_start_hour, 0, 0)?;

        while self.day < schedule.window_days {
            if self.index >= per_day {
                self.day += 1;
                self.index = 0;
                continue;
            }
            let step = self.index as i32;
            self.index += 1;

            let date = self.grid.window_start + Duration::days(i64::from(self.day));
            let local = date.and_time(day_start) + schedule.slot_duration * step;
            // A local time skipped by a DST jump has no instant and no slot.
            if let Some(start) = schedule.time_zone.from_local_datetime(&local).earliest() {
                let start = start.with_timezone(&Utc);
                return Some(Slot {
                    start,
                    end: start + schedule.slot_duration,
                });
            }
        }
        None
    }
}
