//! Clocks in the single operating timezone.

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use std::sync::Mutex;
use studyslot_common::Clock;

/// Wall clock.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    time_zone: Tz,
}

impl SystemClock {
    pub fn new(time_zone: Tz) -> Self {
        Self { time_zone }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Tz> {
        Utc::now().with_timezone(&self.time_zone)
    }

    fn time_zone(&self) -> Tz {
        self.time_zone
    }
}

/// A clock that only moves when told to. Used by tests and simulations.
#[derive(Debug)]
pub struct ManualClock {
    time_zone: Tz,
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(time_zone: Tz, now: DateTime<Utc>) -> Self {
        Self {
            time_zone,
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Tz> {
        let now = *self.now.lock().unwrap_or_else(|e| e.into_inner());
        now.with_timezone(&self.time_zone)
    }

    fn time_zone(&self) -> Tz {
        self.time_zone
    }
}
