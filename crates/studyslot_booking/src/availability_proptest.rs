#[cfg(test)]
mod tests {
    use crate::availability::{AvailabilitySnapshot, SlotState};
    use crate::grid::Schedule;
    use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
    use chrono_tz::Tz;
    use proptest::prelude::*;
    use studyslot_common::{BookingRequest, BookingStatus, Interval};

    fn base() -> DateTime<Utc> {
        Tz::Europe__Zurich
            .with_ymd_and_hms(2025, 6, 2, 0, 0, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    fn status(n: u8) -> BookingStatus {
        match n % 6 {
            0 => BookingStatus::Pending,
            1 => BookingStatus::Approved,
            2 => BookingStatus::Rejected,
            3 => BookingStatus::Confirmed,
            4 => BookingStatus::Cancelled,
            _ => BookingStatus::Expired,
        }
    }

    // Requests and busy periods at arbitrary quarter-hour offsets into the window
    fn requests(raw: &[(i64, u8)]) -> Vec<BookingRequest> {
        raw.iter()
            .enumerate()
            .map(|(i, (offset, s))| {
                let start = base() + Duration::minutes(offset * 15);
                BookingRequest {
                    id: i as i64 + 1,
                    participant_id: i as i64 + 1,
                    slot_start: start,
                    slot_end: start + Duration::hours(1),
                    status: status(*s),
                    created_at: base(),
                    decided_at: None,
                    decided_by: None,
                    external_event: None,
                    version: 0,
                }
            })
            .collect()
    }

    fn busy(raw: &[(i64, i64)]) -> Vec<Interval> {
        raw.iter()
            .map(|(offset, len)| {
                let start = base() + Duration::minutes(offset * 15);
                Interval::new(start, start + Duration::minutes(len * 15))
            })
            .collect()
    }

    proptest! {
        // Past wins over every other classification
        #[test]
        fn test_ended_slots_are_always_past(
            now_offset in 0..(7 * 24 * 4i64),
            raw_requests in prop::collection::vec((0..(7 * 24 * 4i64), any::<u8>()), 0..20),
            raw_busy in prop::collection::vec((0..(7 * 24 * 4i64), 1..12i64), 0..20),
        ) {
            let schedule = Schedule::new(Tz::Europe__Zurich, 7, 8, 20, Duration::minutes(30)).unwrap();
            let grid = schedule.grid(NaiveDate::from_ymd_opt(2025, 6, 2).unwrap());
            let now = base() + Duration::minutes(now_offset * 15);

            let snapshot = AvailabilitySnapshot::resolve(&grid, now, &requests(&raw_requests), &busy(&raw_busy));

            for entry in &snapshot.slots {
                prop_assert_eq!(entry.state == SlotState::Past, entry.slot.end <= now);
            }
        }

        // A future slot is available exactly when nothing active or busy overlaps it
        #[test]
        fn test_available_means_unclaimed(
            raw_requests in prop::collection::vec((0..(7 * 24 * 4i64), any::<u8>()), 0..20),
            raw_busy in prop::collection::vec((0..(7 * 24 * 4i64), 1..12i64), 0..20),
        ) {
            let schedule = Schedule::new(Tz::Europe__Zurich, 7, 8, 20, Duration::minutes(30)).unwrap();
            let grid = schedule.grid(NaiveDate::from_ymd_opt(2025, 6, 2).unwrap());
            let requests = requests(&raw_requests);
            let busy = busy(&raw_busy);

            let snapshot = AvailabilitySnapshot::resolve(&grid, base(), &requests, &busy);

            for entry in &snapshot.slots {
                let interval = entry.slot.interval();
                let claimed = requests.iter().any(|r| r.status.is_active() && r.interval().overlaps(&interval))
                    || busy.iter().any(|b| b.overlaps(&interval));
                prop_assert_eq!(entry.state == SlotState::Available, !claimed);
            }
        }
    }
}
