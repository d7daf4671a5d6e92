#[cfg(test)]
mod tests {
    use crate::grid::Schedule;
    use chrono::{Duration, NaiveDate, TimeZone, Timelike, Utc};
    use chrono_tz::Tz;
    use proptest::prelude::*;
    use studyslot_common::BookingError;
    use studyslot_config::SchedulingConfig;

    fn toronto() -> Tz {
        Tz::America__Toronto
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_one_day_nine_to_nine_has_twelve_hourly_slots() {
        let schedule = Schedule::new(toronto(), 1, 9, 21, Duration::hours(1)).unwrap();
        let grid = schedule.grid(date(2025, 5, 5));
        let slots: Vec<_> = grid.iter().collect();

        assert_eq!(slots.len(), 12);
        let first = slots[0].start.with_timezone(&toronto());
        let last = slots[11].start.with_timezone(&toronto());
        assert_eq!(first.hour(), 9);
        assert_eq!(last.hour(), 20);
        assert_eq!(slots[11].end.with_timezone(&toronto()).hour(), 21);
    }

    #[test]
    fn test_slots_are_contiguous_and_never_overlap() {
        let schedule = Schedule::new(toronto(), 7, 9, 22, Duration::minutes(30)).unwrap();
        let grid = schedule.grid(date(2025, 5, 5));
        let slots: Vec<_> = grid.iter().collect();

        assert_eq!(slots.len(), 7 * 26);
        for pair in slots.windows(2) {
            assert!(pair[0].start < pair[1].start, "chronological order");
            assert!(pair[0].end <= pair[1].start, "no overlap");
            let same_day = pair[0].start.with_timezone(&toronto()).date_naive()
                == pair[1].start.with_timezone(&toronto()).date_naive();
            if same_day {
                assert_eq!(pair[0].end, pair[1].start, "contiguous within a day");
            }
        }
    }

    #[test]
    fn test_grid_can_be_walked_again() {
        let schedule = Schedule::new(toronto(), 2, 9, 12, Duration::hours(1)).unwrap();
        let grid = schedule.grid(date(2025, 5, 5));

        let once: Vec<_> = grid.iter().collect();
        let twice: Vec<_> = (&grid).into_iter().collect();
        assert_eq!(once, twice);
        assert_eq!(once.len(), 6);
    }

    #[test]
    fn test_end_hour_must_follow_start_hour() {
        let err = Schedule::new(toronto(), 7, 21, 9, Duration::hours(1)).unwrap_err();
        assert!(matches!(err, BookingError::Configuration(_)));

        let err = Schedule::new(toronto(), 7, 9, 9, Duration::hours(1)).unwrap_err();
        assert!(matches!(err, BookingError::Configuration(_)));
    }

    #[test]
    fn test_duration_must_divide_the_daily_range() {
        let err = Schedule::new(toronto(), 7, 9, 21, Duration::minutes(50)).unwrap_err();
        assert!(matches!(err, BookingError::Configuration(_)));

        let err = Schedule::new(toronto(), 7, 9, 21, Duration::zero()).unwrap_err();
        assert!(matches!(err, BookingError::Configuration(_)));

        assert!(Schedule::new(toronto(), 7, 9, 21, Duration::minutes(45)).is_ok());
    }

    #[test]
    fn test_from_config_rejects_unknown_time_zone() {
        let config = SchedulingConfig {
            time_zone: "Mars/Olympus_Mons".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            Schedule::from_config(&config),
            Err(BookingError::Configuration(_))
        ));

        let schedule = Schedule::from_config(&SchedulingConfig::default()).unwrap();
        assert_eq!(schedule.time_zone(), toronto());
        assert_eq!(schedule.slots_per_day(), 13);
    }

    #[test]
    fn test_slot_at_only_accepts_grid_starts() {
        let schedule = Schedule::new(toronto(), 7, 9, 21, Duration::hours(1)).unwrap();
        let grid = schedule.grid(date(2025, 5, 5));
        let ten = toronto().with_ymd_and_hms(2025, 5, 6, 10, 0, 0).unwrap();

        let slot = grid.slot_at(ten.with_timezone(&Utc)).unwrap();
        assert_eq!(slot.end - slot.start, Duration::hours(1));

        let half_past = ten + Duration::minutes(30);
        assert!(grid.slot_at(half_past.with_timezone(&Utc)).is_none());

        let evening = toronto().with_ymd_and_hms(2025, 5, 6, 21, 0, 0).unwrap();
        assert!(grid.slot_at(evening.with_timezone(&Utc)).is_none());

        let next_week = toronto().with_ymd_and_hms(2025, 5, 12, 10, 0, 0).unwrap();
        assert!(grid.slot_at(next_week.with_timezone(&Utc)).is_none());
    }

    #[test]
    fn test_spring_forward_hour_has_no_slot() {
        // 2025-03-09 02:00 does not exist in Toronto
        let schedule = Schedule::new(toronto(), 1, 0, 4, Duration::hours(1)).unwrap();
        let grid = schedule.grid(date(2025, 3, 9));
        let hours: Vec<u32> = grid
            .iter()
            .map(|slot| slot.start.with_timezone(&toronto()).hour())
            .collect();

        assert_eq!(hours, vec![0, 1, 3]);
    }

    #[test]
    fn test_window_spans_first_start_to_last_end() {
        let schedule = Schedule::new(toronto(), 2, 9, 21, Duration::hours(1)).unwrap();
        let grid = schedule.grid(date(2025, 5, 5));
        let window = grid.window().unwrap();

        assert_eq!(
            window.start,
            toronto().with_ymd_and_hms(2025, 5, 5, 9, 0, 0).unwrap().with_timezone(&Utc)
        );
        assert_eq!(
            window.end,
            toronto().with_ymd_and_hms(2025, 5, 6, 21, 0, 0).unwrap().with_timezone(&Utc)
        );
    }

    proptest! {
        #[test]
        fn test_grid_covers_exactly_the_configured_hours(
            days in 1..10u32,
            start_hour in 0..12u32,
            span in 1..12u32,
            divisor in prop::sample::select(vec![1i64, 2, 3, 4, 6, 12]),
        ) {
            let end_hour = start_hour + span;
            let minutes = 60 / divisor;
            let schedule = Schedule::new(Tz::UTC, days, start_hour, end_hour, Duration::minutes(minutes)).unwrap();
            let grid = schedule.grid(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
            let slots: Vec<_> = grid.iter().collect();

            prop_assert_eq!(slots.len() as i64, i64::from(days) * i64::from(span) * divisor);
            for slot in &slots {
                prop_assert!(slot.start.hour() >= start_hour);
                prop_assert!(slot.end.hour() <= end_hour || (end_hour == 24 && slot.end.hour() == 0));
                prop_assert_eq!(slot.end - slot.start, Duration::minutes(minutes));
            }
        }
    }
}
