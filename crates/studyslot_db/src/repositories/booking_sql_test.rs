#[cfg(test)]
mod tests {
    use crate::repositories::{SqlBookingStore, SqlParticipantStore};
    use crate::DbClient;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use studyslot_common::{
        BookingStatus, EventReference, Interval, NewBookingRequest, ParticipantStore,
        PersistenceStore, Slot, StoreError,
    };

    async fn stores() -> (SqlBookingStore, SqlParticipantStore) {
        let client = DbClient::connect("sqlite::memory:", 1).await.unwrap();
        client.init_schema().await.unwrap();
        (
            SqlBookingStore::new(client.clone()),
            SqlParticipantStore::new(client),
        )
    }

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 5, hour, 0, 0).unwrap()
    }

    fn new_request(participant_id: i64, hour: u32) -> NewBookingRequest {
        NewBookingRequest {
            participant_id,
            slot: Slot {
                start: at(hour),
                end: at(hour) + Duration::hours(1),
            },
            created_at: at(8),
        }
    }

    #[tokio::test]
    async fn test_insert_and_read_back() {
        let (bookings, participants) = stores().await;
        let alice = participants.create_participant("alice", "a@example.org").await.unwrap();

        let stored = bookings.insert(new_request(alice.id, 14)).await.unwrap();
        assert_eq!(stored.status, BookingStatus::Pending);
        assert_eq!(stored.version, 0);

        let loaded = bookings.get_request(stored.id).await.unwrap().unwrap();
        assert_eq!(loaded, stored);
        assert_eq!(loaded.slot_start, at(14));
    }

    #[tokio::test]
    async fn test_second_active_request_on_slot_conflicts() {
        let (bookings, _) = stores().await;
        bookings.insert(new_request(1, 14)).await.unwrap();

        let err = bookings.insert(new_request(2, 14)).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_inactive_request_releases_slot() {
        let (bookings, _) = stores().await;
        let mut first = bookings.insert(new_request(1, 14)).await.unwrap();
        first.status = BookingStatus::Cancelled;
        bookings.update(&first).await.unwrap();

        let second = bookings.insert(new_request(2, 14)).await.unwrap();
        assert_eq!(second.status, BookingStatus::Pending);
    }

    #[tokio::test]
    async fn test_stale_version_is_concurrent_modification() {
        let (bookings, _) = stores().await;
        let original = bookings.insert(new_request(1, 14)).await.unwrap();

        let mut approved = original.clone();
        approved.status = BookingStatus::Approved;
        approved.decided_at = Some(at(9));
        approved.decided_by = Some("admin".to_string());
        let stored = bookings.update(&approved).await.unwrap();
        assert_eq!(stored.version, 1);

        let mut stale = original;
        stale.status = BookingStatus::Cancelled;
        let err = bookings.update(&stale).await.unwrap_err();
        assert_eq!(err, StoreError::ConcurrentModification(stored.id));

        let mut missing = stored.clone();
        missing.id = 999;
        let err = bookings.update(&missing).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_persists_decision_and_event() {
        let (bookings, _) = stores().await;
        let mut request = bookings.insert(new_request(1, 14)).await.unwrap();
        request.status = BookingStatus::Confirmed;
        request.decided_at = Some(at(9));
        request.decided_by = Some("admin".to_string());
        request.external_event = Some(EventReference("evt-1".to_string()));
        bookings.update(&request).await.unwrap();

        let loaded = bookings.get_request(request.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, BookingStatus::Confirmed);
        assert_eq!(loaded.decided_at, Some(at(9)));
        assert_eq!(loaded.decided_by.as_deref(), Some("admin"));
        assert_eq!(loaded.external_event, Some(EventReference("evt-1".to_string())));
        assert_eq!(loaded.version, 1);
    }

    #[tokio::test]
    async fn test_list_active_requests_uses_half_open_overlap() {
        let (bookings, _) = stores().await;
        bookings.insert(new_request(1, 10)).await.unwrap();
        bookings.insert(new_request(2, 12)).await.unwrap();
        let mut rejected = bookings.insert(new_request(3, 11)).await.unwrap();
        rejected.status = BookingStatus::Rejected;
        bookings.update(&rejected).await.unwrap();

        let active = bookings
            .list_active_requests(&Interval::new(at(11), at(12)))
            .await
            .unwrap();
        assert!(active.is_empty(), "neighbours only touch the window");

        let active = bookings
            .list_active_requests(&Interval::new(at(9), at(13)))
            .await
            .unwrap();
        assert_eq!(active.len(), 2);
        assert_eq!(active[0].slot_start, at(10));
    }

    #[tokio::test]
    async fn test_list_by_status_and_participant() {
        let (bookings, _) = stores().await;
        bookings.insert(new_request(1, 10)).await.unwrap();
        let mut second = bookings.insert(new_request(1, 12)).await.unwrap();
        second.status = BookingStatus::Cancelled;
        bookings.update(&second).await.unwrap();

        assert_eq!(bookings.list_requests(None).await.unwrap().len(), 2);
        let pending = bookings
            .list_requests(Some(BookingStatus::Pending))
            .await
            .unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].slot_start, at(10));
        assert_eq!(bookings.active_requests_for_participant(1).await.unwrap().len(), 1);
        assert!(bookings.active_requests_for_participant(2).await.unwrap().is_empty());
    }
}
