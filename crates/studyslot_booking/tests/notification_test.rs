use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::error::Error;
use std::sync::{Arc, Mutex};
use studyslot_booking::{ChannelNotificationSink, EventHandler};
use studyslot_common::{BookingEvent, BookingRequest, BookingStatus, NotificationSink};

#[derive(Clone, Default)]
struct Collect {
    seen: Arc<Mutex<Vec<&'static str>>>,
}

#[async_trait]
impl EventHandler for Collect {
    async fn handle(&self, event: BookingEvent) -> Result<(), Box<dyn Error + Send + Sync>> {
        if matches!(event, BookingEvent::BookingRejected(_)) {
            return Err("mail server refused".into());
        }
        self.seen.lock().unwrap().push(event.name());
        Ok(())
    }
}

fn request() -> BookingRequest {
    let start = Utc.with_ymd_and_hms(2025, 5, 5, 14, 0, 0).unwrap();
    BookingRequest {
        id: 1,
        participant_id: 1,
        slot_start: start,
        slot_end: start + chrono::Duration::hours(1),
        status: BookingStatus::Pending,
        created_at: start,
        decided_at: None,
        decided_by: None,
        external_event: None,
        version: 0,
    }
}

#[tokio::test]
async fn test_events_are_delivered_in_order_despite_failures() {
    let handler = Collect::default();
    let (sink, task) = ChannelNotificationSink::spawn(handler.clone());

    sink.publish(BookingEvent::BookingCreated(request()));
    sink.publish(BookingEvent::BookingRejected(request()));
    sink.publish(BookingEvent::BookingCancelled(request()));
    drop(sink);
    task.await.unwrap();

    assert_eq!(
        *handler.seen.lock().unwrap(),
        vec!["BookingCreated", "BookingCancelled"]
    );
}
