// --- File: crates/studyslot_booking/src/notify.rs ---
//! Notification sinks. The core only publishes; delivery happens elsewhere.

use async_trait::async_trait;
use std::error::Error;
use std::sync::{Arc, Mutex};
use studyslot_common::{BookingEvent, NotificationSink};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Delivers one event, e.g. by composing and sending a message.
#[async_trait]
pub trait EventHandler: Send + Sync + 'static {
    async fn handle(&self, event: BookingEvent) -> Result<(), Box<dyn Error + Send + Sync>>;
}

/// Queues events on an unbounded channel drained by a background task.
///
/// `publish` never waits; handler failures are logged and dropped.
#[derive(Debug, Clone)]
pub struct ChannelNotificationSink {
    tx: mpsc::UnboundedSender<BookingEvent>,
}

impl ChannelNotificationSink {
    /// Spawns the delivery task on the current tokio runtime.
    ///
    /// The task ends once every sink clone has been dropped and the queue is drained.
    pub fn spawn<H: EventHandler>(handler: H) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<BookingEvent>();
        let handle = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                let name = event.name();
                let id = event.request().id;
                if let Err(e) = handler.handle(event).await {
                    warn!("Delivery of {} for booking {} failed: {}", name, id, e);
                }
            }
            debug!("Notification queue closed");
        });
        (Self { tx }, handle)
    }
}

impl NotificationSink for ChannelNotificationSink {
    fn publish(&self, event: BookingEvent) {
        if let Err(e) = self.tx.send(event) {
            warn!("Notification queue closed, dropping {}", e.0.name());
        }
    }
}

/// Writes every event to the log and nothing else.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn publish(&self, event: BookingEvent) {
        let request = event.request();
        info!(
            booking_id = request.id,
            participant_id = request.participant_id,
            status = %request.status,
            "{}",
            event.name()
        );
    }
}

/// Keeps every published event in memory.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<BookingEvent>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<BookingEvent> {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.events().iter().map(BookingEvent::name).collect()
    }
}

impl NotificationSink for RecordingSink {
    fn publish(&self, event: BookingEvent) {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event);
    }
}
