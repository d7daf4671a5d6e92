// --- File: crates/services/studyslot_backend/src/startup.rs ---
//! Builds the application state from configuration.

use crate::app_state::AppState;
use crate::messages::{MessageComposer, ParticipantNotifier};
use std::sync::Arc;
use std::time::Duration;
use studyslot_booking::{
    BookingDeps, BookingOptions, BookingService, ChannelNotificationSink, InMemoryCalendar,
    InMemoryStore, Schedule, SystemClock,
};
use studyslot_common::{
    log_error, BookingError, ExternalCalendar, ParticipantStore, PersistenceStore, SettingsStore,
};
use studyslot_config::AppConfig;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum StartupError {
    /// Invalid scheduling parameters. Fatal.
    #[error(transparent)]
    Schedule(#[from] BookingError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database setup failed: {0}")]
    Database(String),

    #[error("Google Calendar setup failed: {0}")]
    Calendar(String),
}

struct Stores {
    bookings: Arc<dyn PersistenceStore>,
    participants: Arc<dyn ParticipantStore>,
    settings: Arc<dyn SettingsStore>,
}

impl Stores {
    fn in_memory() -> Self {
        let store = Arc::new(InMemoryStore::new());
        Self {
            bookings: store.clone(),
            participants: store.clone(),
            settings: store,
        }
    }
}

#[cfg(feature = "database")]
async fn stores(config: &AppConfig) -> Result<Stores, StartupError> {
    use studyslot_db::{DbClient, SqlBookingStore, SqlParticipantStore, SqlSettingsStore};

    let Some(db_config) = config.database.as_ref() else {
        warn!("No [database] configured, bookings are kept in memory only");
        return Ok(Stores::in_memory());
    };
    let client = DbClient::from_config(db_config)
        .await
        .map_err(|e| StartupError::Database(e.to_string()))?;
    client
        .init_schema()
        .await
        .map_err(|e| StartupError::Database(e.to_string()))?;
    Ok(Stores {
        bookings: Arc::new(SqlBookingStore::new(client.clone())),
        participants: Arc::new(SqlParticipantStore::new(client.clone())),
        settings: Arc::new(SqlSettingsStore::new(client)),
    })
}

#[cfg(not(feature = "database"))]
async fn stores(_config: &AppConfig) -> Result<Stores, StartupError> {
    warn!("Built without database support, bookings are kept in memory only");
    Ok(Stores::in_memory())
}

#[cfg(feature = "gcal")]
async fn calendar(
    config: &AppConfig,
    schedule: &Schedule,
) -> Result<Arc<dyn ExternalCalendar>, StartupError> {
    use studyslot_gcal::{create_calendar_hub, GcalSetupError, GoogleCalendar};

    if !config.use_gcal {
        warn!("use_gcal is off, using an in-memory calendar");
        return Ok(Arc::new(InMemoryCalendar::new()));
    }
    let gcal_config = config
        .gcal
        .as_ref()
        .ok_or_else(|| StartupError::Config("use_gcal is set but [gcal] is missing".to_string()))?;
    let calendar_id = gcal_config
        .calendar_id
        .clone()
        .filter(|id| id != studyslot_config::SECRET_MARKER)
        .ok_or_else(|| StartupError::Calendar(GcalSetupError::MissingCalendarId.to_string()))?;
    let hub = create_calendar_hub(gcal_config)
        .await
        .map_err(|e| StartupError::Calendar(e.to_string()))?;

    info!("Using Google Calendar {}", calendar_id);
    Ok(Arc::new(GoogleCalendar::new(
        Arc::new(hub),
        calendar_id,
        schedule.time_zone(),
    )))
}

#[cfg(not(feature = "gcal"))]
async fn calendar(
    config: &AppConfig,
    _schedule: &Schedule,
) -> Result<Arc<dyn ExternalCalendar>, StartupError> {
    if config.use_gcal {
        return Err(StartupError::Config(
            "use_gcal is set but the service was built without the gcal feature".to_string(),
        ));
    }
    Ok(Arc::new(InMemoryCalendar::new()))
}

pub fn composer(config: &AppConfig, schedule: &Schedule) -> MessageComposer {
    let from_address = config
        .notifications
        .as_ref()
        .map(|n| n.from_address.as_str())
        .unwrap_or("no-reply@localhost");
    MessageComposer::new(schedule.time_zone(), from_address, config.host_base())
}

/// Wires stores, calendar, notifications and the booking service together.
///
/// Must run inside a tokio runtime: the notification queue is drained by a spawned task.
pub async fn build_state(config: Arc<AppConfig>) -> Result<Arc<AppState>, StartupError> {
    let schedule = Schedule::from_config(&config.scheduling)?;
    let stores = stores(&config).await?;
    let calendar = calendar(&config, &schedule).await?;
    let composer = composer(&config, &schedule);

    let (sink, _delivery) = ChannelNotificationSink::spawn(ParticipantNotifier::new(
        composer.clone(),
        stores.participants.clone(),
    ));

    let service = BookingService::new(
        schedule,
        BookingOptions::from_config(&config),
        BookingDeps {
            clock: Arc::new(SystemClock::new(schedule.time_zone())),
            store: stores.bookings,
            participants: stores.participants.clone(),
            calendar,
            sink: Arc::new(sink),
        },
    );
    info!(
        "Booking service ready: {} days x {} slots in {}",
        schedule.window_days(),
        schedule.slots_per_day(),
        schedule.time_zone()
    );

    Ok(Arc::new(AppState {
        config,
        bookings: Arc::new(service),
        participants: stores.participants,
        settings: stores.settings,
        composer,
    }))
}

/// Expires due pending requests every `every`, starting immediately.
pub fn spawn_expiry_sweeper(service: Arc<BookingService>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            if let Err(e) = service.expire_due().await {
                log_error(e, "Expiry sweep failed");
            }
        }
    })
}
