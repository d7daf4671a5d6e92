// --- File: crates/studyslot_config/src/models.rs ---

use serde::{Deserialize, Serialize};

// --- General Server Config ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
        }
    }
}

// --- Database Config ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    pub url: String, // e.g. sqlite://study.db, loaded via STUDYSLOT__DATABASE__URL
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

// --- Scheduling Config ---
/// Shape of the bookable grid and the timing policy of the booking core.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SchedulingConfig {
    /// IANA name of the single operating timezone.
    #[serde(default = "default_time_zone")]
    pub time_zone: String,
    /// Number of days shown, starting today.
    #[serde(default = "default_window_days")]
    pub window_days: u32,
    /// First slot of the day starts at this local hour.
    #[serde(default = "default_day_start_hour")]
    pub day_start_hour: u32,
    /// Last slot of the day ends at this local hour (exclusive).
    #[serde(default = "default_day_end_hour")]
    pub day_end_hour: u32,
    #[serde(default = "default_slot_minutes")]
    pub slot_minutes: u32,
    #[serde(default)]
    pub allow_multiple_active_per_participant: bool,
    /// Upper bound for a single external event creation call.
    #[serde(default = "default_sync_timeout_secs")]
    pub sync_timeout_secs: u64,
    /// Interval of the background expiry sweep. 0 disables it.
    #[serde(default = "default_expiry_sweep_secs")]
    pub expiry_sweep_secs: u64,
}

fn default_time_zone() -> String {
    "America/Toronto".to_string()
}
fn default_window_days() -> u32 {
    7
}
fn default_day_start_hour() -> u32 {
    9
}
fn default_day_end_hour() -> u32 {
    22
}
fn default_slot_minutes() -> u32 {
    60
}
fn default_sync_timeout_secs() -> u64 {
    10
}
fn default_expiry_sweep_secs() -> u64 {
    60
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            time_zone: default_time_zone(),
            window_days: default_window_days(),
            day_start_hour: default_day_start_hour(),
            day_end_hour: default_day_end_hour(),
            slot_minutes: default_slot_minutes(),
            allow_multiple_active_per_participant: false,
            sync_timeout_secs: default_sync_timeout_secs(),
            expiry_sweep_secs: default_expiry_sweep_secs(),
        }
    }
}

// --- Google Calendar Config ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GcalConfig {
    pub key_path: Option<String>,    // Mandatory when use_gcal is set
    pub calendar_id: Option<String>, // Mandatory when use_gcal is set
    /// Prefix of the event title, followed by the participant name.
    #[serde(default = "default_event_summary")]
    pub event_summary: String,
}

fn default_event_summary() -> String {
    "User Study".to_string()
}

// --- Admin Config ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AdminConfig {
    pub api_token: String, // usually "secret_from_env" -> ADMIN_API_TOKEN
    #[serde(default = "default_admin_name")]
    pub name: String,
}

fn default_admin_name() -> String {
    "admin".to_string()
}

// --- Notification Config ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct NotificationConfig {
    pub from_address: String,
    /// Public base URL used to build participant booking links.
    pub host_base: String,
}

// --- Unified App Configuration ---
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub scheduling: SchedulingConfig,

    // --- Runtime Flags ---
    #[serde(default)]
    pub use_gcal: bool,

    // --- Optional Configurations ---
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
    #[serde(default)]
    pub gcal: Option<GcalConfig>,
    #[serde(default)]
    pub admin: Option<AdminConfig>,
    #[serde(default)]
    pub notifications: Option<NotificationConfig>,
}

impl AppConfig {
    /// Public base URL for participant links, without a trailing slash.
    ///
    /// Falls back to the server's own address when `[notifications]` is absent.
    pub fn host_base(&self) -> String {
        match &self.notifications {
            Some(n) => n.host_base.trim_end_matches('/').to_string(),
            None => format!("http://{}:{}", self.server.host, self.server.port),
        }
    }

    /// Where participants read the consent form.
    pub fn consent_url(&self) -> String {
        format!("{}/api/consent", self.host_base())
    }
}
