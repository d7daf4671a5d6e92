// --- File: crates/services/studyslot_backend/src/app_state.rs ---
use crate::messages::MessageComposer;
use std::sync::Arc;
use studyslot_booking::BookingService;
use studyslot_common::{ParticipantStore, SettingKey, SettingsStore, StoreError};
use studyslot_config::AppConfig;

/// Shared by every route.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub bookings: Arc<BookingService>,
    pub participants: Arc<dyn ParticipantStore>,
    pub settings: Arc<dyn SettingsStore>,
    pub composer: MessageComposer,
}

impl AppState {
    /// The expected bearer token, if admin access is configured.
    pub fn admin_token(&self) -> Option<&str> {
        self.config
            .admin
            .as_ref()
            .map(|a| a.api_token.as_str())
            .filter(|t| !t.is_empty() && *t != studyslot_config::SECRET_MARKER)
    }

    /// The stored value of `key`, or its built-in default.
    pub async fn setting(&self, key: SettingKey) -> Result<String, StoreError> {
        Ok(self
            .settings
            .get_setting(key)
            .await?
            .unwrap_or_else(|| key.default_value().to_string()))
    }

    pub fn admin_name(&self) -> &str {
        self.config
            .admin
            .as_ref()
            .map(|a| a.name.as_str())
            .unwrap_or("admin")
    }
}
