// File: crates/studyslot_gcal/src/auth.rs
use google_calendar3::{
    hyper_rustls::{self, HttpsConnectorBuilder},
    hyper_util::client::legacy::connect::HttpConnector,
    hyper_util::client::legacy::Client,
    yup_oauth2::{read_service_account_key, ServiceAccountAuthenticator},
    CalendarHub,
};
use std::path::Path;
use studyslot_config::GcalConfig;
use thiserror::Error;
use tracing::info;

type Connector = hyper_rustls::HttpsConnector<HttpConnector>;

pub type HubType = CalendarHub<Connector>;

#[derive(Error, Debug)]
pub enum GcalSetupError {
    #[error("Missing key_path in gcal config")]
    MissingKeyPath,
    #[error("Missing calendar_id in gcal config")]
    MissingCalendarId,
    #[error("Failed to set up Google credentials: {0}")]
    Io(#[from] std::io::Error),
}

/// Builds an authenticated hub from the service account key at `config.key_path`.
pub async fn create_calendar_hub(config: &GcalConfig) -> Result<HubType, GcalSetupError> {
    let key_path = config
        .key_path
        .as_deref()
        .ok_or(GcalSetupError::MissingKeyPath)?;

    let sa_key = read_service_account_key(Path::new(key_path)).await?;
    let auth = ServiceAccountAuthenticator::builder(sa_key).build().await?;

    let https = HttpsConnectorBuilder::new()
        .with_native_roots()?
        .https_or_http()
        .enable_http1()
        .build();

    let client = Client::builder(hyper_util::rt::TokioExecutor::new()).build(https);

    info!("Google Calendar hub ready (key: {})", key_path);
    Ok(CalendarHub::new(client, auth))
}
