// --- File: crates/services/studyslot_backend/src/handlers.rs ---
use crate::app_state::AppState;
use crate::error::ApiError;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, Json},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use studyslot_booking::{DayAvailability, Decision, DecisionOutcome};
use studyslot_common::{
    BookingId, BookingRequest, BookingStatus, Participant, ParticipantId, SettingKey,
};
use tracing::info;

// --- Participant API (keyed by the access token of the booking link) ---

#[derive(Debug, Serialize)]
pub struct InviteAvailabilityResponse {
    pub participant: String,
    pub time_zone: String,
    pub generated_at: DateTime<Utc>,
    pub days: Vec<DayAvailability>,
}

#[derive(Debug, Deserialize)]
pub struct CreateBookingBody {
    pub slot_start: DateTime<Utc>,
}

#[axum::debug_handler]
pub async fn get_invite_availability_handler(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<Json<InviteAvailabilityResponse>, ApiError> {
    let participant = state.bookings.participant_by_token(&token).await?;
    let snapshot = state.bookings.availability().await?;
    let time_zone = state.bookings.schedule().time_zone();

    Ok(Json(InviteAvailabilityResponse {
        participant: participant.name,
        time_zone: time_zone.name().to_string(),
        generated_at: snapshot.generated_at,
        days: snapshot.by_day(time_zone),
    }))
}

#[axum::debug_handler]
pub async fn create_booking_handler(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
    Json(body): Json<CreateBookingBody>,
) -> Result<(StatusCode, Json<BookingRequest>), ApiError> {
    let participant = state.bookings.participant_by_token(&token).await?;
    let request = state.bookings.create(participant.id, body.slot_start).await?;
    Ok((StatusCode::CREATED, Json(request)))
}

pub async fn cancel_own_booking_handler(
    State(state): State<Arc<AppState>>,
    Path((token, id)): Path<(String, BookingId)>,
) -> Result<Json<BookingRequest>, ApiError> {
    let participant = state.bookings.participant_by_token(&token).await?;
    let request = state
        .bookings
        .cancel_as_participant(participant.id, id)
        .await?;
    Ok(Json(request))
}

// --- Admin API ---

#[derive(Debug, Deserialize)]
pub struct CreateParticipantBody {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct ParticipantView {
    #[serde(flatten)]
    pub participant: Participant,
    pub booking_link: String,
}

#[derive(Debug, Deserialize)]
pub struct BookingsQuery {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DecisionBody {
    pub decision: Decision,
}

#[derive(Debug, Serialize)]
pub struct DecisionResponse {
    /// "rejected", "confirmed" or "awaiting_sync"
    pub outcome: &'static str,
    pub booking: BookingRequest,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync_error: Option<String>,
}

impl From<DecisionOutcome> for DecisionResponse {
    fn from(outcome: DecisionOutcome) -> Self {
        match outcome {
            DecisionOutcome::Rejected(booking) => Self {
                outcome: "rejected",
                booking,
                sync_error: None,
            },
            DecisionOutcome::Confirmed(booking) => Self {
                outcome: "confirmed",
                booking,
                sync_error: None,
            },
            DecisionOutcome::AwaitingSync { request, error } => Self {
                outcome: "awaiting_sync",
                booking: request,
                sync_error: Some(error.to_string()),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ExpireResponse {
    pub expired: Vec<BookingRequest>,
}

fn view(state: &AppState, participant: Participant) -> ParticipantView {
    ParticipantView {
        booking_link: state.composer.booking_link(&participant),
        participant,
    }
}

pub async fn list_participants_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ParticipantView>>, ApiError> {
    let participants = state.participants.list_participants().await?;
    Ok(Json(
        participants
            .into_iter()
            .map(|p| view(&state, p))
            .collect(),
    ))
}

#[axum::debug_handler]
pub async fn create_participant_handler(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateParticipantBody>,
) -> Result<(StatusCode, Json<ParticipantView>), ApiError> {
    let name = body.name.trim();
    let email = body.email.trim();
    if name.is_empty() || !email.contains('@') {
        return Err(ApiError::BadRequest(
            "name and a valid email are required".to_string(),
        ));
    }

    let participant = state.participants.create_participant(name, email).await?;
    let template = state.setting(SettingKey::InvitationTemplate).await?;
    let invitation = state.composer.invitation(&participant, &template);
    info!(
        to = %invitation.to,
        subject = %invitation.subject,
        "Outgoing message:\n{}",
        invitation.body
    );
    Ok((StatusCode::CREATED, Json(view(&state, participant))))
}

pub async fn revoke_participant_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ParticipantId>,
) -> Result<Json<ParticipantView>, ApiError> {
    let participant = state.bookings.revoke_participant(id).await?;
    info!("Participant {} revoked by {}", id, state.admin_name());
    Ok(Json(view(&state, participant)))
}

pub async fn delete_participant_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ParticipantId>,
) -> Result<StatusCode, ApiError> {
    state.bookings.delete_participant(id).await?;
    info!("Participant {} deleted by {}", id, state.admin_name());
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_bookings_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BookingsQuery>,
) -> Result<Json<Vec<BookingRequest>>, ApiError> {
    let status = query
        .status
        .as_deref()
        .map(str::parse::<BookingStatus>)
        .transpose()
        .map_err(ApiError::BadRequest)?;
    Ok(Json(state.bookings.list_requests(status).await?))
}

#[axum::debug_handler]
pub async fn decide_booking_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<BookingId>,
    Json(body): Json<DecisionBody>,
) -> Result<(StatusCode, Json<DecisionResponse>), ApiError> {
    let outcome = state
        .bookings
        .decide(id, body.decision, state.admin_name())
        .await?;
    let status = match outcome {
        DecisionOutcome::AwaitingSync { .. } => StatusCode::ACCEPTED,
        _ => StatusCode::OK,
    };
    Ok((status, Json(outcome.into())))
}

pub async fn retry_sync_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<BookingId>,
) -> Result<Json<BookingRequest>, ApiError> {
    Ok(Json(state.bookings.retry_sync(id).await?))
}

pub async fn reopen_booking_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<BookingId>,
) -> Result<Json<BookingRequest>, ApiError> {
    Ok(Json(state.bookings.reopen(id).await?))
}

pub async fn cancel_booking_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<BookingId>,
) -> Result<Json<BookingRequest>, ApiError> {
    Ok(Json(state.bookings.cancel(id).await?))
}

pub async fn expire_due_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ExpireResponse>, ApiError> {
    let expired = state.bookings.expire_due().await?;
    Ok(Json(ExpireResponse { expired }))
}

// --- Settings ---

#[derive(Debug, Serialize, Deserialize)]
pub struct SettingBody {
    pub value: String,
}

fn setting_key(key: &str) -> Result<SettingKey, ApiError> {
    key.parse::<SettingKey>()
        .map_err(|e| ApiError::from(studyslot_common::not_found(e)))
}

pub async fn get_setting_handler(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<Json<SettingBody>, ApiError> {
    let key = setting_key(&key)?;
    Ok(Json(SettingBody {
        value: state.setting(key).await?,
    }))
}

pub async fn put_setting_handler(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
    Json(body): Json<SettingBody>,
) -> Result<Json<SettingBody>, ApiError> {
    let key = setting_key(&key)?;
    state.settings.put_setting(key, &body.value).await?;
    info!("Setting {} updated by {}", key, state.admin_name());
    Ok(Json(body))
}

/// The consent form participants are pointed to.
pub async fn consent_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Html<String>, ApiError> {
    let html = state.setting(SettingKey::ConsentHtml).await?;
    Ok(Html(format!(
        "<!doctype html><meta charset=\"utf-8\"><title>Consent Form</title>{html}"
    )))
}
