// --- File: crates/services/studyslot_backend/src/routes.rs ---
use crate::app_state::AppState;
use crate::auth::require_admin;
use crate::handlers::*;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// All routes, to be nested under `/api`.
pub fn routes(state: Arc<AppState>) -> Router {
    let invite = Router::new()
        .route(
            "/invite/{token}/availability",
            get(get_invite_availability_handler),
        )
        .route("/invite/{token}/bookings", post(create_booking_handler))
        .route(
            "/invite/{token}/bookings/{id}/cancel",
            post(cancel_own_booking_handler),
        )
        .route("/consent", get(consent_handler));

    let admin = Router::new()
        .route(
            "/admin/participants",
            get(list_participants_handler).post(create_participant_handler),
        )
        .route(
            "/admin/participants/{id}",
            axum::routing::delete(delete_participant_handler),
        )
        .route(
            "/admin/participants/{id}/revoke",
            post(revoke_participant_handler),
        )
        .route("/admin/bookings", get(list_bookings_handler))
        .route(
            "/admin/bookings/{id}/decision",
            post(decide_booking_handler),
        )
        .route("/admin/bookings/{id}/retry-sync", post(retry_sync_handler))
        .route("/admin/bookings/{id}/reopen", post(reopen_booking_handler))
        .route("/admin/bookings/{id}/cancel", post(cancel_booking_handler))
        .route("/admin/expire", post(expire_due_handler))
        .route(
            "/admin/settings/{key}",
            get(get_setting_handler).put(put_setting_handler),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    Router::new()
        .route("/", get(|| async { "Study slot booking API" }))
        .merge(invite)
        .merge(admin)
        .with_state(state)
}

/// The complete application: API under `/api`, with request tracing.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api", routes(state))
        .layer(TraceLayer::new_for_http())
}
