use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use studyslot_backend::{app, build_state};
use studyslot_config::{AdminConfig, AppConfig};
use tower::ServiceExt;

const TOKEN: &str = "test-admin-token";

async fn test_app() -> Router {
    let config = AppConfig {
        use_gcal: false,
        admin: Some(AdminConfig {
            api_token: TOKEN.to_string(),
            name: "tester".to_string(),
        }),
        ..AppConfig::default()
    };
    app(build_state(Arc::new(config)).await.unwrap())
}

async fn send(app: &Router, method: &str, uri: &str, admin: bool, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if admin {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {TOKEN}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn invite(app: &Router, name: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/admin/participants",
        true,
        Some(json!({ "name": name, "email": format!("{name}@example.org") })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["booking_link"].as_str().unwrap().ends_with(body["token"].as_str().unwrap()));
    body["token"].as_str().unwrap().to_string()
}

async fn first_available(app: &Router, token: &str) -> String {
    let (status, body) = send(app, "GET", &format!("/api/invite/{token}/availability"), false, None).await;
    assert_eq!(status, StatusCode::OK);
    body["days"]
        .as_array()
        .unwrap()
        .iter()
        .flat_map(|day| day["slots"].as_array().unwrap().iter())
        .find(|s| s["state"] == "available")
        .map(|s| s["slot"]["start"].as_str().unwrap().to_string())
        .expect("an available slot in the coming week")
}

#[tokio::test]
async fn test_admin_routes_require_token() {
    let app = test_app().await;

    let (status, _) = send(&app, "GET", "/api/admin/bookings", false, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&app, "GET", "/api/admin/bookings", true, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_unknown_invite_token_is_not_found() {
    let app = test_app().await;
    let (status, body) = send(&app, "GET", "/api/invite/nope/availability", false, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_book_approve_and_confirm() {
    let app = test_app().await;
    let token = invite(&app, "ada").await;
    let slot = first_available(&app, &token).await;

    let (status, booking) = send(
        &app,
        "POST",
        &format!("/api/invite/{token}/bookings"),
        false,
        Some(json!({ "slot_start": slot })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(booking["status"], "pending");

    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/invite/{token}/bookings"),
        false,
        Some(json!({ "slot_start": slot })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT, "second active booking is refused");

    let id = booking["id"].as_i64().unwrap();
    let (status, decision) = send(
        &app,
        "POST",
        &format!("/api/admin/bookings/{id}/decision"),
        true,
        Some(json!({ "decision": "approve" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decision["outcome"], "confirmed");
    assert_eq!(decision["booking"]["status"], "confirmed");
    assert_eq!(decision["booking"]["decided_by"], "tester");
    assert!(decision["booking"]["external_event"].is_string());

    let (status, confirmed) = send(&app, "GET", "/api/admin/bookings?status=confirmed", true, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(confirmed.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_revoked_link_cannot_book() {
    let app = test_app().await;
    let token = invite(&app, "bob").await;
    let slot = first_available(&app, &token).await;

    let (_, participants) = send(&app, "GET", "/api/admin/participants", true, None).await;
    let id = participants[0]["id"].as_i64().unwrap();
    let (status, _) = send(&app, "POST", &format!("/api/admin/participants/{id}/revoke"), true, None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/invite/{token}/bookings"),
        false,
        Some(json!({ "slot_start": slot })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_participant_cancels_own_booking() {
    let app = test_app().await;
    let token = invite(&app, "cy").await;
    let slot = first_available(&app, &token).await;
    let (_, booking) = send(
        &app,
        "POST",
        &format!("/api/invite/{token}/bookings"),
        false,
        Some(json!({ "slot_start": slot })),
    )
    .await;
    let id = booking["id"].as_i64().unwrap();

    let (status, cancelled) = send(
        &app,
        "POST",
        &format!("/api/invite/{token}/bookings/{id}/cancel"),
        false,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["status"], "cancelled");
}

#[tokio::test]
async fn test_invalid_status_filter_is_bad_request() {
    let app = test_app().await;
    let (status, _) = send(&app, "GET", "/api/admin/bookings?status=lost", true, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

async fn text(app: &Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test]
async fn test_wrong_admin_token_is_rejected() {
    let app = test_app().await;
    let request = Request::builder()
        .uri("/api/admin/bookings")
        .header(header::AUTHORIZATION, "Bearer test-admin-tokem")
        .body(Body::empty())
        .unwrap();

    let (status, _) = text(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_edited_consent_is_served() {
    let app = test_app().await;

    let (status, body) = send(&app, "GET", "/api/admin/settings/consent_html", true, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["value"].as_str().unwrap().contains("Consent Form"));

    let (status, _) = send(
        &app,
        "PUT",
        "/api/admin/settings/consent_html",
        true,
        Some(json!({ "value": "<p>I agree to take part.</p>" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let request = Request::builder()
        .uri("/api/consent")
        .body(Body::empty())
        .unwrap();
    let (status, html) = text(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("<p>I agree to take part.</p>"));
}

#[tokio::test]
async fn test_unknown_setting_is_not_found() {
    let app = test_app().await;
    let (status, _) = send(
        &app,
        "PUT",
        "/api/admin/settings/smtp_password",
        true,
        Some(json!({ "value": "x" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_deleting_participant_frees_their_slot() {
    let app = test_app().await;
    let ada = invite(&app, "ada").await;
    let bob = invite(&app, "bob").await;
    let slot = first_available(&app, &ada).await;
    let (status, booking) = send(
        &app,
        "POST",
        &format!("/api/invite/{ada}/bookings"),
        false,
        Some(json!({ "slot_start": slot })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let ada_id = booking["participant_id"].as_i64().unwrap();
    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/admin/participants/{ada_id}"),
        true,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/invite/{bob}/bookings"),
        false,
        Some(json!({ "slot_start": slot })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, cancelled) = send(&app, "GET", "/api/admin/bookings?status=cancelled", true, None).await;
    assert_eq!(cancelled[0]["id"], booking["id"]);
}
