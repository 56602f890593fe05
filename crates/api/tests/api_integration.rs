//! Integration tests for the API server.

use std::sync::OnceLock;

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use booking::Money;
use chrono::{Duration, TimeZone, Utc};
use common::FlightNumber;
use metrics_exporter_prometheus::PrometheusHandle;
use saga::FlightDetails;
use serde_json::{Value, json};
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

fn flight(number: &str) -> FlightDetails {
    FlightDetails {
        flight_number: FlightNumber::new(number),
        airline: "IndiGo".to_string(),
        source: "BOM".to_string(),
        destination: "GOI".to_string(),
        departure_time: Utc.with_ymd_and_hms(2025, 6, 1, 7, 30, 0).unwrap(),
        arrival_time: Utc.with_ymd_and_hms(2025, 6, 1, 8, 40, 0).unwrap(),
        total_seats: 6,
        price: Money::from_cents(350_000),
    }
}

async fn setup() -> axum::Router {
    let (state, catalog) = api::create_default_state();
    api::seed_in_memory(&state, &catalog, vec![flight("6E201"), flight("6E202")])
        .await
        .unwrap();
    api::create_app(state, get_metrics_handle())
}

fn travel_date() -> String {
    (Utc::now().date_naive() + Duration::days(10)).to_string()
}

fn booking_body(seats: &[&str]) -> Value {
    json!({
        "flight_number": "6E201",
        "travel_date": travel_date(),
        "seats_booked": seats.len(),
        "passengers": seats.iter().map(|seat| json!({
            "name": format!("Guest {seat}"),
            "gender": "MALE",
            "meal_preference": "VEG",
            "seat_number": seat,
        })).collect::<Vec<_>>(),
    })
}

fn request(method: &str, uri: &str, user: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder
            .header("x-user-id", user)
            .header("x-user-email", format!("{user}@example.com"))
            .header("x-user-role", "CUSTOMER");
    }
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn json_body(response: Response<Body>) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

async fn create_booking(app: &axum::Router, user: &str, seats: &[&str]) -> String {
    let response = app
        .clone()
        .oneshot(request("POST", "/bookings", Some(user), Some(booking_body(seats))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = json_body(response).await;
    json["reservation_code"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_check() {
    let app = setup().await;

    let response = app
        .oneshot(request("GET", "/health", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["storage"], "memory");
}

#[tokio::test]
async fn test_create_booking() {
    let app = setup().await;

    let response = app
        .oneshot(request(
            "POST",
            "/bookings",
            Some("alice"),
            Some(booking_body(&["1A", "1B"])),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = json_body(response).await;
    assert_eq!(json["status"], "CONFIRMED");
    assert_eq!(json["message"], "Booking created successfully");
    assert_eq!(json["reservation_code"].as_str().unwrap().len(), 8);
}

#[tokio::test]
async fn test_get_and_list_bookings() {
    let app = setup().await;
    let code = create_booking(&app, "alice", &["1C"]).await;

    let response = app
        .clone()
        .oneshot(request("GET", &format!("/bookings/{code}"), Some("alice"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["flight_number"], "6E201");
    assert_eq!(json["seats_booked"], 1);
    assert_eq!(json["amount"], 350_000);
    assert_eq!(json["passengers"][0]["seat_number"], "1C");

    let response = app
        .oneshot(request("GET", "/bookings/my", Some("alice"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_other_user_is_denied() {
    let app = setup().await;
    let code = create_booking(&app, "alice", &["1A"]).await;

    let response = app
        .clone()
        .oneshot(request("GET", &format!("/bookings/{code}"), Some("bob"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(json_body(response).await["error"], "ACCESS_DENIED");

    let response = app
        .oneshot(request(
            "DELETE",
            &format!("/bookings/cancel/{code}"),
            Some("bob"),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_cancel_booking() {
    let app = setup().await;
    let code = create_booking(&app, "alice", &["1A", "1B"]).await;
    let uri = format!("/bookings/cancel/{code}");

    let response = app
        .clone()
        .oneshot(request("DELETE", &uri, Some("alice"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["status"], "CANCELLED");
    assert_eq!(json["message"], "Booking cancelled successfully");

    let response = app
        .clone()
        .oneshot(request("DELETE", &uri, Some("alice"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(json_body(response).await["error"], "ALREADY_CANCELLED");

    // Seats are free again.
    create_booking(&app, "bob", &["1A", "1B"]).await;
}

#[tokio::test]
async fn test_taken_seat_conflict() {
    let app = setup().await;
    create_booking(&app, "alice", &["1A"]).await;

    let response = app
        .oneshot(request(
            "POST",
            "/bookings",
            Some("bob"),
            Some(booking_body(&["1A", "1B"])),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let json = json_body(response).await;
    assert_eq!(json["error"], "SEAT_UNAVAILABLE");
    assert!(json["message"].as_str().unwrap().contains("1A"));
}

#[tokio::test]
async fn test_validation_failure() {
    let app = setup().await;
    let mut body = booking_body(&["1A"]);
    body["seats_booked"] = json!(2);

    let response = app
        .oneshot(request("POST", "/bookings", Some("alice"), Some(body)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "INVALID_REQUEST");
}

#[tokio::test]
async fn test_malformed_body() {
    let app = setup().await;

    let response = app
        .oneshot(request(
            "POST",
            "/bookings",
            Some("alice"),
            Some(json!({ "flight_number": "6E201" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "INVALID_REQUEST");
}

#[tokio::test]
async fn test_unknown_flight() {
    let app = setup().await;
    let mut body = booking_body(&["1A"]);
    body["flight_number"] = json!("XX999");

    let response = app
        .oneshot(request("POST", "/bookings", Some("alice"), Some(body)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_missing_identity() {
    let app = setup().await;

    let response = app
        .oneshot(request("GET", "/bookings/my", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["error"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_unknown_booking() {
    let app = setup().await;

    let response = app
        .oneshot(request("GET", "/bookings/FFFFFFFF", Some("alice"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response).await["error"], "NOT_FOUND");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = setup().await;
    create_booking(&app, "alice", &["1D"]).await;

    let response = app
        .oneshot(request("GET", "/metrics", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("booking_saga_executions_total"));
}
