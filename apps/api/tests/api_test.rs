use axum::http::{Method, StatusCode};
use axum::Router;
use chrono::{Duration, Local};
use serde_json::{json, Value};
use tower::ServiceExt;

use clinic_api::router::create_router;
use shared_utils::test_utils::{json_request, read_json, TestConfig, TestUser};

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(json_request(method, uri, token, body))
        .await
        .unwrap();
    let status = response.status();
    (status, read_json(response).await)
}

async fn login(app: &Router, username: &str, password: &str) -> (StatusCode, Value) {
    send(
        app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "username": username, "password": password })),
    )
    .await
}

fn doctor_ids(listing: &Value) -> Vec<i64> {
    listing["doctors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|doctor| doctor["id"].as_i64().unwrap())
        .collect()
}

#[tokio::test]
async fn test_root_responds() {
    let state = TestConfig::default().state().await;
    let app = create_router(state);

    let response = app
        .oneshot(json_request(Method::GET, "/", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_blacklist_round_trip() {
    let state = TestConfig::default().state().await;
    let app = create_router(state.clone());
    let admin = TestUser::admin(&state).await;
    let patient = TestUser::patient(&state, "penny").await;

    // Admin creates a doctor in Neurology.
    let (status, body) = send(
        &app,
        Method::POST,
        "/doctors",
        Some(&admin.token),
        Some(json!({
            "username": "drnova",
            "email": "nova@clinic.test",
            "contact": "5550111",
            "department_id": 2
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let doctor_id = body["doctor"]["id"].as_i64().unwrap();

    let (status, _) = login(&app, "drnova", "temp123").await;
    assert_eq!(status, StatusCode::OK);

    let (_, listing) = send(&app, Method::GET, "/doctors/departments/2", Some(&patient.token), None).await;
    assert!(doctor_ids(&listing).contains(&doctor_id));

    // Blacklist: login refused, doctor hidden from discovery.
    let uri = format!("/doctors/{}/blacklist", doctor_id);
    let (status, body) = send(&app, Method::POST, &uri, Some(&admin.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["blacklisted"], true);

    let (status, _) = login(&app, "drnova", "temp123").await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, listing) = send(&app, Method::GET, "/doctors/departments/2", Some(&patient.token), None).await;
    assert!(!doctor_ids(&listing).contains(&doctor_id));

    // Toggle back: everything is restored.
    let (_, body) = send(&app, Method::POST, &uri, Some(&admin.token), None).await;
    assert_eq!(body["blacklisted"], false);

    let (status, _) = login(&app, "drnova", "temp123").await;
    assert_eq!(status, StatusCode::OK);

    let (_, listing) = send(&app, Method::GET, "/doctors/departments/2", Some(&patient.token), None).await;
    assert!(doctor_ids(&listing).contains(&doctor_id));
}

#[tokio::test]
async fn test_booking_flow_across_cells() {
    let state = TestConfig::default().state().await;
    let app = create_router(state.clone());

    let (status, _) = send(
        &app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({
            "username": "quinn",
            "email": "quinn@example.com",
            "password": "secret1",
            "contact": "5550199",
            "age": 41,
            "gender": "female"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = login(&app, "quinn", "secret1").await;
    assert_eq!(status, StatusCode::OK);
    let patient_token = body["session"]["token"].as_str().unwrap().to_string();

    let doctor = TestUser::doctor(&state, "drwells", Some(1)).await;
    let tomorrow = (Local::now().date_naive() + Duration::days(1)).format("%Y-%m-%d").to_string();

    // Doctor opens the morning band tomorrow.
    let (status, _) = send(
        &app,
        Method::PUT,
        "/doctors/me/availability",
        Some(&doctor.token),
        Some(json!({ "availability": [format!("{}_1", tomorrow)] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let slots_uri = format!("/doctors/{}/slots", doctor.id());
    let (_, body) = send(&app, Method::GET, &slots_uri, Some(&patient_token), None).await;
    assert_eq!(body["slots"].as_array().unwrap().len(), 1);

    let booking = json!({
        "doctor_id": doctor.id(),
        "date": tomorrow,
        "time": "08:00 - 12:00"
    });
    let (status, body) = send(&app, Method::POST, "/appointments", Some(&patient_token), Some(booking.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    let appointment_id = body["appointment"]["id"].as_i64().unwrap();
    assert_eq!(body["appointment"]["status"], "Booked");

    let (status, _) = send(&app, Method::POST, "/appointments", Some(&patient_token), Some(booking)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, body) = send(&app, Method::GET, "/patients/me/dashboard", Some(&patient_token), None).await;
    assert_eq!(body["dashboard"]["appointments"].as_array().unwrap().len(), 1);

    // Doctor completes with a diagnosis; it lands in the patient's history.
    let uri = format!("/appointments/{}/complete", appointment_id);
    let (status, body) = send(
        &app,
        Method::POST,
        &uri,
        Some(&doctor.token),
        Some(json!({ "diagnosis": "Seasonal allergies" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["appointment"]["status"], "Completed");

    let (_, body) = send(&app, Method::GET, "/patients/me/history", Some(&patient_token), None).await;
    assert_eq!(body["past_appointments"].as_array().unwrap().len(), 1);

    let (_, body) = send(&app, Method::GET, "/admin/dashboard", Some(&TestUser::admin(&state).await.token), None).await;
    assert_eq!(body["dashboard"]["total_appointments"], 1);
}
