use std::sync::Arc;

use assert_matches::assert_matches;
use axum::http::{Method, StatusCode};
use axum::Router;
use chrono::{Duration, Local, NaiveDate};
use serde_json::{json, Value};
use tower::ServiceExt;

use appointment_cell::models::AppointmentError;
use appointment_cell::router::appointment_routes;
use appointment_cell::services::AppointmentBookingService;
use doctor_cell::services::AvailabilityService;
use shared_database::repository::{appointments, doctors};
use shared_database::AppState;
use shared_utils::test_utils::{json_request, read_json, TestConfig, TestUser};

const MORNING: &str = "08:00 - 12:00";

struct Clinic {
    state: Arc<AppState>,
    app: Router,
    doctor: TestUser,
    other_doctor: TestUser,
    alice: TestUser,
    bob: TestUser,
    admin: TestUser,
}

fn tomorrow() -> NaiveDate {
    Local::now().date_naive() + Duration::days(1)
}

async fn clinic() -> Clinic {
    let state = TestConfig::default().state().await;
    let doctor = TestUser::doctor(&state, "drmorning", Some(1)).await;
    let other_doctor = TestUser::doctor(&state, "drother", Some(2)).await;
    let alice = TestUser::patient(&state, "alice").await;
    let bob = TestUser::patient(&state, "bob").await;
    let admin = TestUser::admin(&state).await;

    AvailabilityService::new(&state)
        .publish_availability(doctor.id(), &[format!("{}_1", tomorrow()), format!("{}_2", tomorrow())])
        .await
        .unwrap();

    let app = appointment_routes(state.clone());
    Clinic { state, app, doctor, other_doctor, alice, bob, admin }
}

async fn send(app: &Router, method: Method, uri: &str, user: &TestUser, body: Option<Value>) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(json_request(method, uri, Some(&user.token), body))
        .await
        .unwrap();
    let status = response.status();
    (status, read_json(response).await)
}

async fn book(clinic: &Clinic, patient: &TestUser, time: &str) -> (StatusCode, Value) {
    send(
        &clinic.app,
        Method::POST,
        "/",
        patient,
        Some(json!({
            "doctor_id": clinic.doctor.id(),
            "date": tomorrow().to_string(),
            "time": time
        })),
    )
    .await
}

#[tokio::test]
async fn test_patient_books_open_slot_as_booked() {
    let clinic = clinic().await;

    let (status, body) = book(&clinic, &clinic.alice, MORNING).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["appointment"]["status"], "Booked");
    assert_eq!(body["appointment"]["time"], MORNING);
    assert_eq!(body["appointment"]["date"], tomorrow().to_string());
    assert_eq!(body["appointment"]["patient_id"], clinic.alice.id());
    assert_eq!(body["appointment"]["doctor_id"], clinic.doctor.id());
}

#[tokio::test]
async fn test_band_key_is_accepted_as_time() {
    let clinic = clinic().await;

    let (status, body) = book(&clinic, &clinic.alice, "2").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["appointment"]["time"], "12:00 - 16:00");
}

#[tokio::test]
async fn test_second_booking_of_same_slot_conflicts() {
    let clinic = clinic().await;

    let (status, _) = book(&clinic, &clinic.alice, MORNING).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = book(&clinic, &clinic.bob, MORNING).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "This slot is already booked. Please choose another.");
}

#[tokio::test]
async fn test_booking_requires_an_open_slot_and_valid_fields() {
    let clinic = clinic().await;

    // Evening was never published.
    let (status, _) = book(&clinic, &clinic.alice, "16:00 - 20:00").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = book(&clinic, &clinic.alice, "teatime").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &clinic.app,
        Method::POST,
        "/",
        &clinic.alice,
        Some(json!({"doctor_id": clinic.doctor.id(), "date": "next week", "time": MORNING})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &clinic.app,
        Method::POST,
        "/",
        &clinic.alice,
        Some(json!({"doctor_id": 4242, "date": tomorrow().to_string(), "time": MORNING})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_only_patients_book() {
    let clinic = clinic().await;

    for user in [&clinic.doctor, &clinic.admin] {
        let (status, _) = book(&clinic, user, MORNING).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }
}

#[tokio::test]
async fn test_blacklisted_doctor_cannot_be_booked() {
    let clinic = clinic().await;
    let doctor_id = clinic.doctor.id();
    clinic
        .state
        .db
        .call(|conn| doctors::toggle_blacklist(conn, doctor_id))
        .await
        .unwrap();

    let (status, _) = book(&clinic, &clinic.alice, MORNING).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_booking_does_not_retract_the_slot() {
    let clinic = clinic().await;

    let (status, _) = book(&clinic, &clinic.alice, MORNING).await;
    assert_eq!(status, StatusCode::CREATED);

    // The booked band is still listed as open; the active-slot constraint is
    // what keeps a second patient out.
    let open = AvailabilityService::new(&clinic.state)
        .list_open_slots(clinic.doctor.id())
        .await
        .unwrap();
    assert!(open.iter().any(|s| s.date == tomorrow() && s.time_slot == MORNING && s.is_available));
    assert_eq!(open.len(), 2);
}

#[tokio::test]
async fn test_concurrent_bookings_for_same_slot_admit_exactly_one() {
    let clinic = clinic().await;
    let service = AppointmentBookingService::new(&clinic.state);
    let doctor_id = clinic.doctor.id();

    let (first, second) = futures::join!(
        service.book(clinic.alice.id(), doctor_id, tomorrow(), MORNING),
        service.book(clinic.bob.id(), doctor_id, tomorrow(), MORNING),
    );

    let outcomes = [first, second];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    let loser = outcomes.into_iter().find(|r| r.is_err()).unwrap();
    assert_matches!(loser, Err(AppointmentError::ConflictDetected));

    let active = clinic
        .state
        .db
        .call(|conn| appointments::count_active_at(conn, doctor_id, tomorrow(), MORNING))
        .await
        .unwrap();
    assert_eq!(active, 1);
}

#[tokio::test]
async fn test_many_concurrent_bookings_admit_exactly_one() {
    let clinic = clinic().await;
    let doctor_id = clinic.doctor.id();

    let mut patients = Vec::new();
    for i in 0..8 {
        patients.push(TestUser::patient(&clinic.state, &format!("rush{}", i)).await);
    }

    let service = AppointmentBookingService::new(&clinic.state);
    let attempts = patients
        .iter()
        .map(|p| service.book(p.id(), doctor_id, tomorrow(), MORNING));
    let results = futures::future::join_all(attempts).await;

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| matches!(e, AppointmentError::ConflictDetected)));
}

#[tokio::test]
async fn test_owner_cancels_and_slot_can_be_rebooked() {
    let clinic = clinic().await;
    let (_, body) = book(&clinic, &clinic.alice, MORNING).await;
    let id = body["appointment"]["id"].as_i64().unwrap();

    let (status, body) = send(&clinic.app, Method::POST, &format!("/{}/cancel", id), &clinic.alice, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["appointment"]["status"], "Cancelled");

    // Cancelled is terminal.
    let (status, _) = send(&clinic.app, Method::POST, &format!("/{}/cancel", id), &clinic.alice, None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    // The cancelled appointment no longer holds the slot.
    let (status, _) = book(&clinic, &clinic.bob, MORNING).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_non_owner_cannot_cancel() {
    let clinic = clinic().await;
    let (_, body) = book(&clinic, &clinic.alice, MORNING).await;
    let id = body["appointment"]["id"].as_i64().unwrap();

    for user in [&clinic.bob, &clinic.other_doctor, &clinic.admin] {
        let (status, body) = send(&clinic.app, Method::POST, &format!("/{}/cancel", id), user, None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "Unauthorized access to appointment");
    }

    let service = AppointmentBookingService::new(&clinic.state);
    assert_matches!(
        service.cancel(&clinic.bob.context(), id).await,
        Err(AppointmentError::UnauthorizedAccess)
    );

    // The assigned doctor may cancel.
    let (status, _) = send(&clinic.app, Method::POST, &format!("/{}/cancel", id), &clinic.doctor, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_assigned_doctor_completes_with_diagnosis() {
    let clinic = clinic().await;
    let (_, body) = book(&clinic, &clinic.alice, MORNING).await;
    let id = body["appointment"]["id"].as_i64().unwrap();

    for user in [&clinic.alice, &clinic.other_doctor, &clinic.admin] {
        let (status, _) = send(&clinic.app, Method::POST, &format!("/{}/complete", id), user, None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    let (status, body) = send(
        &clinic.app,
        Method::POST,
        &format!("/{}/complete", id),
        &clinic.doctor,
        Some(json!({"diagnosis": "Seasonal flu"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["appointment"]["status"], "Completed");
    assert_eq!(body["appointment"]["diagnosis"], "Seasonal flu");

    // Completed is terminal for both operations.
    let (status, _) = send(&clinic.app, Method::POST, &format!("/{}/complete", id), &clinic.doctor, None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, _) = send(&clinic.app, Method::POST, &format!("/{}/cancel", id), &clinic.alice, None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_complete_without_body_keeps_diagnosis_empty() {
    let clinic = clinic().await;
    let (_, body) = book(&clinic, &clinic.alice, MORNING).await;
    let id = body["appointment"]["id"].as_i64().unwrap();

    let (status, body) = send(&clinic.app, Method::POST, &format!("/{}/complete", id), &clinic.doctor, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["appointment"]["diagnosis"].is_null());
}

#[tokio::test]
async fn test_get_appointment_visibility() {
    let clinic = clinic().await;
    let (_, body) = book(&clinic, &clinic.alice, MORNING).await;
    let id = body["appointment"]["id"].as_i64().unwrap();

    for user in [&clinic.alice, &clinic.doctor, &clinic.admin] {
        let (status, body) = send(&clinic.app, Method::GET, &format!("/{}", id), user, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["appointment"]["id"], id);
    }
    for user in [&clinic.bob, &clinic.other_doctor] {
        let (status, _) = send(&clinic.app, Method::GET, &format!("/{}", id), user, None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    let (status, _) = send(&clinic.app, Method::GET, "/9999", &clinic.admin, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
