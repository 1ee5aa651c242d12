use std::sync::Arc;

use assert_matches::assert_matches;
use axum::http::{Method, StatusCode};
use axum::Router;
use chrono::{Duration, Local};
use serde_json::{json, Value};
use tower::ServiceExt;

use patient_cell::router::patient_routes;
use patient_cell::{AddHistoryRequest, PatientError, PatientService, UpdateProfileRequest};
use shared_database::repository::appointments::{self, NewAppointment};
use shared_database::repository::users;
use shared_database::AppState;
use shared_models::AppointmentStatus;
use shared_utils::test_utils::{json_request, read_json, TestConfig, TestUser};

async fn setup() -> (Arc<AppState>, Router, TestUser, TestUser) {
    let state = TestConfig::default().state().await;
    let patient = TestUser::patient(&state, "alice").await;
    let doctor = TestUser::doctor(&state, "drheart", Some(1)).await;
    let app = patient_routes(state.clone());
    (state, app, patient, doctor)
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

async fn seed_appointment(state: &AppState, patient: &TestUser, doctor: &TestUser, status: AppointmentStatus) -> i64 {
    let (patient_id, doctor_id) = (patient.id(), doctor.id());
    let date = Local::now().date_naive() + Duration::days(2);
    state
        .db
        .call(|conn| {
            let appointment = appointments::insert(
                conn,
                &NewAppointment {
                    patient_id,
                    doctor_id,
                    date,
                    time: "12:00 - 16:00",
                    status: AppointmentStatus::Booked,
                },
            )?;
            if status != AppointmentStatus::Booked {
                appointments::update_status(conn, appointment.id, status, Some("Checked"))?;
            }
            Ok::<_, shared_database::DatabaseError>(appointment.id)
        })
        .await
        .unwrap()
}

#[tokio::test]
async fn test_dashboard_shows_departments_and_appointments() {
    let (state, app, patient, doctor) = setup().await;
    seed_appointment(&state, &patient, &doctor, AppointmentStatus::Booked).await;

    let (status, body) = send(&app, Method::GET, "/me/dashboard", &patient, None).await;
    assert_eq!(status, StatusCode::OK);

    let dashboard = &body["dashboard"];
    assert_eq!(dashboard["user"]["username"], "alice");
    assert_eq!(dashboard["departments"].as_array().unwrap().len(), 5);

    let appointments = dashboard["appointments"].as_array().unwrap();
    assert_eq!(appointments.len(), 1);
    assert_eq!(appointments[0]["doctor_name"], "drheart");
    assert_eq!(appointments[0]["department"], "Cardiology");
    assert_eq!(appointments[0]["status"], "Booked");
}

#[tokio::test]
async fn test_dashboard_keeps_appointments_of_deleted_doctor() {
    let (state, app, patient, doctor) = setup().await;
    seed_appointment(&state, &patient, &doctor, AppointmentStatus::Booked).await;
    let doctor_user = doctor.user_id;
    state.db.call(|conn| users::delete_user(conn, doctor_user)).await.unwrap();

    let (_, body) = send(&app, Method::GET, "/me/dashboard", &patient, None).await;
    let appointments = body["dashboard"]["appointments"].as_array().unwrap();
    assert_eq!(appointments.len(), 1);
    assert!(appointments[0]["doctor_id"].is_null());
    assert!(appointments[0]["doctor_name"].is_null());
}

#[tokio::test]
async fn test_patient_endpoints_reject_other_roles() {
    let (_state, app, _patient, doctor) = setup().await;

    let (status, _) = send(&app, Method::GET, "/me/dashboard", &doctor, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send(&app, Method::GET, "/me/history", &doctor, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_update_profile_changes_fields_and_keeps_password_when_blank() {
    let (state, app, patient, _doctor) = setup().await;

    let (status, body) = send(
        &app,
        Method::PUT,
        "/me/profile",
        &patient,
        Some(json!({
            "username": "alice2",
            "email": "alice2@example.com",
            "password": "",
            "contact": "5550456",
            "age": 41,
            "gender": "female"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["username"], "alice2");
    assert_eq!(body["user"]["age"], 41);

    let can_login = state
        .db
        .call(|conn| users::find_by_credentials(conn, "alice2", "password"))
        .await
        .unwrap();
    assert!(can_login.is_some());

    // Keeping one's own username and email is not a conflict.
    let (status, _) = send(
        &app,
        Method::PUT,
        "/me/profile",
        &patient,
        Some(json!({"username": "alice2", "email": "alice2@example.com", "password": "newpass"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let can_login = state
        .db
        .call(|conn| users::find_by_credentials(conn, "alice2", "newpass"))
        .await
        .unwrap();
    assert!(can_login.is_some());
}

#[tokio::test]
async fn test_update_profile_rejects_taken_username_or_email() {
    let (_state, app, patient, _doctor) = setup().await;

    for (username, email) in [("drheart", "fresh@example.com"), ("fresh", "drheart@example.com")] {
        let (status, body) = send(
            &app,
            Method::PUT,
            "/me/profile",
            &patient,
            Some(json!({"username": username, "email": email})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "Username or email already in use");
    }

    let (status, _) = send(
        &app,
        Method::PUT,
        "/me/profile",
        &patient,
        Some(json!({"username": "alice", "email": "broken"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_doctor_records_history_and_patient_reads_it_newest_first() {
    let (state, app, patient, doctor) = setup().await;
    seed_appointment(&state, &patient, &doctor, AppointmentStatus::Completed).await;

    let (status, body) = send(&app, Method::GET, &format!("/{}/history-context", patient.id()), &doctor, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["patient_details"]["patient_name"], "alice");
    assert_eq!(body["patient_details"]["doctor_name"], "drheart");
    assert_eq!(body["patient_details"]["department"], "Cardiology");

    for (visit, diagnosis) in [("Consultation", "Hypertension"), ("Follow-up", "Stable")] {
        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/{}/history", patient.id()),
            &doctor,
            Some(json!({"visit_type": visit, "diagnosis": diagnosis})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["record"]["created_by"], doctor.user_id);
    }

    let (status, body) = send(&app, Method::GET, "/me/history", &patient, None).await;
    assert_eq!(status, StatusCode::OK);
    let history = body["history"].as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["visit_type"], "Follow-up");
    assert_eq!(history[1]["visit_type"], "Consultation");

    let past = body["past_appointments"].as_array().unwrap();
    assert_eq!(past.len(), 1);
    assert_eq!(past[0]["status"], "Completed");
    assert_eq!(past[0]["diagnosis"], "Checked");
}

#[tokio::test]
async fn test_history_recording_is_doctor_only_and_validated() {
    let (_state, app, patient, doctor) = setup().await;
    let uri = format!("/{}/history", patient.id());
    let record = json!({"visit_type": "Consultation", "diagnosis": "Cold"});

    let (status, _) = send(&app, Method::POST, &uri, &patient, Some(record.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        Method::POST,
        &uri,
        &doctor,
        Some(json!({"visit_type": "Consultation", "diagnosis": "  "})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, Method::POST, "/9999/history", &doctor, Some(record)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::GET, "/9999/history-context", &doctor, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_service_reports_typed_errors() {
    let (state, _, patient, doctor) = setup().await;
    let other = TestUser::patient(&state, "bruno").await;
    let service = PatientService::new(&state);

    assert_matches!(service.dashboard(&doctor.context()).await, Err(PatientError::NoProfile));

    let taken = UpdateProfileRequest {
        username: other.username.clone(),
        email: "alice-new@example.com".to_string(),
        password: None,
        contact: None,
        age: None,
        gender: None,
    };
    assert_matches!(
        service.update_profile(&patient.context(), taken).await,
        Err(PatientError::DuplicateAccount)
    );

    let record = || AddHistoryRequest {
        visit_type: "Follow-up".to_string(),
        diagnosis: "Stable".to_string(),
    };
    assert_matches!(
        service.add_history(&patient.context(), patient.id(), record()).await,
        Err(PatientError::NotADoctor)
    );
    assert_matches!(
        service.add_history(&doctor.context(), 9_999, record()).await,
        Err(PatientError::NotFound)
    );
    assert_matches!(
        service
            .add_history(
                &doctor.context(),
                patient.id(),
                AddHistoryRequest {
                    visit_type: "  ".to_string(),
                    diagnosis: "Stable".to_string(),
                },
            )
            .await,
        Err(PatientError::Validation(_))
    );
}
