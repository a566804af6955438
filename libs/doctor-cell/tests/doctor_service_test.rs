use assert_matches::assert_matches;
use chrono::{NaiveDate, NaiveTime};
use serde_json::{json, Value};
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use doctor_cell::*;
use shared_api::WebApiClient;
use shared_models::error::AppError;
use shared_models::pagination::PageQuery;
use shared_utils::test_utils::{MockApiResponses, TestConfig, TestUser};

fn api(server: &MockServer, user: TestUser) -> WebApiClient {
    let config = TestConfig::with_base_url(server.uri()).to_app_config();
    WebApiClient::new(&config, user.memory_session()).unwrap()
}

fn doctor_json(id: &str, name: &str, specialization: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "email": format!("{}@rs.id", id),
        "phone": "081234567890",
        "specialization": specialization,
        "licenseNumber": format!("STR-{}", id),
        "room": "Poli 2",
        "isOnDuty": true,
        "createdAt": "2026-01-05T00:00:00Z"
    })
}

#[tokio::test]
async fn test_list_sends_page_and_search() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/web/admin/doctors"))
        .and(query_param("page", "2"))
        .and(query_param("search", "jantung"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockApiResponses::ok(json!({
            "items": [doctor_json("d-11", "dr. Budi, Sp.JP", "Cardiology")],
            "pagination": { "page": 2, "limit": 10, "total": 11, "totalPages": 2 }
        }))))
        .expect(1)
        .mount(&server)
        .await;

    let service = DoctorService::new(api(&server, TestUser::admin("admin@rs.id")));
    let page = service
        .list(&PageQuery {
            page: Some(2),
            limit: None,
            search: Some(" jantung ".into()),
        })
        .await
        .unwrap();

    assert_eq!(page.items.len(), 1);
    assert!(page.items[0].is_active, "missing isActive defaults to active");
    assert!(!page.pagination.has_next());
}

#[tokio::test]
async fn test_blank_search_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let service = DoctorService::new(api(&server, TestUser::admin("admin@rs.id")));
    assert!(service.search("   ").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_local_filter_matches_specialization() {
    let doctors: Vec<Doctor> = vec![
        serde_json::from_value(doctor_json("d-1", "dr. Sari", "Internal Medicine")).unwrap(),
        serde_json::from_value(doctor_json("d-2", "dr. Budi", "Cardiology")).unwrap(),
        serde_json::from_value(doctor_json("d-3", "dr. Rina", "cardiology")).unwrap(),
    ];

    let page = DoctorService::filter_local(&doctors, "CARDIO", 1, 1);

    assert_eq!(page.items[0].id, "d-2");
    assert_eq!(page.pagination.total, 2);
    assert_eq!(page.pagination.total_pages, 2);
}

#[tokio::test]
async fn test_create_validates_before_sending() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let service = DoctorService::new(api(&server, TestUser::admin("admin@rs.id")));
    let err = service
        .create(&CreateDoctorRequest {
            name: "dr. Rina".into(),
            email: "rina@rs.id".into(),
            password: "rahasia123".into(),
            specialization: "Pediatrics".into(),
            ..Default::default()
        })
        .await
        .unwrap_err();

    assert_matches!(err, AppError::Validation { ref fields, .. } if fields.contains_key("licenseNumber"));
}

#[tokio::test]
async fn test_create_surfaces_server_field_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/web/admin/doctors"))
        .respond_with(
            ResponseTemplate::new(422)
                .set_body_json(MockApiResponses::validation_failure("email", "Email already registered")),
        )
        .mount(&server)
        .await;

    let service = DoctorService::new(api(&server, TestUser::admin("admin@rs.id")));
    let err = service
        .create(&CreateDoctorRequest {
            name: "dr. Rina".into(),
            email: "rina@rs.id".into(),
            password: "rahasia123".into(),
            specialization: "Pediatrics".into(),
            license_number: "STR-77".into(),
            ..Default::default()
        })
        .await
        .unwrap_err();

    assert_eq!(err.field_errors().unwrap()["email"], "Email already registered");
}

#[tokio::test]
async fn test_update_and_delete() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/web/admin/doctors/d-1"))
        .and(body_json(json!({ "room": "Poli 5" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockApiResponses::ok(doctor_json("d-1", "dr. Sari", "Internal Medicine"))))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/web/admin/doctors/d-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockApiResponses::ok_message("Doctor deleted")))
        .expect(1)
        .mount(&server)
        .await;

    let service = DoctorService::new(api(&server, TestUser::admin("admin@rs.id")));
    let updated = service
        .update(
            "d-1",
            &UpdateDoctorRequest {
                room: Some("Poli 5".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.id, "d-1");

    assert_matches!(service.update("d-1", &UpdateDoctorRequest::default()).await, Err(AppError::Validation { .. }));
    service.delete("d-1").await.unwrap();
}

fn week_json() -> Value {
    json!({
        "weekStart": "2026-10-12",
        "weekEnd": "2026-10-18",
        "days": [
            {
                "date": "2026-10-12",
                "slots": [
                    { "id": "s-1", "startTime": "08:00:00", "endTime": "08:30:00", "status": "BOOKED", "patientName": "Ahmad" },
                    { "id": "s-2", "startTime": "08:30:00", "endTime": "09:00:00", "status": "AVAILABLE" }
                ]
            },
            { "date": "2026-10-13", "slots": [] }
        ]
    })
}

#[tokio::test]
async fn test_week_schedule_requests_monday() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/web/doctor/schedules/week"))
        .and(query_param("startDate", "2026-10-12"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockApiResponses::ok(week_json())))
        .expect(1)
        .mount(&server)
        .await;

    let service = ScheduleService::new(api(&server, TestUser::doctor("sari@rs.id")));
    let week = service.week(NaiveDate::from_ymd_opt(2026, 10, 15).unwrap()).await.unwrap();

    let monday = week.day(NaiveDate::from_ymd_opt(2026, 10, 12).unwrap()).unwrap();
    assert_eq!(monday.available_slots(), 1);
    assert_eq!(monday.slots[0].duration_minutes(), 30);
    assert_eq!(week.booked_count(), 1);
}

#[tokio::test]
async fn test_current_week_and_upcoming() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/web/doctor/schedules/current-week"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockApiResponses::ok(week_json())))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/web/doctor/schedules/upcoming"))
        .and(query_param("days", "31"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockApiResponses::ok(json!([
            { "date": "2026-10-19", "id": "s-9", "startTime": "13:00:00", "endTime": "13:45:00", "status": "AVAILABLE", "room": "Poli 2" }
        ]))))
        .mount(&server)
        .await;

    let service = ScheduleService::new(api(&server, TestUser::doctor("sari@rs.id")));
    let week = service.current_week().await.unwrap();
    assert_eq!(week.days.len(), 2);

    let upcoming = service.upcoming(Some(90)).await.unwrap();
    assert_eq!(upcoming[0].slot.start_time, NaiveTime::from_hms_opt(13, 0, 0).unwrap());
    assert_eq!(upcoming[0].slot.room.as_deref(), Some("Poli 2"));
}
