use assert_matches::assert_matches;
use serde_json::{json, Value};
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use prescription_cell::*;
use shared_api::WebApiClient;
use shared_models::error::AppError;
use shared_utils::test_utils::{MockApiResponses, TestConfig, TestUser};

fn api(server: &MockServer) -> WebApiClient {
    let config = TestConfig::with_base_url(server.uri()).to_app_config();
    WebApiClient::new(&config, TestUser::doctor("sari@rs.id").memory_session()).unwrap()
}

fn prescription_json(id: &str, status: &str) -> Value {
    json!({
        "id": id,
        "prescriptionNumber": format!("RX-{}", id),
        "patient": { "id": "p-1", "name": "Siti Aminah", "nik": "3201234567890123" },
        "consultationId": "c-1",
        "diagnosis": "Faringitis akut",
        "items": [
            {
                "medicationId": "m-1",
                "medicationName": "Amoxicillin 500 mg",
                "dosage": "500 mg",
                "frequency": "3x sehari",
                "durationDays": 5,
                "quantity": 15
            },
            {
                "medicationId": "m-2",
                "medicationName": "Paracetamol 500 mg",
                "dosage": "500 mg",
                "frequency": "bila demam",
                "durationDays": 3,
                "quantity": 10,
                "instructions": "maksimal 4x sehari"
            }
        ],
        "status": status,
        "createdAt": "2026-10-18T02:15:00Z"
    })
}

#[tokio::test]
async fn test_today_lists_prescriptions() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/web/doctor/prescriptions/today"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockApiResponses::ok(json!([
            prescription_json("1", "PENDING"),
            prescription_json("2", "DISPENSED")
        ]))))
        .mount(&server)
        .await;

    let today = PrescriptionService::new(api(&server)).today().await.unwrap();

    assert_eq!(today.len(), 2);
    assert_eq!(today[1].status, PrescriptionStatus::Dispensed);
    assert_eq!(today[0].total_quantity(), 25);
    assert_eq!(today[0].patient.masked_nik().as_deref(), Some("3201****0123"));
}

#[tokio::test]
async fn test_history_and_detail() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/web/doctor/prescriptions/history"))
        .and(query_param("patientId", "p-1"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockApiResponses::ok(json!({
            "items": [prescription_json("7", "CANCELLED")],
            "pagination": { "page": 1, "limit": 10, "total": 1, "totalPages": 1 }
        }))))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/web/doctor/prescriptions/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockApiResponses::ok(prescription_json("7", "CANCELLED"))))
        .mount(&server)
        .await;

    let service = PrescriptionService::new(api(&server));
    let history = service
        .history(&PrescriptionHistoryQuery {
            page: Some(1),
            patient_id: Some("p-1".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(history.items[0].prescription_number, "RX-7");

    let detail = service.detail("7").await.unwrap();
    assert_eq!(detail.items[1].instructions.as_deref(), Some("maksimal 4x sehari"));
}

#[tokio::test]
async fn test_create_posts_validated_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/web/doctor/prescriptions"))
        .and(body_json(json!({
            "patientId": "p-1",
            "consultationId": "c-1",
            "diagnosis": "Faringitis akut",
            "items": [{
                "medicationId": "m-1",
                "dosage": "500 mg",
                "frequency": "3x sehari",
                "durationDays": 5,
                "quantity": 15
            }]
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(MockApiResponses::ok(prescription_json("9", "PENDING"))))
        .expect(1)
        .mount(&server)
        .await;

    let created = PrescriptionService::new(api(&server))
        .create(&CreatePrescriptionRequest {
            patient_id: "p-1".into(),
            consultation_id: Some("c-1".into()),
            diagnosis: "Faringitis akut".into(),
            items: vec![PrescriptionItemInput {
                medication_id: "m-1".into(),
                dosage: "500 mg".into(),
                frequency: "3x sehari".into(),
                duration_days: 5,
                quantity: 15,
                instructions: None,
            }],
            notes: None,
        })
        .await
        .unwrap();

    assert_eq!(created.status, PrescriptionStatus::Pending);
}

#[tokio::test]
async fn test_invalid_prescription_is_not_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let err = PrescriptionService::new(api(&server))
        .create(&CreatePrescriptionRequest {
            patient_id: "p-1".into(),
            diagnosis: "Faringitis akut".into(),
            ..Default::default()
        })
        .await
        .unwrap_err();

    assert_matches!(err, AppError::Validation { ref fields, .. } if fields.contains_key("items"));
}

fn medication_json(id: &str, name: &str, active: bool) -> Value {
    json!({
        "id": id,
        "name": name,
        "genericName": "amoxicillin",
        "form": "CAPSULE",
        "strength": "500 mg",
        "stock": 120,
        "isActive": active
    })
}

#[tokio::test]
async fn test_medication_search_hides_inactive() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/web/doctor/medications/search"))
        .and(query_param("q", "amox"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockApiResponses::ok(json!([
            medication_json("m-1", "Amoxicillin", true),
            medication_json("m-3", "Amoxsan", false)
        ]))))
        .mount(&server)
        .await;

    let found = MedicationService::new(api(&server)).search("amox").await.unwrap();

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].label(), "Amoxicillin 500 mg");
    assert_eq!(found[0].form, DosageForm::Capsule);
}

#[tokio::test]
async fn test_medication_crud() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/web/doctor/medications"))
        .respond_with(ResponseTemplate::new(201).set_body_json(MockApiResponses::ok(medication_json("m-5", "Cetirizine", true))))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/web/doctor/medications/m-5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockApiResponses::ok(medication_json("m-5", "Cetirizine", true))))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/web/doctor/medications/m-5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockApiResponses::ok_message("Medication removed")))
        .expect(1)
        .mount(&server)
        .await;

    let service = MedicationService::new(api(&server));
    let form = MedicationForm {
        name: "Cetirizine".into(),
        generic_name: None,
        form: DosageForm::Tablet,
        strength: Some("10 mg".into()),
        stock: 50,
    };

    let created = service.create(&form).await.unwrap();
    service.update(&created.id, &form).await.unwrap();
    service.delete(&created.id).await.unwrap();

    let blank = MedicationForm {
        name: " ".into(),
        ..form
    };
    assert_matches!(service.create(&blank).await, Err(AppError::Validation { .. }));
}
