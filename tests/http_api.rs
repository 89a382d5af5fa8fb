//! HttpApi against a local wiremock server

use chrono::NaiveDate;
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use coffee_monitor::api::{DashboardApi, HttpApi, HttpApiConfig};
use coffee_monitor::models::{
    Attachment, BeneficiaryPayload, CropStatusPayload, Gender, MaritalStatus, User,
};
use coffee_monitor::session::{MemorySessionStore, SessionStore};

fn user() -> User {
    User {
        id: "u1".into(),
        username: "admin".into(),
        role: Some("admin".into()),
        name: None,
    }
}

fn client(server: &MockServer, store: Arc<MemorySessionStore>) -> HttpApi {
    HttpApi::new(
        HttpApiConfig {
            base_url: format!("{}/api", server.uri()),
            timeout_ms: 5_000,
        },
        store,
    )
    .unwrap()
}

fn logged_in() -> Arc<MemorySessionStore> {
    Arc::new(MemorySessionStore::with_session("tok-123", user()))
}

#[tokio::test]
async fn test_bearer_token_attached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/addresses/provinces"))
        .and(header("authorization", "Bearer tok-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["Bukidnon", "Davao"])))
        .expect(1)
        .mount(&server)
        .await;

    let api = client(&server, logged_in());
    assert_eq!(api.provinces().await.unwrap(), vec!["Bukidnon", "Davao"]);
}

#[tokio::test]
async fn test_wrapped_and_bare_lists() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/beneficiaries"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{
                "_id": "b1",
                "beneficiaryId": "BEN-0001",
                "firstName": "Juan",
                "lastName": "Dela Cruz",
                "birthDate": "2000-01-01T00:00:00.000Z"
            }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/addresses/municipalities/Misamis%20Oriental"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["Balingasag"])))
        .mount(&server)
        .await;

    let api = client(&server, logged_in());
    let beneficiaries = api.list_beneficiaries().await.unwrap();
    assert_eq!(beneficiaries.len(), 1);
    assert_eq!(beneficiaries[0].birth_date, NaiveDate::from_ymd_opt(2000, 1, 1));
    assert_eq!(
        api.municipalities("Misamis Oriental").await.unwrap(),
        vec!["Balingasag"]
    );
}

#[tokio::test]
async fn test_unauthorized_clears_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/statistics"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "Token expired"})))
        .mount(&server)
        .await;

    let store = logged_in();
    let api = client(&server, store.clone());
    let err = api.statistics().await.unwrap_err();

    assert_eq!(err.status, 401);
    assert_eq!(err.message, "Token expired");
    assert!(store.token().is_none());
}

#[tokio::test]
async fn test_server_message_preferred() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/seedlings/s1"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"error": "Record is locked"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/seedlings/s2"))
        .respond_with(ResponseTemplate::new(500).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let api = client(&server, logged_in());
    let locked = api.delete_seedling("s1").await.unwrap_err();
    assert_eq!((locked.status, locked.message.as_str()), (400, "Record is locked"));

    let crashed = api.delete_seedling("s2").await.unwrap_err();
    assert_eq!(crashed.status, 500);
    assert_eq!(crashed.message, "The server encountered an error");
}

#[tokio::test]
async fn test_delete_summary_and_empty_body() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/beneficiaries/b1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Beneficiary deleted successfully",
            "deletedRecords": {"seedlings": 2, "cropStatus": 1, "farmPlots": 1}
        })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/farm-plots/p1"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let api = client(&server, logged_in());
    let summary = api.delete_beneficiary("b1").await.unwrap();
    assert_eq!(summary.deleted_records.map(|r| r.total()), Some(4));

    let empty = api.delete_farm_plot("p1").await.unwrap();
    assert!(empty.cascade_note().is_none());
}

#[tokio::test]
async fn test_delete_summary_wrapped_or_unrecognized() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/beneficiaries/b2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "message": "Beneficiary deleted successfully",
                "deletedRecords": {"seedlings": 1, "cropStatus": 0, "farmPlots": 0}
            }
        })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/seedlings/s3"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;

    let api = client(&server, logged_in());
    let wrapped = api.delete_beneficiary("b2").await.unwrap();
    assert_eq!(wrapped.deleted_records.map(|r| r.seedlings), Some(1));

    let plain = api.delete_seedling("s3").await.unwrap();
    assert!(plain.deleted_records.is_none());
}

#[tokio::test]
async fn test_unreachable_server_reports_status_zero() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let api = HttpApi::new(
        HttpApiConfig {
            base_url: format!("http://127.0.0.1:{}/api", port),
            timeout_ms: 2_000,
        },
        logged_in(),
    )
    .unwrap();

    let err = api.list_seedlings().await.unwrap_err();
    assert_eq!(err.status, 0);
    assert!(err.is_no_response());
}

#[tokio::test]
async fn test_generate_id_and_multipart_create() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/beneficiaries/generate-id"))
        .and(body_string_contains("\"firstName\":\"Juan\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"beneficiaryId": "BEN-0007"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/beneficiaries"))
        .and(body_string_contains("name=\"beneficiaryId\""))
        .and(body_string_contains("BEN-0007"))
        .and(body_string_contains("filename=\"juan.jpg\""))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "_id": "b7",
            "beneficiaryId": "BEN-0007",
            "firstName": "Juan",
            "lastName": "Dela Cruz",
            "picture": "/uploads/juan.jpg"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api = client(&server, logged_in());
    let mut payload = BeneficiaryPayload {
        beneficiary_id: String::new(),
        first_name: "Juan".into(),
        middle_name: String::new(),
        last_name: "Dela Cruz".into(),
        purok: "Purok 1".into(),
        barangay: "Poblacion".into(),
        municipality: "Malaybalay".into(),
        province: "Bukidnon".into(),
        gender: Gender::Male,
        birth_date: NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(),
        age: 24,
        marital_status: MaritalStatus::Single,
        cellphone: "09171234567".into(),
        picture: Some(Attachment::from_bytes("juan.jpg", b"jpeg-bytes".to_vec())),
    };
    payload.beneficiary_id = api
        .generate_beneficiary_id(&payload.generate_id_request())
        .await
        .unwrap();
    let created = api.create_beneficiary(&payload).await.unwrap();

    assert_eq!(created.id, "b7");
    assert_eq!(created.picture.as_deref(), Some("/uploads/juan.jpg"));
}

#[tokio::test]
async fn test_crop_status_update_sends_existing_pictures() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/crop-status/c1"))
        .and(body_string_contains("name=\"existingPictures\""))
        .and(body_string_contains(r#"["a.jpg","b.jpg"]"#))
        .and(body_string_contains("filename=\"new.png\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_id": "c1",
            "beneficiaryId": "BEN-0001",
            "surveyDate": "2024-05-01",
            "surveyer": "Rosa",
            "aliveCrops": 90,
            "deadCrops": 10,
            "pictures": ["a.jpg", "b.jpg", "new.png"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api = client(&server, logged_in());
    let payload = CropStatusPayload {
        beneficiary_id: "BEN-0001".into(),
        survey_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
        surveyer: "Rosa".into(),
        alive_crops: 90,
        dead_crops: 10,
        plot: None,
        existing_pictures: vec!["a.jpg".into(), "b.jpg".into()],
        pictures: vec![Attachment::from_bytes("new.png", b"png-bytes".to_vec())],
    };
    let updated = api.update_crop_status("c1", &payload).await.unwrap();
    assert_eq!(updated.pictures.len(), 3);
}
