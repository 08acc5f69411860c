// HTTP contract tests for the backend client against a local mock server.

use material_wizard::api::{ApiClient, CachedReferenceData, MaterialGateway, ReferenceData};
use material_wizard::config::ApiSettings;
use material_wizard::error::{ApiError, SubmitError};
use material_wizard::models::draft::EntryType;
use material_wizard::wizard::{build_payload, session, WizardState};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> ApiClient {
    ApiClient::new(&ApiSettings {
        base_url: server.uri(),
        timeout_secs: 5,
        auth_token: None,
    })
    .unwrap()
}

fn cement_state() -> WizardState {
    let mut state = WizardState::new();
    state.choose_entry_type(EntryType::RetroactiveEntry);
    state.draft.project_id = "P1".to_string();
    state.draft.name = "Cement".to_string();
    state.draft.phase_id = "PH1".to_string();
    state.draft.quantity = Some(50.0);
    state.draft.unit = "bag".to_string();
    state
}

#[tokio::test]
async fn categories_are_unwrapped_from_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/categories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [
                { "_id": "c1", "name": "Electrical" },
                { "_id": "c2", "name": "Cement" }
            ]
        })))
        .mount(&server)
        .await;

    let categories = client(&server).categories().await.unwrap();
    assert_eq!(categories.len(), 2);
    assert_eq!(categories[0].id, "c1");
    assert_eq!(categories[1].name, "Cement");
}

#[tokio::test]
async fn floors_and_phases_are_scoped_by_project_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/floors"))
        .and(query_param("projectId", "P1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [{ "_id": "F0", "floorNumber": 0 }, { "_id": "F1", "name": "Penthouse" }]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/phases"))
        .and(query_param("projectId", "P1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [{ "_id": "PH1", "name": "Foundation" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api = client(&server);
    let scope = session::load_project_scope(&api, "P1", &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(scope.project_id, "P1");
    assert_eq!(scope.floors.len(), 2);
    assert_eq!(scope.floors[0].display_name(), "Ground Floor");
    assert_eq!(scope.floors[1].display_name(), "Penthouse");
    assert_eq!(scope.phases[0].name, "Foundation");
}

#[tokio::test]
async fn bearer_token_is_sent_when_configured() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .and(header("authorization", "Bearer tok-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "_id": "u1", "name": "Ada", "email": "ada@example.com", "role": "Site_Engineer" }
        })))
        .mount(&server)
        .await;

    let api = ApiClient::new(&ApiSettings {
        base_url: server.uri(),
        timeout_secs: 5,
        auth_token: Some("tok-123".to_string()),
    })
    .unwrap();
    let me = api.current_user().await.unwrap();
    assert_eq!(me.role, "Site_Engineer");
}

#[tokio::test]
async fn create_material_posts_payload_and_reads_capital_warning() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/materials"))
        .and(body_partial_json(json!({
            "projectId": "P1",
            "name": "Cement",
            "unit": "bag",
            "entryType": "retroactive_entry",
            "isRetroactiveEntry": true,
            "costStatus": "missing"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "success": true,
            "data": { "_id": "m42", "capitalWarning": "Project capital is nearly exhausted" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let payload = build_payload(&cement_state(), &[]).unwrap();
    let created = client(&server).create_material(&payload).await.unwrap();
    assert_eq!(created.id, "m42");
    assert_eq!(
        created.capital_warning.as_ref().map(|w| w.message()),
        Some("Project capital is nearly exhausted")
    );
}

#[tokio::test]
async fn submit_maps_created_material_to_outcome() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/materials"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {
                "_id": "m7",
                "capitalWarning": { "message": "Over budget", "availableCapital": 100.0 }
            }
        })))
        .mount(&server)
        .await;

    let outcome = session::submit(&client(&server), &cement_state(), &[])
        .await
        .unwrap();
    assert_eq!(outcome.material_id, "m7");
    assert_eq!(outcome.detail_path, "/items/m7");
    assert_eq!(outcome.capital_warning.as_deref(), Some("Over budget"));
}

#[tokio::test]
async fn error_status_surfaces_server_message_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/materials"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "success": false,
            "error": "Insufficient permissions"
        })))
        .mount(&server)
        .await;

    let err = session::submit(&client(&server), &cement_state(), &[])
        .await
        .unwrap_err();
    match &err {
        SubmitError::Api(ApiError::Status { status, message }) => {
            assert_eq!(*status, 403);
            assert_eq!(message, "Insufficient permissions");
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(err.to_string(), "Insufficient permissions");
}

#[tokio::test]
async fn error_status_without_body_falls_back_to_http_code() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/projects"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let err = client(&server).projects().await.unwrap_err();
    assert!(matches!(err, ApiError::Status { status: 502, .. }));
    assert!(err.to_string().contains("502"));
}

#[tokio::test]
async fn success_false_envelope_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/projects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "message": "Session expired"
        })))
        .mount(&server)
        .await;

    let err = client(&server).projects().await.unwrap_err();
    assert!(matches!(&err, ApiError::Rejected(m) if m == "Session expired"));
}

#[tokio::test]
async fn cached_lookups_hit_the_server_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/projects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [{ "_id": "P1", "name": "Lekki Towers" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let cached = CachedReferenceData::new(client(&server));
    let first = cached.projects().await.unwrap();
    let second = cached.projects().await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first[0].name, "Lekki Towers");
}

#[tokio::test]
async fn failed_lookups_degrade_to_empty_lists() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/categories"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/projects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [{ "_id": "P1", "name": "Lekki Towers" }]
        })))
        .mount(&server)
        .await;

    let lookups = session::load_lookups(&client(&server)).await;
    assert!(lookups.categories.is_empty());
    assert_eq!(lookups.projects.len(), 1);
}
