//! Integration tests for the HTTP repository
//!
//! An in-process axum server plays the backend's REST contract for the
//! outlets resource.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
};
use backoffice_api::{ApiClient, HttpRepository};
use backoffice_core::prelude::*;
use backoffice_core::{catalog, repository::FALLBACK_MESSAGE};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tokio::sync::Mutex;

#[derive(Debug, Clone, Default)]
enum Failure {
    #[default]
    None,
    Conflict,
    ServerError(String),
    NotJson,
}

#[derive(Debug, Default)]
struct BackendState {
    rows: Vec<Value>,
    next_id: i64,
    last_body: Option<Value>,
    failure: Failure,
}

#[derive(Debug, Clone, Default)]
struct Backend {
    state: Arc<Mutex<BackendState>>,
}

impl Backend {
    async fn seed(&self, rows: Vec<Value>) {
        let mut state = self.state.lock().await;
        state.next_id = rows.len() as i64 + 1;
        state.rows = rows;
    }

    async fn fail_with(&self, failure: Failure) {
        self.state.lock().await.failure = failure;
    }

    async fn rows(&self) -> Vec<Value> {
        self.state.lock().await.rows.clone()
    }

    async fn last_body(&self) -> Option<Value> {
        self.state.lock().await.last_body.clone()
    }
}

fn failure_response(failure: Failure) -> Option<Response> {
    match failure {
        Failure::None => None,
        Failure::Conflict => Some(StatusCode::CONFLICT.into_response()),
        Failure::ServerError(message) => Some(
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"success": false, "message": message})),
            )
                .into_response(),
        ),
        Failure::NotJson => Some((StatusCode::OK, "<html>maintenance</html>").into_response()),
    }
}

async fn list(State(backend): State<Backend>) -> Response {
    let state = backend.state.lock().await;
    Json(json!({"success": true, "data": state.rows})).into_response()
}

async fn create(State(backend): State<Backend>, Json(body): Json<Value>) -> Response {
    let mut state = backend.state.lock().await;
    state.last_body = Some(body.clone());
    if let Some(response) = failure_response(std::mem::take(&mut state.failure)) {
        return response;
    }

    let code = body["outlet_code"].clone();
    if state.rows.iter().any(|row| row["outlet_code"] == code) {
        let message = format!("Duplicate entry '{}' for key 'outlet_code'", code.as_str().unwrap_or_default());
        return Json(json!({"success": false, "message": message})).into_response();
    }

    let id = state.next_id;
    state.next_id += 1;
    let mut row = body;
    row["id"] = json!(id);
    state.rows.push(row);
    Json(json!({"success": true, "data": {"id": id}, "message": "Outlet created"})).into_response()
}

async fn update(
    State(backend): State<Backend>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let mut state = backend.state.lock().await;
    state.last_body = Some(body.clone());
    if let Some(response) = failure_response(std::mem::take(&mut state.failure)) {
        return response;
    }

    match state.rows.iter_mut().find(|row| row["id"].to_string() == id) {
        Some(row) => {
            *row = body;
            row["id"] = json!(id.parse::<i64>().unwrap_or_default());
            Json(json!({"success": true})).into_response()
        }
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"success": false, "message": "Outlet not found"})),
        )
            .into_response(),
    }
}

async fn remove(State(backend): State<Backend>, Path(id): Path<String>) -> Response {
    let mut state = backend.state.lock().await;
    if let Some(response) = failure_response(std::mem::take(&mut state.failure)) {
        return response;
    }

    let before = state.rows.len();
    state.rows.retain(|row| row["id"].to_string() != id);
    if state.rows.len() == before {
        return Json(json!({"success": false, "message": "Outlet not found"})).into_response();
    }
    Json(json!({"success": true, "message": "Outlet deleted"})).into_response()
}

async fn spawn_backend(backend: Backend) -> String {
    let app = Router::new()
        .route("/api/outlets", get(list).post(create))
        .route("/api/outlets/:id", put(update).delete(remove))
        .with_state(backend);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/api")
}

fn outlets_schema() -> Arc<EntitySchema> {
    Arc::new(catalog::outlets().unwrap())
}

async fn repository(backend: &Backend) -> HttpRepository {
    let base_url = spawn_backend(backend.clone()).await;
    ApiClient::new(&base_url, Duration::from_secs(5))
        .unwrap()
        .repository(outlets_schema())
}

fn seed_rows() -> Vec<Value> {
    vec![
        json!({"id": 1, "outlet_code": "RST", "outlet_name": "Restaurant",
               "property_code": "GRD", "outlet_type": null, "is_active": 1}),
        json!({"id": 2, "outlet_code": "BAR", "outlet_name": "Pool Bar",
               "property_code": "GRD", "outlet_type": "Bar", "is_active": 0}),
    ]
}

#[tokio::test]
async fn list_conforms_rows_to_schema() {
    let backend = Backend::default();
    backend.seed(seed_rows()).await;
    let repo = repository(&backend).await;

    let records = repo.list().await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].get("is_active"), Some(&FieldValue::Bool(true)));
    assert_eq!(records[1].get("is_active"), Some(&FieldValue::Bool(false)));
    assert_eq!(records[0].text("outlet_type"), "");
    assert_eq!(records[0].text("id"), "1");
}

#[tokio::test]
async fn create_omits_surrogate_key_and_merges_reply() {
    let backend = Backend::default();
    backend.seed(seed_rows()).await;
    let repo = repository(&backend).await;
    let schema = repo.schema().clone();

    let record = FormRecord::from_pairs(
        &schema,
        [
            ("outlet_code", "CAF"),
            ("outlet_name", "Lobby Cafe"),
            ("property_code", "GRD"),
        ],
    );
    let stored = repo.create(&record).await.unwrap().unwrap();
    assert_eq!(stored.text("id"), "3");
    assert_eq!(stored.text("outlet_name"), "Lobby Cafe");

    let body = backend.last_body().await.unwrap();
    assert!(body.get("id").is_none());
    assert_eq!(body["outlet_code"], "CAF");
    assert_eq!(body["is_active"], false);
}

#[tokio::test]
async fn update_and_delete_address_record_by_id() {
    let backend = Backend::default();
    backend.seed(seed_rows()).await;
    let repo = repository(&backend).await;

    let mut records = repo.list().await.unwrap();
    records[1].set("outlet_name", FieldValue::from("Sunset Bar"));
    repo.update("2", &records[1]).await.unwrap();
    assert_eq!(backend.last_body().await.unwrap()["id"], 2);

    repo.delete("1").await.unwrap();
    let rows = backend.rows().await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["outlet_name"], "Sunset Bar");
}

#[tokio::test]
async fn rejected_duplicate_is_classified() {
    let backend = Backend::default();
    backend.seed(seed_rows()).await;
    let repo = repository(&backend).await;
    let schema = repo.schema().clone();

    let record = FormRecord::from_pairs(&schema, [("outlet_code", "BAR"), ("outlet_name", "Bar 2")]);
    let err = repo.create(&record).await.unwrap_err();
    assert!(err.is_duplicate_key());
    assert_eq!(err.user_message(), "Duplicate entry 'BAR' for key 'outlet_code'");
}

#[tokio::test]
async fn conflict_status_is_duplicate() {
    let backend = Backend::default();
    backend.fail_with(Failure::Conflict).await;
    let repo = repository(&backend).await;
    let schema = repo.schema().clone();

    let record = FormRecord::from_pairs(&schema, [("outlet_code", "NEW")]);
    let err = repo.create(&record).await.unwrap_err();
    assert!(err.is_duplicate_key());
    assert_eq!(err.user_message(), FALLBACK_MESSAGE);
}

#[tokio::test]
async fn server_error_message_passes_through() {
    let backend = Backend::default();
    backend.seed(seed_rows()).await;
    backend
        .fail_with(Failure::ServerError("Outlet has open checks".to_string()))
        .await;
    let repo = repository(&backend).await;

    let err = repo.delete("1").await.unwrap_err();
    assert_eq!(err.user_message(), "Outlet has open checks");
    assert_eq!(backend.rows().await.len(), 2);
}

#[tokio::test]
async fn non_json_reply_is_unavailable() {
    let backend = Backend::default();
    backend.seed(seed_rows()).await;
    backend.fail_with(Failure::NotJson).await;
    let repo = repository(&backend).await;

    let err = repo.delete("1").await.unwrap_err();
    assert!(matches!(err, RepositoryError::Unavailable { .. }));
    assert_eq!(err.user_message(), FALLBACK_MESSAGE);
}

#[tokio::test]
async fn unreachable_backend_is_unavailable() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let repo = ApiClient::new(&format!("http://{addr}/api"), Duration::from_secs(2))
        .unwrap()
        .repository(outlets_schema());
    let err = repo.list().await.unwrap_err();
    assert!(matches!(err, RepositoryError::Unavailable { .. }));
}

#[tokio::test]
async fn screen_round_trip_over_http() {
    let backend = Backend::default();
    backend.seed(seed_rows()).await;
    let repo = Arc::new(repository(&backend).await);
    let schema = repo.schema().clone();

    let mut screen = Screen::mount(schema, repo).await.unwrap();
    let controller = screen.controller_mut();
    controller.update_field("outlet_code", "SPA");
    controller.update_field("outlet_name", "Spa Lounge");
    controller.update_field("property_code", "GRD");
    controller.update_field("is_active", true);
    assert!(matches!(
        screen.submit().await.unwrap(),
        SubmitOutcome::Created(Some(_))
    ));
    assert_eq!(screen.records().len(), 3);

    let controller = screen.controller_mut();
    controller.select_action(Mode::Delete).unwrap();
    controller.select_record(0).unwrap();
    assert_eq!(screen.confirm_delete().await.unwrap(), DeleteOutcome::Deleted);

    let codes: Vec<Value> = backend
        .rows()
        .await
        .iter()
        .map(|row| row["outlet_code"].clone())
        .collect();
    assert_eq!(codes, vec![json!("BAR"), json!("SPA")]);
}
