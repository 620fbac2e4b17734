#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::Json;
use serde_json::{Value, json};
use telecare_sync::core::api::ApiClient;
use telecare_sync::core::auth::{AuthStore, Session};
use telecare_sync::enums::{PersistencePolicy, Role};

/// In-process stand-in for the telemedicine backend.
#[derive(Default)]
pub struct Backend {
    pub notifications: Mutex<Vec<Value>>,
    pub summary: Mutex<Option<Value>>,
    pub consultations: Mutex<Vec<Value>>,
    pub pending: Mutex<Vec<Value>>,
    pub messages: Mutex<Value>,
    pub sent: Mutex<Vec<Value>>,
    pub seen_headers: Mutex<Vec<HeaderMap>>,
    pub calls: Mutex<Vec<String>>,
    /// Forces every route to answer with this status and body.
    pub fail_with: Mutex<Option<(StatusCode, String)>>,
}

impl Backend {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String, headers: HeaderMap) -> Option<Response> {
        self.calls.lock().unwrap().push(call);
        self.seen_headers.lock().unwrap().push(headers);
        self.fail_with
            .lock()
            .unwrap()
            .clone()
            .map(|(status, body)| (status, body).into_response())
    }
}

type Shared = State<Arc<Backend>>;

async fn list_notifications(
    State(backend): Shared,
    Query(query): Query<std::collections::HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    if query.get("summary").map(String::as_str) == Some("true") {
        if let Some(failure) = backend.record("GET summary".into(), headers) {
            return failure;
        }
        return match backend.summary.lock().unwrap().clone() {
            Some(summary) => Json(summary).into_response(),
            None => StatusCode::NOT_FOUND.into_response(),
        };
    }
    if let Some(failure) = backend.record("GET notifications".into(), headers) {
        return failure;
    }
    Json(Value::Array(backend.notifications.lock().unwrap().clone())).into_response()
}

async fn mark_read(State(backend): Shared, Path(id): Path<i64>, headers: HeaderMap) -> Response {
    if let Some(failure) = backend.record(format!("POST read {id}"), headers) {
        return failure;
    }
    let mut notifications = backend.notifications.lock().unwrap();
    match notifications.iter_mut().find(|n| n["id"] == id) {
        Some(notification) => {
            notification["is_read"] = json!(true);
            Json(json!({ "success": true })).into_response()
        }
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Notification not found" })),
        )
            .into_response(),
    }
}

async fn mark_all_read(State(backend): Shared, headers: HeaderMap) -> Response {
    if let Some(failure) = backend.record("POST read_all".into(), headers) {
        return failure;
    }
    for notification in backend.notifications.lock().unwrap().iter_mut() {
        notification["is_read"] = json!(true);
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn delete_notification(
    State(backend): Shared,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Response {
    if let Some(failure) = backend.record(format!("DELETE {id}"), headers) {
        return failure;
    }
    backend.notifications.lock().unwrap().retain(|n| n["id"] != id);
    StatusCode::NO_CONTENT.into_response()
}

async fn list_consultations(State(backend): Shared, headers: HeaderMap) -> Response {
    if let Some(failure) = backend.record("GET consultations".into(), headers) {
        return failure;
    }
    Json(Value::Array(backend.consultations.lock().unwrap().clone())).into_response()
}

async fn list_pending(State(backend): Shared, headers: HeaderMap) -> Response {
    if let Some(failure) = backend.record("GET pending".into(), headers) {
        return failure;
    }
    Json(Value::Array(backend.pending.lock().unwrap().clone())).into_response()
}

async fn thread(State(backend): Shared, Path(id): Path<i64>, headers: HeaderMap) -> Response {
    if let Some(failure) = backend.record(format!("GET messages {id}"), headers) {
        return failure;
    }
    Json(backend.messages.lock().unwrap().clone()).into_response()
}

async fn send(
    State(backend): Shared,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Some(failure) = backend.record(format!("POST messages {id}"), headers) {
        return failure;
    }
    backend.sent.lock().unwrap().push(body.clone());
    let created = json!({
        "id": 900,
        "sender_type": "doctor",
        "content": body["content"],
        "sent_at": "2024-05-02T10:00:00Z"
    });
    (StatusCode::CREATED, Json(created)).into_response()
}

async fn consultation_action(
    State(backend): Shared,
    Path((id, action)): Path<(i64, String)>,
    headers: HeaderMap,
) -> Response {
    if let Some(failure) = backend.record(format!("POST {action} {id}"), headers) {
        return failure;
    }
    match action.as_str() {
        "end" => backend.consultations.lock().unwrap().retain(|c| c["id"] != id),
        "reject" => backend.pending.lock().unwrap().retain(|c| c["id"] != id),
        "accept" => {
            let mut pending = backend.pending.lock().unwrap();
            if let Some(index) = pending.iter().position(|c| c["id"] == id) {
                let mut accepted = pending.remove(index);
                accepted["status"] = json!("active");
                backend.consultations.lock().unwrap().push(accepted);
            }
        }
        _ => {}
    }
    Json(json!({ "success": true })).into_response()
}

pub fn router(backend: Arc<Backend>) -> Router {
    let api = Router::new()
        .route("/notifications", get(list_notifications))
        .route("/notifications/read_all", post(mark_all_read))
        .route("/notifications/{id}/read", post(mark_read))
        .route("/notifications/{id}", delete(delete_notification))
        .route("/doctor/consultations", get(list_consultations))
        .route("/consultation/active", get(list_consultations))
        .route("/doctor/requests", get(list_pending))
        .route("/consultation/requests/pending", get(list_pending))
        .route("/consultation/{id}/messages", get(thread).post(send))
        .route("/consultation/{id}/{action}", post(consultation_action))
        .with_state(backend);

    Router::new().nest("/api", api)
}

/// Serves the mock on an ephemeral port and returns its origin.
pub async fn spawn_backend(backend: Arc<Backend>) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(backend)).await.unwrap();
    });
    format!("http://{address}")
}

pub async fn signed_in_client(origin: &str) -> ApiClient {
    let auth = Arc::new(AuthStore::in_memory());
    auth.set(Session::new("test-token", Role::Doctor), PersistencePolicy::TabScoped)
        .await
        .unwrap();
    ApiClient::new(origin, Duration::from_secs(5), auth).unwrap()
}
