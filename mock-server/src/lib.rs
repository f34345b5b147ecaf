use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, Method, StatusCode},
    routing::{any, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Component {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub branch: String,
    pub url: String,
}

#[derive(Deserialize)]
pub struct ScanRequest {
    pub project: String,
    pub components: Vec<Component>,
}

#[derive(Deserialize)]
pub struct SubmitRequest {
    pub project: String,
    pub component: String,
    pub url: String,
    pub kw_scan_link: String,
}

/// A request accepted by one of the mocked services.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Submission {
    pub id: Uuid,
    pub service: String,
    pub username: String,
    pub project: String,
}

/// What `/probe/echo` saw on the wire.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Echo {
    pub method: String,
    pub content_type: Option<String>,
    pub authorization: Option<String>,
    pub body: String,
}

pub type Db = Arc<RwLock<Vec<Submission>>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Vec::new()));
    Router::new()
        .route("/rest/clamav/scan/{username}/", post(scan))
        .route("/rest/klocwork/submit/{username}/", post(submit))
        .route("/rest/submissions", get(list_submissions))
        .route("/probe/ok", any(probe_ok))
        .route("/probe/missing", any(probe_missing))
        .route("/probe/not-json", any(probe_not_json))
        .route("/probe/echo", any(probe_echo))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn scan(
    State(db): State<Db>,
    Path(username): Path<String>,
    Json(input): Json<ScanRequest>,
) -> Result<Json<Submission>, (StatusCode, String)> {
    if input.components.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "components must not be empty".to_string(),
        ));
    }
    Ok(Json(record(&db, "clamav", username, input.project).await))
}

async fn submit(
    State(db): State<Db>,
    Path(username): Path<String>,
    Json(input): Json<SubmitRequest>,
) -> Result<Json<Submission>, (StatusCode, String)> {
    if input.component.is_empty() || input.url.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "component and url are required".to_string(),
        ));
    }
    Ok(Json(record(&db, "klocwork", username, input.project).await))
}

async fn record(db: &Db, service: &str, username: String, project: String) -> Submission {
    let submission = Submission {
        id: Uuid::new_v4(),
        service: service.to_string(),
        username,
        project,
    };
    db.write().await.push(submission.clone());
    submission
}

async fn list_submissions(State(db): State<Db>) -> Json<Vec<Submission>> {
    Json(db.read().await.clone())
}

async fn probe_ok() -> Json<Value> {
    Json(json!({ "ok": true }))
}

async fn probe_missing() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "not found")
}

async fn probe_not_json() -> (StatusCode, &'static str) {
    (StatusCode::OK, "not-json")
}

async fn probe_echo(method: Method, headers: HeaderMap, body: String) -> Json<Echo> {
    let header_value = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    Json(Echo {
        method: method.to_string(),
        content_type: header_value(header::CONTENT_TYPE),
        authorization: header_value(header::AUTHORIZATION),
        body,
    })
}
