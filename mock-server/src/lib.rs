use std::{sync::Arc, time::Duration};

use axum::{
    body::Bytes,
    extract::{Multipart, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

pub const CATALOGUE_SIZE: u32 = 42;
pub const DOWNLOAD_BODY: &[u8] = b"starter fixture download\n";
const MAX_LIMIT: u32 = 100;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Map<String, Value>>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestData {
    pub message: String,
    pub timestamp: String,
    pub request_id: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Item {
    pub id: u32,
    pub name: String,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}

#[derive(Deserialize)]
pub struct TestQuery {
    pub error: Option<String>,
}

#[derive(Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Fixture server settings.
#[derive(Clone, Debug, Default)]
pub struct MockConfig {
    /// Artificial delay before every fixture response.
    pub latency: Duration,
}

impl MockConfig {
    pub fn from_env() -> Self {
        let latency = std::env::var("MOCK_LATENCY_MS")
            .ok()
            .and_then(|v| v.trim().parse().ok())
            .map(Duration::from_millis)
            .unwrap_or_default();
        Self { latency }
    }
}

#[derive(Clone)]
struct AppState {
    config: Arc<MockConfig>,
    items: Arc<Vec<Item>>,
}

impl AppState {
    async fn simulate_latency(&self) {
        if !self.config.latency.is_zero() {
            tokio::time::sleep(self.config.latency).await;
        }
    }
}

pub fn app() -> Router {
    app_with(MockConfig::default())
}

pub fn app_with(config: MockConfig) -> Router {
    let items = (1..=CATALOGUE_SIZE)
        .map(|id| Item {
            id,
            name: format!("Item {id}"),
        })
        .collect();
    let state = AppState {
        config: Arc::new(config),
        items: Arc::new(items),
    };
    Router::new()
        .route("/health", get(health))
        .route("/api/test", get(get_test).post(create_test))
        .route(
            "/api/test/{id}",
            get(get_test_item)
                .put(update_test)
                .patch(update_test)
                .delete(delete_test),
        )
        .route("/api/items", get(list_items))
        .route("/api/protected", get(protected))
        .route("/api/upload", axum::routing::post(upload))
        .route("/api/download", get(download))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with(listener, MockConfig::default()).await
}

pub async fn run_with(listener: TcpListener, config: MockConfig) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(config)).await
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn short_id() -> String {
    Uuid::new_v4().simple().to_string().chars().take(9).collect()
}

fn ok<T: Serialize>(data: T, message: &str) -> Response {
    Json(Envelope {
        data,
        success: true,
        message: Some(message.to_string()),
    })
    .into_response()
}

fn fail(status: StatusCode, message: &str, errors: Option<Map<String, Value>>) -> Response {
    (
        status,
        Json(ErrorBody {
            message: message.to_string(),
            success: false,
            errors,
        }),
    )
        .into_response()
}

/// Loose truthiness for fixture flags: `false`, `null`, `0` and `""` are off.
fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}

fn parse_object(body: &[u8]) -> Option<Map<String, Value>> {
    match serde_json::from_slice(body) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

async fn health() -> Response {
    ok(json!({"status": "ok", "timestamp": now()}), "Healthy")
}

async fn get_test(State(state): State<AppState>, Query(query): Query<TestQuery>) -> Response {
    state.simulate_latency().await;
    if query.error.as_deref() == Some("true") {
        return fail(
            StatusCode::BAD_REQUEST,
            "This is a simulated error for testing error handling",
            None,
        );
    }
    ok(
        TestData {
            message: "API test successful!".to_string(),
            timestamp: now(),
            request_id: short_id(),
        },
        "Request processed successfully",
    )
}

async fn create_test(State(state): State<AppState>, body: Bytes) -> Response {
    let Some(input) = parse_object(&body) else {
        return fail(StatusCode::INTERNAL_SERVER_ERROR, "Failed to process request", None);
    };
    state.simulate_latency().await;

    if truthy(input.get("shouldError")) {
        let mut errors = Map::new();
        errors.insert("name".to_string(), json!(["Name is required"]));
        errors.insert("email".to_string(), json!(["Email format is invalid"]));
        return fail(StatusCode::UNPROCESSABLE_ENTITY, "Validation failed", Some(errors));
    }

    let mut data = Map::new();
    data.insert("id".to_string(), Value::String(short_id()));
    data.extend(input);
    data.insert("createdAt".to_string(), Value::String(now()));
    ok(Value::Object(data), "Data created successfully")
}

async fn get_test_item(Path(id): Path<String>) -> Response {
    fail(StatusCode::NOT_FOUND, &format!("No record with id {id}"), None)
}

async fn update_test(State(state): State<AppState>, Path(id): Path<String>, body: Bytes) -> Response {
    let Some(input) = parse_object(&body) else {
        return fail(StatusCode::INTERNAL_SERVER_ERROR, "Failed to process request", None);
    };
    state.simulate_latency().await;

    let mut data = Map::new();
    data.insert("id".to_string(), Value::String(id));
    data.extend(input);
    data.insert("updatedAt".to_string(), Value::String(now()));
    ok(Value::Object(data), "Data updated successfully")
}

async fn delete_test(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    state.simulate_latency().await;
    ok(json!({"id": id, "deleted": true}), "Data deleted successfully")
}

async fn list_items(State(state): State<AppState>, Query(query): Query<PageQuery>) -> Response {
    state.simulate_latency().await;
    let page = query.page.filter(|p| *p > 0).unwrap_or(1);
    let limit = query.limit.filter(|l| *l > 0).unwrap_or(10).min(MAX_LIMIT);

    let total = state.items.len();
    let start = usize::try_from(u64::from(page - 1) * u64::from(limit)).unwrap_or(usize::MAX);
    let data: Vec<Item> = state
        .items
        .iter()
        .skip(start)
        .take(limit as usize)
        .cloned()
        .collect();

    Json(Paginated {
        data,
        pagination: Pagination {
            page,
            limit,
            total: total as u64,
            total_pages: (total as u32).div_ceil(limit),
        },
    })
    .into_response()
}

async fn protected(State(state): State<AppState>, headers: HeaderMap) -> Response {
    state.simulate_latency().await;
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|t| !t.is_empty());
    match token {
        Some(token) => ok(json!({"authenticated": true, "token": token}), "Authorized"),
        None => fail(StatusCode::UNAUTHORIZED, "Unauthorized", None),
    }
}

async fn upload(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    state.simulate_latency().await;
    let mut files = Vec::new();
    let mut fields = Map::new();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "malformed multipart body");
                return fail(StatusCode::BAD_REQUEST, "Malformed upload", None);
            }
        };
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let bytes = match field.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read upload part");
                return fail(StatusCode::BAD_REQUEST, "Malformed upload", None);
            }
        };
        match file_name {
            Some(file_name) => files.push(json!({
                "field": name,
                "fileName": file_name,
                "size": bytes.len(),
            })),
            None => {
                fields.insert(name, Value::String(String::from_utf8_lossy(&bytes).into_owned()));
            }
        }
    }

    ok(json!({"files": files, "fields": fields}), "Upload received")
}

async fn download(State(state): State<AppState>) -> Response {
    state.simulate_latency().await;
    (
        [
            (header::CONTENT_TYPE, "application/octet-stream"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"fixture.txt\""),
        ],
        DOWNLOAD_BODY,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_serializes_camel_case() {
        let data = TestData {
            message: "m".to_string(),
            timestamp: "t".to_string(),
            request_id: "r".to_string(),
        };
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["requestId"], "r");
        assert!(json.get("request_id").is_none());
    }

    #[test]
    fn error_body_omits_missing_errors() {
        let body = ErrorBody {
            message: "x".to_string(),
            success: false,
            errors: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("errors").is_none());
        assert_eq!(json["success"], false);
    }

    #[test]
    fn truthiness_matches_fixture_flags() {
        assert!(truthy(Some(&json!(true))));
        assert!(truthy(Some(&json!(1))));
        assert!(truthy(Some(&json!("yes"))));
        assert!(truthy(Some(&json!({}))));
        assert!(!truthy(Some(&json!(false))));
        assert!(!truthy(Some(&json!(0))));
        assert!(!truthy(Some(&json!(""))));
        assert!(!truthy(Some(&Value::Null)));
        assert!(!truthy(None));
    }

    #[test]
    fn parse_object_rejects_non_objects() {
        assert!(parse_object(br#"{"a":1}"#).is_some());
        assert!(parse_object(b"[1,2]").is_none());
        assert!(parse_object(b"null").is_none());
        assert!(parse_object(b"not json").is_none());
    }

    #[test]
    fn short_ids_are_nine_chars() {
        assert_eq!(short_id().len(), 9);
    }
}
