use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use common_audit::{EventPublisher, RecordingEventSink};
use common_observability::UserServiceMetrics;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::util::ServiceExt;
use user_service::{router, AppState, InMemoryUserStore, StoreError, User, UserInput, UserService, UserStore};

fn app_with_store(store: Arc<dyn UserStore>) -> (Router, Arc<RecordingEventSink>) {
    let sink = Arc::new(RecordingEventSink::new());
    let metrics = UserServiceMetrics::new().unwrap();
    let publisher = EventPublisher::new(sink.clone(), "user-events")
        .with_counters(metrics.events_published.clone(), metrics.event_publish_failures.clone());
    let service = UserService::new(store, publisher).with_metrics(metrics.clone());
    (router(AppState::new(service, metrics)), sink)
}

fn app() -> (Router, Arc<RecordingEventSink>) {
    app_with_store(Arc::new(InMemoryUserStore::new()))
}

struct BrokenStore;

#[async_trait]
impl UserStore for BrokenStore {
    async fn insert(&self, _input: &UserInput) -> Result<User, StoreError> { Err(sqlx::Error::PoolTimedOut.into()) }
    async fn find(&self, _id: i64) -> Result<Option<User>, StoreError> { Err(sqlx::Error::PoolTimedOut.into()) }
    async fn find_all(&self) -> Result<Vec<User>, StoreError> { Err(sqlx::Error::PoolTimedOut.into()) }
    async fn update(&self, _user: &User) -> Result<Option<User>, StoreError> { Err(sqlx::Error::PoolTimedOut.into()) }
    async fn delete(&self, _id: i64) -> Result<bool, StoreError> { Err(sqlx::Error::PoolTimedOut.into()) }
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder().method(method).uri(uri).body(Body::empty()).unwrap()
}

async fn read_json(resp: axum::response::Response) -> Value {
    let bytes = to_bytes(resp.into_body(), 1024 * 64).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn ashish() -> Value {
    json!({"name":"Ashish","email":"ashish@gmail.com","mobile":"9875432349","address":"Ahmedabad, Gujarat"})
}

#[tokio::test]
async fn create_returns_201_with_assigned_id() {
    let (app, sink) = app();
    let resp = app.oneshot(json_request("POST", "/api/v1/users", ashish())).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = read_json(resp).await;
    assert_eq!(body["id"], 1);
    assert_eq!(body["email"], "ashish@gmail.com");
    assert!(sink.wait_for(1, Duration::from_secs(1)).await);
    assert_eq!(sink.payloads().await, vec!["User created: 1".to_string()]);
}

#[tokio::test]
async fn client_supplied_id_is_ignored() {
    let (app, _) = app();
    let mut body = ashish();
    body["id"] = json!(121);
    let resp = app.oneshot(json_request("POST", "/api/v1/users", body)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    assert_eq!(read_json(resp).await["id"], 1);
}

#[tokio::test]
async fn invalid_create_returns_400_with_violations() {
    let (app, sink) = app();
    let body = json!({"name":"John Doe","email":"ashish.com","mobile":"123","address":"Vadodara, Gujarat"});
    let resp = app.oneshot(json_request("POST", "/api/v1/users", body)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(resp.headers().get("X-Error-Code").unwrap(), "validation_failed");
    let body = read_json(resp).await;
    let fields: Vec<&str> = body["violations"].as_array().unwrap().iter().map(|v| v["field"].as_str().unwrap()).collect();
    assert_eq!(fields, vec!["email", "mobile"]);
    assert!(!sink.wait_for(1, Duration::from_millis(50)).await);
}

#[tokio::test]
async fn missing_fields_are_violations_not_extractor_errors() {
    let (app, _) = app();
    let resp = app.oneshot(json_request("POST", "/api/v1/users", json!({"name":"Only Name"}))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json(resp).await["violations"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn unknown_user_is_404_on_every_route() {
    let (app, _) = app();
    for req in [
        empty_request("GET", "/api/v1/users/42"),
        json_request("PUT", "/api/v1/users/42", ashish()),
        empty_request("DELETE", "/api/v1/users/42"),
    ] {
        let resp = app.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(resp.headers().get("X-Error-Code").unwrap(), "user_not_found");
        assert_eq!(read_json(resp).await["message"], "User not found 42");
    }
}

#[tokio::test]
async fn full_lifecycle_over_http() {
    let (app, sink) = app();
    let resp = app.clone().oneshot(json_request("POST", "/api/v1/users", ashish())).await.unwrap();
    let id = read_json(resp).await["id"].as_i64().unwrap();

    let update = json!({"name":"Ashish Paghdar","email":"ap@example.com","mobile":"+919234567890","address":"Surat"});
    let resp = app.clone().oneshot(json_request("PUT", &format!("/api/v1/users/{id}"), update)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = read_json(resp).await;
    assert_eq!(body["id"], id);
    assert_eq!(body["name"], "Ashish Paghdar");

    let resp = app.clone().oneshot(empty_request("GET", "/api/v1/users")).await.unwrap();
    assert_eq!(read_json(resp).await.as_array().unwrap().len(), 1);

    let resp = app.clone().oneshot(empty_request("DELETE", &format!("/api/v1/users/{id}"))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(read_json(resp).await["message"], format!("User deleted successfully {id}"));

    let resp = app.clone().oneshot(empty_request("GET", &format!("/api/v1/users/{id}"))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    assert!(sink.wait_for(3, Duration::from_secs(1)).await);
}

#[tokio::test]
async fn invalid_update_body_is_400_even_for_unknown_id() {
    let (app, _) = app();
    let resp = app.oneshot(json_request("PUT", "/api/v1/users/9", json!({"name":"x","email":"x@y.z","mobile":"1","address":"a"}))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn health_and_metrics_endpoints() {
    let (app, _) = app();
    let resp = app.clone().oneshot(empty_request("GET", "/healthz")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    app.clone().oneshot(empty_request("GET", "/api/v1/users/5")).await.unwrap();
    let resp = app.oneshot(empty_request("GET", "/internal/metrics")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = to_bytes(resp.into_body(), 1024 * 256).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("user_operations_total{op=\"get\",outcome=\"not_found\"} 1"), "{text}");
}

#[tokio::test]
async fn store_failure_is_500_internal_error() {
    let (app, sink) = app_with_store(Arc::new(BrokenStore));
    let resp = app.clone().oneshot(json_request("POST", "/api/v1/users", ashish())).await.unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(resp.headers().get("X-Error-Code").unwrap(), "internal_error");
    assert_eq!(read_json(resp).await["code"], "internal_error");

    let resp = app.oneshot(empty_request("GET", "/api/v1/users/1")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!sink.wait_for(1, Duration::from_millis(50)).await);
}

#[tokio::test]
async fn unreadable_body_uses_error_envelope() {
    let (app, sink) = app();
    let malformed = Request::builder()
        .method("POST")
        .uri("/api/v1/users")
        .header("content-type", "application/json")
        .body(Body::from("{\"name\":"))
        .unwrap();
    let no_content_type = Request::builder()
        .method("PUT")
        .uri("/api/v1/users/1")
        .body(Body::from(ashish().to_string()))
        .unwrap();
    for req in [malformed, no_content_type] {
        let resp = app.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(resp.headers().get("X-Error-Code").unwrap(), "invalid_body");
        assert_eq!(read_json(resp).await["code"], "invalid_body");
    }
    assert!(!sink.wait_for(1, Duration::from_millis(50)).await);
}
