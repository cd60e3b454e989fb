use axum::{extract::Request, http::{StatusCode, HeaderValue}, middleware::Next, response::{IntoResponse, Response}, Json};
use once_cell::sync::Lazy;
use prometheus::{IntCounter, IntCounterVec, IntGauge, Opts};
use serde::Serialize;
use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use uuid::Uuid;

/// One field that failed its constraint.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field: field.into(), message: message.into() }
    }
}

#[derive(Serialize, Debug)]
pub struct ErrorBody {
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")] pub message: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")] pub violations: Vec<FieldViolation>,
    #[serde(skip_serializing_if = "Option::is_none")] pub trace_id: Option<Uuid>,
}

#[derive(Debug)]
pub enum ApiError {
    BadRequest { code: &'static str, trace_id: Option<Uuid>, message: Option<String> },
    Validation { violations: Vec<FieldViolation>, trace_id: Option<Uuid> },
    NotFound { code: &'static str, trace_id: Option<Uuid>, message: Option<String> },
    Internal { trace_id: Option<Uuid>, message: Option<String> },
}

impl ApiError {
    pub fn internal<E: std::fmt::Display>(e: E, trace_id: Option<Uuid>) -> Self { Self::Internal { trace_id, message: Some(e.to_string()) } }
    pub fn bad_request(code: &'static str, trace_id: Option<Uuid>) -> Self { Self::BadRequest { code, trace_id, message: None } }
    pub fn validation(violations: Vec<FieldViolation>) -> Self { Self::Validation { violations, trace_id: None } }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body, error_code) = match self {
            ApiError::BadRequest { code, trace_id, message } => (
                StatusCode::BAD_REQUEST,
                ErrorBody { code: code.into(), message, violations: Vec::new(), trace_id },
                code
            ),
            ApiError::Validation { violations, trace_id } => (
                StatusCode::BAD_REQUEST,
                ErrorBody { code: "validation_failed".into(), message: Some("request validation failed".into()), violations, trace_id },
                "validation_failed"
            ),
            ApiError::NotFound { code, trace_id, message } => (
                StatusCode::NOT_FOUND,
                ErrorBody { code: code.into(), message, violations: Vec::new(), trace_id },
                code
            ),
            ApiError::Internal { trace_id, message } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody { code: "internal_error".into(), message, violations: Vec::new(), trace_id },
                "internal_error"
            ),
        };
        let mut resp = (status, Json(body)).into_response();
        if let Ok(val) = HeaderValue::from_str(error_code) {
            resp.headers_mut().insert("X-Error-Code", val);
        }
        resp
    }
}

/// Distinct `code` label values allowed before new codes collapse into `overflow`.
pub const MAX_ERROR_CODES: usize = 40;
const OVERFLOW_LABEL: &str = "overflow";

static HTTP_ERRORS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let c = IntCounterVec::new(
        Opts::new("http_errors_total", "Count of HTTP error responses emitted (status >= 400)"),
        &["service", "code", "status"],
    ).expect("valid http_errors_total definition");
    let _ = prometheus::register(Box::new(c.clone()));
    c
});
static ERROR_CODES_DISTINCT: Lazy<IntGauge> = Lazy::new(|| {
    let g = IntGauge::new("http_error_codes_distinct", "Distinct error code labels currently tracked").expect("valid gauge definition");
    let _ = prometheus::register(Box::new(g.clone()));
    g
});
static ERROR_CODE_OVERFLOW: Lazy<IntCounter> = Lazy::new(|| {
    let c = IntCounter::new("http_error_code_overflow_total", "Error responses whose code was folded into the overflow label").expect("valid counter definition");
    let _ = prometheus::register(Box::new(c.clone()));
    c
});
static SEEN_CODES: Lazy<Mutex<HashSet<String>>> = Lazy::new(|| Mutex::new(HashSet::new()));

fn guarded_code_label(code: &str) -> String {
    let mut seen = SEEN_CODES.lock().unwrap_or_else(|p| p.into_inner());
    if seen.contains(code) { return code.to_string(); }
    if seen.len() >= MAX_ERROR_CODES {
        ERROR_CODE_OVERFLOW.inc();
        return OVERFLOW_LABEL.to_string();
    }
    seen.insert(code.to_string());
    ERROR_CODES_DISTINCT.set(seen.len() as i64);
    code.to_string()
}

fn record_error(service: &str, code: &str, status: u16) {
    let label = guarded_code_label(code);
    HTTP_ERRORS_TOTAL.with_label_values(&[service, &label, &status.to_string()]).inc();
}

type MiddlewareFuture = Pin<Box<dyn Future<Output = Response> + Send>>;

/// `axum::middleware::from_fn` compatible layer that counts every response with
/// status >= 400, labelled by the `X-Error-Code` header (or `unknown`).
pub fn http_error_metrics_layer(service: &'static str) -> impl Fn(Request, Next) -> MiddlewareFuture + Clone + Send + Sync + 'static {
    move |req: Request, next: Next| {
        Box::pin(async move {
            let resp = next.run(req).await;
            let status = resp.status();
            if status.as_u16() >= 400 {
                let code = resp.headers().get("X-Error-Code").and_then(|v| v.to_str().ok()).unwrap_or("unknown");
                record_error(service, code, status.as_u16());
            }
            resp
        })
    }
}

#[cfg(feature = "test-helpers")]
pub mod test_helpers {
    pub fn simulate_error_code(code: &str) { super::record_error("test", code, 400); }
    pub fn distinct_gauge() -> i64 { super::ERROR_CODES_DISTINCT.get() }
    pub fn overflow_count() -> u64 { super::ERROR_CODE_OVERFLOW.get() }
}
