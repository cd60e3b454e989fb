use axum::{extract::State, http::StatusCode, routing::get, Router};
use common_observability::AuditConsumerMetrics;

async fn health() -> &'static str { "ok" }

async fn render_metrics(State(metrics): State<AuditConsumerMetrics>) -> (StatusCode, String) {
    match metrics.render() {
        Ok(body) => (StatusCode::OK, body),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

/// Health and metrics only; the consumer has no business endpoints.
pub fn router(metrics: AuditConsumerMetrics) -> Router {
    Router::new()
        .route("/healthz", get(health))
        .route("/internal/metrics", get(render_metrics))
        .with_state(metrics)
}
