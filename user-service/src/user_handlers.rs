use crate::app_state::AppState;
use crate::model::{DeleteResponse, User, UserInput};
use crate::ApiError;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use common_http_errors::http_error_metrics_layer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

fn read_body(payload: Result<Json<UserInput>, JsonRejection>) -> Result<UserInput, ApiError> {
    payload.map(|Json(input)| input).map_err(|rejection| {
        warn!(status = %rejection.status(), reason = %rejection.body_text(), "unreadable user body");
        ApiError::bad_request("invalid_body", None)
    })
}

pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<UserInput>, JsonRejection>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let input = read_body(payload)?;
    let user = state.service.create(input).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>, ApiError> {
    Ok(Json(state.service.list_all().await?))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<User>, ApiError> {
    Ok(Json(state.service.get(user_id).await?))
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    payload: Result<Json<UserInput>, JsonRejection>,
) -> Result<Json<User>, ApiError> {
    let input = read_body(payload)?;
    // Body is rejected before the lookup, so a bad body is a 400 whether or not the user exists.
    input.validate().map_err(ApiError::validation)?;
    Ok(Json(state.service.update(user_id, input).await?))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<DeleteResponse>, ApiError> {
    state.service.delete(user_id).await?;
    info!(user_id, "delete request completed");
    Ok(Json(DeleteResponse { message: format!("User deleted successfully {user_id}") }))
}

async fn health() -> &'static str { "ok" }

async fn render_metrics(State(state): State<AppState>) -> Result<Response, ApiError> {
    let body = state.metrics.render().map_err(|e| ApiError::internal(e, None))?;
    let mut resp = body.into_response();
    resp.headers_mut().insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain; version=0.0.4"));
    Ok(resp)
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health))
        .route("/internal/metrics", get(render_metrics))
        .route("/api/v1/users", get(list_users).post(create_user))
        .route("/api/v1/users/:id", get(get_user).put(update_user).delete(delete_user))
        .with_state(state)
        .layer(middleware::from_fn(http_error_metrics_layer("user-service")))
        .layer(TraceLayer::new_for_http())
}
