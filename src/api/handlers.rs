use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::core::error::PublishError;
use crate::core::traits::{PublishOptions, PublishResult};
use crate::orchestration::{
    BatchPublishRequest, BatchPublishResult, PlatformPublisher, PlatformStatus, TaskProgress,
};

type ApiError = (StatusCode, Json<Value>);
type ApiResult<T> = Result<Json<T>, ApiError>;

// ============================================================
// Error Handling
// ============================================================

/// Map a publish error onto `{success: false, message, error}` with a status
/// code derived from its kind.
fn publish_error(e: PublishError) -> ApiError {
    let status = match &e {
        PublishError::Validation { .. } => StatusCode::BAD_REQUEST,
        PublishError::UnsupportedTarget { .. } => StatusCode::NOT_FOUND,
        PublishError::InvalidState { .. } => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        tracing::error!(error = %e, kind = e.kind(), "request failed");
    } else {
        tracing::warn!(error = %e, kind = e.kind(), "request rejected");
    }

    (
        status,
        Json(json!({
            "success": false,
            "message": e.to_string(),
            "error": e.kind(),
        })),
    )
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

// ============================================================
// Platforms
// ============================================================

pub async fn list_platforms(State(publisher): State<PlatformPublisher>) -> Json<Vec<PlatformStatus>> {
    Json(publisher.platforms().await)
}

pub async fn initialize_platform(
    State(publisher): State<PlatformPublisher>,
    Path(target): Path<String>,
) -> ApiResult<Value> {
    publisher
        .initialize(&target)
        .await
        .map(|()| Json(json!({ "success": true })))
        .map_err(publish_error)
}

pub async fn open_login(
    State(publisher): State<PlatformPublisher>,
    Path(target): Path<String>,
) -> ApiResult<Value> {
    publisher
        .open_login(&target)
        .await
        .map(|login_url| Json(json!({ "success": true, "loginUrl": login_url })))
        .map_err(publish_error)
}

pub async fn confirm_login(
    State(publisher): State<PlatformPublisher>,
    Path(target): Path<String>,
) -> ApiResult<Value> {
    publisher
        .confirm_login(&target)
        .await
        .map(|()| Json(json!({ "success": true })))
        .map_err(publish_error)
}

pub async fn platform_status(
    State(publisher): State<PlatformPublisher>,
    Path(target): Path<String>,
) -> ApiResult<PlatformStatus> {
    publisher.status(&target).await.map(Json).map_err(publish_error)
}

#[derive(Debug, Deserialize)]
pub struct PublishInput {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub options: PublishOptions,
}

pub async fn publish(
    State(publisher): State<PlatformPublisher>,
    Path(target): Path<String>,
    Json(input): Json<PublishInput>,
) -> ApiResult<PublishResult> {
    publisher
        .publish(&target, &input.content, &input.title, &input.options)
        .await
        .map(Json)
        .map_err(publish_error)
}

// ============================================================
// Batches
// ============================================================

pub async fn batch_publish(
    State(publisher): State<PlatformPublisher>,
    Json(request): Json<BatchPublishRequest>,
) -> ApiResult<BatchPublishResult> {
    publisher
        .publish_to_multiple(request)
        .await
        .map(Json)
        .map_err(publish_error)
}

pub async fn start_batch_task(
    State(publisher): State<PlatformPublisher>,
    Json(request): Json<BatchPublishRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    publisher
        .spawn_batch(request)
        .map(|task_id| (StatusCode::ACCEPTED, Json(json!({ "taskId": task_id }))))
        .map_err(publish_error)
}

pub async fn get_batch_task(
    State(publisher): State<PlatformPublisher>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<TaskProgress> {
    publisher.task_progress(task_id).map(Json).ok_or((
        StatusCode::NOT_FOUND,
        Json(json!({
            "success": false,
            "message": format!("任务不存在: {}", task_id),
            "error": "TaskNotFoundError",
        })),
    ))
}
