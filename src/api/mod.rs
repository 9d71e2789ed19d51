mod handlers;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::orchestration::PlatformPublisher;

pub fn create_router(publisher: PlatformPublisher) -> Router {
    Router::new()
        // Platforms
        .route("/platforms", get(handlers::list_platforms))
        .route("/platform/{target}/initialize", post(handlers::initialize_platform))
        .route("/platform/{target}/login", post(handlers::open_login))
        .route("/platform/{target}/confirm-login", post(handlers::confirm_login))
        .route("/platform/{target}/status", get(handlers::platform_status))
        .route("/platform/{target}/publish", post(handlers::publish))
        // Batches
        .route("/batch-publish", post(handlers::batch_publish))
        .route("/batch-tasks", post(handlers::start_batch_task))
        .route("/batch-tasks/{task_id}", get(handlers::get_batch_task))
        // Health
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(publisher)
}
