use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use schedule_cell::handlers::ScheduleState;
use schedule_cell::router::schedule_routes;
use shared_config::AppConfig;

pub fn create_router(config: AppConfig) -> Router {
    let schedule_state = Arc::new(ScheduleState::new(config));

    Router::new()
        .route("/", get(|| async { "Clinic schedule API is running!" }))
        .nest("/schedule", schedule_routes(schedule_state))
}
