use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, put, patch},
};

use crate::handlers::{self, ScheduleState};

pub fn schedule_routes(state: Arc<ScheduleState>) -> Router {
    Router::new()
        // Slot records
        .route("/slots", get(handlers::list_slots))
        .route("/slots/reload", post(handlers::reload_slots))
        .route("/slots/batch", post(handlers::create_schedule_batch))
        .route("/slots/{slot_id}", put(handlers::update_slot).delete(handlers::delete_slot))
        .route("/slots/{slot_id}/status", patch(handlers::transition_slot_status))

        // Derived views
        .route("/calendar/month", get(handlers::month_calendar))
        .route("/calendar/week", get(handlers::week_calendar))
        .route("/summary", get(handlers::schedule_summary))

        .route("/doctors", get(handlers::list_doctors))
        .with_state(state)
}
