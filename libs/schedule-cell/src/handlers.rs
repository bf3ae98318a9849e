use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::TypedHeader;
use chrono::{Local, NaiveDate};
use headers::{Authorization, authorization::Bearer};
use serde::Deserialize;
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::{CalendarMode, CreateScheduleRequest, DeleteOutcome, StatusTransitionRequest, UpdateSlotRequest};
use crate::services::{
    boundary::SupabaseSlotBoundary,
    calendar::CalendarProjection,
    schedule::ScheduleService,
    store::SlotStore,
};

/// State shared by the schedule routes. The store outlives requests; the
/// boundary is rebuilt per request around the caller's bearer token.
#[derive(Debug, Clone)]
pub struct ScheduleState {
    pub config: AppConfig,
    pub store: SlotStore,
}

impl ScheduleState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            store: SlotStore::new(),
        }
    }

    fn service(&self, token: &str) -> ScheduleService<SupabaseSlotBoundary> {
        ScheduleService::new(
            SupabaseSlotBoundary::new(&self.config).with_token(token),
            self.store.clone(),
            self.config.max_concurrent_creates,
        )
    }
}

#[derive(Debug, Deserialize)]
pub struct DoctorFilterQuery {
    pub doctor_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WeekQuery {
    pub date: Option<NaiveDate>,
    pub doctor_id: Option<String>,
}

// ==============================================================================
// SLOT HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_slots(
    State(state): State<Arc<ScheduleState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Query(query): Query<DoctorFilterQuery>,
) -> Result<Json<Value>, AppError> {
    let service = state.service(auth.token());

    let slots = service.list_slots(query.doctor_id.as_deref()).await?;
    let stale = service.store().is_stale().await;

    Ok(Json(json!({
        "slots": slots,
        "total": slots.len(),
        "stale": stale
    })))
}

#[axum::debug_handler]
pub async fn reload_slots(
    State(state): State<Arc<ScheduleState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let service = state.service(auth.token());

    let total = service.reload().await?;

    Ok(Json(json!({
        "reloaded": true,
        "total": total
    })))
}

#[axum::debug_handler]
pub async fn create_schedule_batch(
    State(state): State<Arc<ScheduleState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<CreateScheduleRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let service = state.service(auth.token());
    service.load_if_needed().await?;

    let report = service.create_schedule(&request).await?;

    let status = if report.is_complete() {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((status, Json(json!({
        "requested": report.requested_records,
        "created": report.created_records,
        "skipped": report.skipped_count(),
        "failed": report.failed_count(),
        "partial": !report.is_complete(),
        "report": report
    }))))
}

#[axum::debug_handler]
pub async fn update_slot(
    State(state): State<Arc<ScheduleState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(slot_id): Path<String>,
    Json(request): Json<UpdateSlotRequest>,
) -> Result<Json<Value>, AppError> {
    let service = state.service(auth.token());
    service.load_if_needed().await?;

    let outcome = service.update_slot(&slot_id, request).await?;

    Ok(Json(json!({
        "old_id": outcome.old_id,
        "slot": outcome.record
    })))
}

#[axum::debug_handler]
pub async fn transition_slot_status(
    State(state): State<Arc<ScheduleState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(slot_id): Path<String>,
    Json(request): Json<StatusTransitionRequest>,
) -> Result<Json<Value>, AppError> {
    let service = state.service(auth.token());
    service.load_if_needed().await?;

    let outcome = service.transition_status(&slot_id, request).await?;

    Ok(Json(json!({
        "old_id": outcome.old_id,
        "slot": outcome.record
    })))
}

#[axum::debug_handler]
pub async fn delete_slot(
    State(state): State<Arc<ScheduleState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(slot_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = state.service(auth.token());

    match service.delete_slot(&slot_id).await? {
        DeleteOutcome::Deleted => Ok(Json(json!({
            "deleted": true,
            "id": slot_id
        }))),
        DeleteOutcome::NotFound => Err(AppError::NotFound(format!("Slot {} not found", slot_id))),
    }
}

// ==============================================================================
// PROJECTION HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn month_calendar(
    State(state): State<Arc<ScheduleState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Query(query): Query<DoctorFilterQuery>,
) -> Result<Json<Value>, AppError> {
    let service = state.service(auth.token());

    let slots = service.list_slots(query.doctor_id.as_deref()).await?;
    let view = CalendarProjection::project(&slots, CalendarMode::Month, Local::now().date_naive());

    Ok(Json(json!(view)))
}

#[axum::debug_handler]
pub async fn week_calendar(
    State(state): State<Arc<ScheduleState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Query(query): Query<WeekQuery>,
) -> Result<Json<Value>, AppError> {
    let service = state.service(auth.token());

    let slots = service.list_slots(query.doctor_id.as_deref()).await?;
    let reference = query.date.unwrap_or_else(|| Local::now().date_naive());
    let view = CalendarProjection::project(&slots, CalendarMode::WeekList, reference);

    Ok(Json(json!(view)))
}

#[axum::debug_handler]
pub async fn schedule_summary(
    State(state): State<Arc<ScheduleState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Query(query): Query<DoctorFilterQuery>,
) -> Result<Json<Value>, AppError> {
    let service = state.service(auth.token());

    let slots = service.list_slots(query.doctor_id.as_deref()).await?;

    Ok(Json(json!(CalendarProjection::summarize(&slots))))
}

#[axum::debug_handler]
pub async fn list_doctors(
    State(state): State<Arc<ScheduleState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let service = state.service(auth.token());

    let doctors = service.list_doctors().await?;

    Ok(Json(json!({
        "doctors": doctors,
        "total": doctors.len()
    })))
}
