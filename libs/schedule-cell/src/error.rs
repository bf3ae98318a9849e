use chrono::NaiveDate;
use thiserror::Error;

use shared_models::error::AppError;

use crate::models::SlotTime;

#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Doctor {doctor_id} already has a slot at {slot} on {date}")]
    Conflict {
        doctor_id: String,
        date: NaiveDate,
        slot: SlotTime,
    },

    #[error("Slot not found: {0}")]
    NotFound(String),

    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Boundary error: {0}")]
    Boundary(String),

    /// The delete step of an update failed; the original record still exists.
    #[error("Slot {id} was not updated and still exists: {reason}")]
    UpdateNotApplied { id: String, reason: String },

    /// The delete step of an update succeeded but the recreate failed. The
    /// record no longer exists and local state must be reloaded.
    #[error("Slot {deleted_id} was deleted but could not be recreated: {reason}")]
    ReplaceFailed { deleted_id: String, reason: String },

    #[error("Local slot set is stale and must be reloaded: {0}")]
    ReloadRequired(String),
}

impl ScheduleError {
    pub fn requires_reload(&self) -> bool {
        matches!(self, ScheduleError::ReplaceFailed { .. } | ScheduleError::ReloadRequired(_))
    }
}

impl From<anyhow::Error> for ScheduleError {
    fn from(err: anyhow::Error) -> Self {
        ScheduleError::Boundary(err.to_string())
    }
}

impl From<ScheduleError> for AppError {
    fn from(err: ScheduleError) -> Self {
        let message = err.to_string();
        match err {
            ScheduleError::Validation(_) => AppError::ValidationError(message),
            ScheduleError::InvalidTransition { .. } => AppError::BadRequest(message),
            ScheduleError::Conflict { .. } => AppError::Conflict(message),
            ScheduleError::NotFound(_) => AppError::NotFound(message),
            ScheduleError::Boundary(_) | ScheduleError::UpdateNotApplied { .. } => {
                AppError::ExternalService(message)
            }
            ScheduleError::ReplaceFailed { .. } | ScheduleError::ReloadRequired(_) => {
                AppError::ReloadRequired(message)
            }
        }
    }
}

pub type ScheduleResult<T> = Result<T, ScheduleError>;
