use chrono::{Datelike, Local, NaiveDate};
use tracing::{debug, error, info, warn};

use crate::error::{ScheduleError, ScheduleResult};
use crate::models::{
    is_bookable_weekday, BatchReport, CreateScheduleRequest, DeleteOutcome, DoctorSummary, SlotDraft, SlotRecord,
    StatusTransitionRequest, UpdateOutcome, UpdateSlotRequest,
};
use crate::services::boundary::{is_safe_filter_value, NewSlotRow, SlotBoundary};
use crate::services::calendar::CalendarProjection;
use crate::services::conflict::{ConflictDetector, SlotCandidate};
use crate::services::formatter::RecordFormatter;
use crate::services::generator::BulkScheduleGenerator;
use crate::services::status::StatusTranslator;
use crate::services::store::SlotStore;

/// One schedule-editing session: a boundary, the shared slot store and the
/// components that read and write it.
pub struct ScheduleService<B: SlotBoundary> {
    boundary: B,
    store: SlotStore,
    formatter: RecordFormatter,
    generator: BulkScheduleGenerator,
}

impl<B: SlotBoundary> ScheduleService<B> {
    pub fn new(boundary: B, store: SlotStore, max_concurrent_creates: usize) -> Self {
        let formatter = RecordFormatter::new(StatusTranslator::default());
        Self {
            boundary,
            store,
            generator: BulkScheduleGenerator::new(formatter.clone(), max_concurrent_creates),
            formatter,
        }
    }

    pub fn store(&self) -> &SlotStore {
        &self.store
    }

    pub fn boundary(&self) -> &B {
        &self.boundary
    }

    fn today() -> NaiveDate {
        Local::now().date_naive()
    }

    /// Replaces the local slot set with the boundary's listing.
    pub async fn reload(&self) -> ScheduleResult<usize> {
        let raws = self.boundary.list_slots().await.map_err(|e| {
            error!("Failed to list slots: {}", e);
            ScheduleError::Boundary(e.to_string())
        })?;
        let records = self.formatter.normalize_all(&raws);
        let count = records.len();
        self.store.replace_all(records).await;
        info!("Reloaded {} slot records from boundary", count);
        Ok(count)
    }

    /// Reloads when the store was never loaded or has been marked stale.
    pub async fn load_if_needed(&self) -> ScheduleResult<()> {
        if self.store.version().await == 0 || self.store.is_stale().await {
            self.reload().await?;
        }
        Ok(())
    }

    pub async fn list_slots(&self, doctor_id: Option<&str>) -> ScheduleResult<Vec<SlotRecord>> {
        self.load_if_needed().await?;
        let records = self.store.records().await;
        Ok(CalendarProjection::filter_by_doctor(&records, doctor_id))
    }

    pub async fn list_doctors(&self) -> ScheduleResult<Vec<DoctorSummary>> {
        let raws = self.boundary.list_doctors().await?;
        Ok(self.formatter.normalize_doctors(&raws))
    }

    pub async fn create_schedule(&self, request: &CreateScheduleRequest) -> ScheduleResult<BatchReport> {
        self.create_schedule_on(request, Self::today()).await
    }

    /// Runs one generator batch. When the boundary rejected part of the batch
    /// the store is refetched, since the boundary is the final arbiter.
    pub async fn create_schedule_on(&self, request: &CreateScheduleRequest, today: NaiveDate) -> ScheduleResult<BatchReport> {
        let mut report = self
            .generator
            .generate(&self.boundary, &self.store, request, today)
            .await?;

        if report.reload_required {
            match self.reload().await {
                Ok(_) => report.reload_required = false,
                Err(e) => warn!("Reload after partial batch failed, store stays stale: {}", e),
            }
        }

        Ok(report)
    }

    pub async fn update_slot(&self, id: &str, request: UpdateSlotRequest) -> ScheduleResult<UpdateOutcome> {
        self.update_slot_on(id, request, Self::today()).await
    }

    /// Replaces a slot by deleting it and creating the merged record.
    ///
    /// The two steps are not atomic. If the delete fails the record is intact
    /// (`UpdateNotApplied`). If the create fails after the delete the record is
    /// gone (`ReplaceFailed`); it is removed locally, the store is marked stale
    /// and nothing is restored.
    pub async fn update_slot_on(&self, id: &str, request: UpdateSlotRequest, today: NaiveDate) -> ScheduleResult<UpdateOutcome> {
        let existing = self
            .store
            .get(id)
            .await
            .ok_or_else(|| ScheduleError::NotFound(id.to_string()))?;

        if existing.is_temporary() {
            return Err(ScheduleError::ReloadRequired(format!(
                "slot {} has not been confirmed by the boundary yet",
                id
            )));
        }

        let merged = self.merge_update(&existing, &request, today).await?;
        self.replace(existing, merged).await
    }

    /// Applies a lifecycle step (claim, payment, completion, cancellation).
    pub async fn transition_status(&self, id: &str, request: StatusTransitionRequest) -> ScheduleResult<UpdateOutcome> {
        let update = UpdateSlotRequest {
            status: Some(request.status),
            patient_id: request.patient_id,
            ..UpdateSlotRequest::default()
        };
        self.update_slot(id, update).await
    }

    async fn merge_update(&self, existing: &SlotRecord, request: &UpdateSlotRequest, today: NaiveDate) -> ScheduleResult<SlotRecord> {
        let mut merged = existing.clone();

        if let Some(room_code) = &request.room_code {
            merged.room_code = BulkScheduleGenerator::validate_room_code(room_code)?;
        }

        let moved = request.date.is_some_and(|d| d != existing.date)
            || request.slot.is_some_and(|s| s != existing.slot);
        if let Some(date) = request.date {
            merged.date = date;
        }
        if let Some(slot) = request.slot {
            merged.slot = slot;
            merged.shift_type = Some(slot.shift());
        }

        // A pure lifecycle step (status, optionally with the patient it
        // concerns) may touch a past record. Every other update recreates the
        // record and must land on a bookable date. Sunday is never allowed.
        let lifecycle_only = request.status.is_some()
            && request.date.is_none()
            && request.slot.is_none()
            && request.room_code.is_none();
        if lifecycle_only {
            if !is_bookable_weekday(merged.date.weekday()) {
                return Err(ScheduleError::Validation(format!(
                    "{} is a Sunday; slots can only exist Monday to Saturday",
                    merged.date
                )));
            }
        } else {
            BulkScheduleGenerator::validate_date(merged.date, today)?;
        }

        if moved {
            let existing_records = self.store.records().await;
            let candidate = SlotCandidate::new(&merged.doctor_id, merged.date, merged.slot);
            if ConflictDetector::has_conflict_excluding(&candidate, &existing_records, &existing.id) {
                return Err(ScheduleError::Conflict {
                    doctor_id: merged.doctor_id.clone(),
                    date: merged.date,
                    slot: merged.slot,
                });
            }
        }

        if let Some(status) = &request.status {
            if !existing.status.can_transition_to(status) {
                return Err(ScheduleError::InvalidTransition {
                    from: existing.status.to_string(),
                    to: status.to_string(),
                });
            }
            merged.status = status.clone();
        }

        if request.clear_patient {
            merged.patient_id = None;
        } else if let Some(patient_id) = &request.patient_id {
            merged.patient_id = Some(patient_id.clone());
        }

        Ok(merged)
    }

    async fn replace(&self, existing: SlotRecord, merged: SlotRecord) -> ScheduleResult<UpdateOutcome> {
        let old_id = existing.id.clone();
        debug!("Replacing slot {} via delete and create", old_id);

        match self.boundary.delete_slot(&old_id).await {
            Ok(DeleteOutcome::Deleted) => {}
            Ok(DeleteOutcome::NotFound) => {
                self.store.remove(&old_id).await;
                self.store.mark_stale("slot to update no longer exists at boundary").await;
                return Err(ScheduleError::NotFound(old_id));
            }
            Err(e) => {
                warn!("Update of slot {} aborted, delete failed: {}", old_id, e);
                return Err(ScheduleError::UpdateNotApplied {
                    id: old_id,
                    reason: e.to_string(),
                });
            }
        }

        let draft = SlotDraft::from_record(&merged);
        let row = NewSlotRow::from_draft(&draft, self.formatter.translator());

        match self.boundary.create_slot(row).await {
            Ok(raw) => {
                let record = self
                    .formatter
                    .normalize_with_fallback(&raw, Some(&draft.temp_id))
                    .unwrap_or_else(|| draft.to_temporary_record());
                if record.is_temporary() {
                    self.store.mark_stale("replacement slot returned without a readable id").await;
                }
                self.store.apply_replace(&[old_id.clone()], vec![record.clone()]).await;
                info!("Slot {} replaced by {}", old_id, record.id);
                Ok(UpdateOutcome { old_id, record })
            }
            Err(e) => {
                error!("Slot {} was deleted but recreating it failed: {}", old_id, e);
                self.store.remove(&old_id).await;
                self.store.mark_stale("replace failed after delete").await;
                Err(ScheduleError::ReplaceFailed {
                    deleted_id: old_id,
                    reason: e.to_string(),
                })
            }
        }
    }

    pub async fn delete_slot(&self, id: &str) -> ScheduleResult<DeleteOutcome> {
        if !is_safe_filter_value(id) {
            return Err(ScheduleError::Validation(format!("Invalid slot id '{}'", id)));
        }

        let outcome = self.boundary.delete_slot(id).await.map_err(|e| {
            warn!("Failed to delete slot {}: {}", id, e);
            ScheduleError::Boundary(e.to_string())
        })?;

        if self.store.remove(id).await.is_none() && outcome == DeleteOutcome::Deleted {
            debug!("Deleted slot {} was not in the local store", id);
        }
        if outcome == DeleteOutcome::NotFound {
            warn!("Slot {} was already gone at the boundary", id);
        }

        Ok(outcome)
    }
}
