use std::sync::LazyLock;

use chrono::{Datelike, Duration, NaiveDate};
use futures::stream::{self, StreamExt};
use regex::Regex;
use tracing::{debug, info, warn};

use crate::error::{ScheduleError, ScheduleResult};
use crate::models::{
    is_bookable_weekday, new_temp_id, BatchReport, CreateScheduleRequest, FailedSlot,
    GenerationMode, SemanticStatus, SkippedSlot, SlotDraft, SlotKey, SlotRecord, SlotTime,
    MAX_PATIENTS, MAX_REPEAT_WEEKS, MIN_PATIENTS, MIN_REPEAT_WEEKS,
};
use crate::services::boundary::{NewSlotRow, SlotBoundary};
use crate::services::conflict::{ConflictDetector, SlotCandidate};
use crate::services::formatter::RecordFormatter;
use crate::services::store::SlotStore;

static ROOM_CODE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,3}$").expect("room code pattern is valid"));

/// A request that passed validation, with capacity clamped and repeat dates expanded.
#[derive(Debug, Clone)]
pub struct ValidatedRequest {
    pub doctor_id: String,
    pub dates: Vec<NaiveDate>,
    pub mode: GenerationMode,
    pub room_code: String,
    pub max_patients: u8,
    pub warnings: Vec<String>,
}

/// Creation work for one batch. Drafts are grouped per (doctor, date, slot);
/// drafts inside a group are always submitted one after another.
#[derive(Debug, Clone, Default)]
pub struct BatchPlan {
    pub requested_slots: usize,
    pub groups: Vec<(SlotKey, Vec<SlotDraft>)>,
    pub skipped: Vec<SkippedSlot>,
    pub warnings: Vec<String>,
}

impl BatchPlan {
    pub fn draft_count(&self) -> usize {
        self.groups.iter().map(|(_, drafts)| drafts.len()).sum()
    }
}

#[derive(Debug, Default)]
struct GroupOutcome {
    created: Vec<SlotRecord>,
    failed: Vec<FailedSlot>,
    warnings: Vec<String>,
    unreadable: bool,
}

/// Expands one scheduling request into concrete slot creations.
pub struct BulkScheduleGenerator {
    formatter: RecordFormatter,
    max_concurrent_creates: usize,
}

impl BulkScheduleGenerator {
    pub fn new(formatter: RecordFormatter, max_concurrent_creates: usize) -> Self {
        Self {
            formatter,
            max_concurrent_creates: max_concurrent_creates.max(1),
        }
    }

    pub fn validate_date(date: NaiveDate, today: NaiveDate) -> ScheduleResult<()> {
        if !is_bookable_weekday(date.weekday()) {
            return Err(ScheduleError::Validation(format!(
                "{} is a Sunday; slots can only be scheduled Monday to Saturday",
                date
            )));
        }
        if date < today {
            return Err(ScheduleError::Validation(format!(
                "{} is in the past; slots cannot be scheduled before {}",
                date, today
            )));
        }
        Ok(())
    }

    pub fn validate_room_code(room_code: &str) -> ScheduleResult<String> {
        let room_code = room_code.trim();
        if room_code.is_empty() {
            return Err(ScheduleError::Validation("Room code is required".to_string()));
        }
        if !ROOM_CODE_PATTERN.is_match(room_code) {
            return Err(ScheduleError::Validation(format!(
                "Room code '{}' must be 1 to 3 digits",
                room_code
            )));
        }
        Ok(room_code.to_string())
    }

    /// Checks everything that can be checked without the boundary.
    pub fn validate(&self, request: &CreateScheduleRequest, today: NaiveDate) -> ScheduleResult<ValidatedRequest> {
        let doctor_id = request.doctor_id.trim();
        if doctor_id.is_empty() {
            return Err(ScheduleError::Validation("Doctor is required".to_string()));
        }

        Self::validate_date(request.date, today)?;
        let room_code = Self::validate_room_code(&request.room_code)?;

        let mut warnings = Vec::new();

        let requested_capacity = request.max_patients.unwrap_or(MIN_PATIENTS as i32);
        let max_patients = requested_capacity.clamp(MIN_PATIENTS as i32, MAX_PATIENTS as i32) as u8;
        if max_patients as i32 != requested_capacity {
            warnings.push(format!(
                "maxPatients {} is outside {}-{}; using {}",
                requested_capacity, MIN_PATIENTS, MAX_PATIENTS, max_patients
            ));
        }

        let repeat_weeks = request.repeat_weeks.unwrap_or(MIN_REPEAT_WEEKS);
        if !(MIN_REPEAT_WEEKS..=MAX_REPEAT_WEEKS).contains(&repeat_weeks) {
            return Err(ScheduleError::Validation(format!(
                "Repeat count must be between {} and {} weeks, got {}",
                MIN_REPEAT_WEEKS, MAX_REPEAT_WEEKS, repeat_weeks
            )));
        }

        let dates = (0..repeat_weeks as i64)
            .map(|week| request.date + Duration::days(7 * week))
            .collect();

        Ok(ValidatedRequest {
            doctor_id: doctor_id.to_string(),
            dates,
            mode: request.mode.clone(),
            room_code,
            max_patients,
            warnings,
        })
    }

    /// Runs the conflict detector over every (date, slot) pair.
    ///
    /// In single mode a conflict on the requested date itself fails the whole
    /// request; conflicts on repeated weeks, and any conflict in shift mode,
    /// only skip that pair.
    pub fn plan(&self, request: &CreateScheduleRequest, existing: &[SlotRecord], today: NaiveDate) -> ScheduleResult<BatchPlan> {
        let validated = self.validate(request, today)?;
        let slots = validated.mode.slots();
        let mut detector = ConflictDetector::new();
        let mut plan = BatchPlan {
            warnings: validated.warnings.clone(),
            ..BatchPlan::default()
        };

        for (week, date) in validated.dates.iter().copied().enumerate() {
            let mut planned_for_date = 0;

            for slot in slots.iter().copied() {
                plan.requested_slots += 1;
                let candidate = SlotCandidate::new(&validated.doctor_id, date, slot);

                if !detector.try_reserve(&candidate, existing) {
                    if week == 0 && matches!(validated.mode, GenerationMode::Single { .. }) {
                        return Err(ScheduleError::Conflict {
                            doctor_id: validated.doctor_id.clone(),
                            date,
                            slot,
                        });
                    }
                    warn!("Skipping slot {} on {} for doctor {}: already exists", slot, date, validated.doctor_id);
                    plan.warnings.push(format!("Slot {} on {} already exists and was skipped", slot, date));
                    plan.skipped.push(SkippedSlot {
                        date,
                        slot,
                        reason: "slot already exists".to_string(),
                    });
                    continue;
                }

                planned_for_date += 1;
                let drafts = (0..validated.max_patients)
                    .map(|_| Self::draft(&validated, date, slot))
                    .collect();
                plan.groups.push((candidate_key(&validated.doctor_id, date, slot), drafts));
            }

            if planned_for_date == 0 {
                if let GenerationMode::Shift { shift_type } = validated.mode {
                    plan.warnings.push(format!(
                        "All {} shift slots on {} already exist; nothing was created for that day",
                        shift_type, date
                    ));
                }
            }
        }

        debug!(
            "Planned {} slot groups ({} records) for doctor {}, {} skipped",
            plan.groups.len(),
            plan.draft_count(),
            validated.doctor_id,
            plan.skipped.len()
        );

        Ok(plan)
    }

    fn draft(validated: &ValidatedRequest, date: NaiveDate, slot: SlotTime) -> SlotDraft {
        SlotDraft {
            temp_id: new_temp_id(),
            doctor_id: validated.doctor_id.clone(),
            date,
            slot,
            room_code: validated.room_code.clone(),
            status: SemanticStatus::Available,
            shift_type: Some(slot.shift()),
            max_patients: validated.max_patients,
            patient_id: None,
        }
    }

    /// Submits every draft. Groups run concurrently up to the configured
    /// limit; a failed create is recorded and the batch carries on.
    pub async fn submit<B>(&self, boundary: &B, plan: BatchPlan) -> BatchReport
    where
        B: SlotBoundary + ?Sized,
    {
        let mut report = BatchReport {
            requested_slots: plan.requested_slots,
            requested_records: plan.draft_count(),
            skipped: plan.skipped,
            warnings: plan.warnings,
            ..BatchReport::default()
        };

        let outcomes: Vec<GroupOutcome> = stream::iter(plan.groups)
            .map(|(key, drafts)| self.submit_group(boundary, key, drafts))
            .buffered(self.max_concurrent_creates)
            .collect()
            .await;

        for outcome in outcomes {
            report.created.extend(outcome.created);
            report.failed.extend(outcome.failed);
            report.warnings.extend(outcome.warnings);
            report.reload_required |= outcome.unreadable;
        }

        report.created_records = report.created.len();
        if !report.failed.is_empty() {
            report.reload_required = true;
            report.warnings.push(format!(
                "{} of {} slot records could not be created",
                report.failed.len(),
                report.requested_records
            ));
        }

        info!(
            "Schedule batch finished: {} requested, {} created, {} skipped, {} failed",
            report.requested_records,
            report.created_records,
            report.skipped.len(),
            report.failed.len()
        );

        report
    }

    async fn submit_group<B>(&self, boundary: &B, key: SlotKey, drafts: Vec<SlotDraft>) -> GroupOutcome
    where
        B: SlotBoundary + ?Sized,
    {
        let mut outcome = GroupOutcome::default();

        for draft in drafts {
            let row = NewSlotRow::from_draft(&draft, self.formatter.translator());
            match boundary.create_slot(row).await {
                Ok(raw) => match self.formatter.normalize_with_fallback(&raw, Some(&draft.temp_id)) {
                    Some(record) => outcome.created.push(record),
                    None => {
                        outcome.warnings.push(format!(
                            "Slot {} was created but the response could not be read",
                            key
                        ));
                        outcome.unreadable = true;
                        outcome.created.push(draft.to_temporary_record());
                    }
                },
                Err(e) => {
                    warn!("Failed to create slot {}: {}", key, e);
                    outcome.failed.push(FailedSlot {
                        date: draft.date,
                        slot: draft.slot,
                        temp_id: draft.temp_id.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        outcome
    }

    /// Plan against the store, submit, then merge the created records in one write.
    pub async fn generate<B>(
        &self,
        boundary: &B,
        store: &SlotStore,
        request: &CreateScheduleRequest,
        today: NaiveDate,
    ) -> ScheduleResult<BatchReport>
    where
        B: SlotBoundary + ?Sized,
    {
        let existing = store.records().await;
        let plan = self.plan(request, &existing, today)?;
        let report = self.submit(boundary, plan).await;

        store.merge_batch(report.created.clone()).await;
        if report.reload_required {
            store.mark_stale("schedule batch had boundary failures").await;
        }

        Ok(report)
    }
}

fn candidate_key(doctor_id: &str, date: NaiveDate, slot: SlotTime) -> SlotKey {
    SlotKey {
        doctor_id: doctor_id.to_string(),
        date,
        slot,
    }
}
