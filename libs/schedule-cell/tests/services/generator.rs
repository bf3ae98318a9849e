use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;
use assert_matches::assert_matches;
use async_trait::async_trait;
use serde_json::{json, Value};

use schedule_cell::error::ScheduleError;
use schedule_cell::models::{
    CreateScheduleRequest, DeleteOutcome, GenerationMode, SemanticStatus, ShiftType, SlotTime,
};
use schedule_cell::services::boundary::{NewSlotRow, SlotBoundary};
use schedule_cell::services::formatter::RecordFormatter;
use schedule_cell::services::generator::BulkScheduleGenerator;
use schedule_cell::services::store::SlotStore;

use super::{day, persisted_row, today, InMemoryBoundary};

fn shift_request(doctor_id: &str, date: &str, shift_type: ShiftType, max_patients: i32) -> CreateScheduleRequest {
    CreateScheduleRequest {
        doctor_id: doctor_id.to_string(),
        date: date.parse().unwrap(),
        room_code: "101".to_string(),
        max_patients: Some(max_patients),
        mode: GenerationMode::Shift { shift_type },
        repeat_weeks: None,
    }
}

fn single_request(doctor_id: &str, date: &str, slot: SlotTime, repeat_weeks: u32) -> CreateScheduleRequest {
    CreateScheduleRequest {
        doctor_id: doctor_id.to_string(),
        date: date.parse().unwrap(),
        room_code: "101".to_string(),
        max_patients: Some(1),
        mode: GenerationMode::Single { slot },
        repeat_weeks: Some(repeat_weeks),
    }
}

async fn store_from(rows: &[serde_json::Value]) -> SlotStore {
    SlotStore::with_records(RecordFormatter::default().normalize_all(rows))
}

#[tokio::test]
async fn test_morning_shift_with_capacity_two() {
    let boundary = InMemoryBoundary::new();
    let store = SlotStore::new();
    let generator = BulkScheduleGenerator::new(RecordFormatter::default(), 4);

    let report = generator
        .generate(&boundary, &store, &shift_request("D", "2025-03-10", ShiftType::Morning, 2), today())
        .await
        .unwrap();

    assert_eq!(report.requested_slots, 4);
    assert_eq!(report.created_records, 8);
    assert!(report.is_complete());

    let records = store.records().await;
    assert_eq!(records.len(), 8);
    assert!(records.iter().all(|r| r.status == SemanticStatus::Available));
    assert!(records.iter().all(|r| r.date == day(2025, 3, 10) && r.doctor_id == "D"));
    for slot in ShiftType::Morning.slots() {
        assert_eq!(records.iter().filter(|r| r.slot == slot).count(), 2);
    }
}

#[tokio::test]
async fn test_shift_skips_existing_slot_with_warning() {
    let existing = vec![persisted_row("existing-9", "D", "2025-03-10", "09:00:00", "Trống")];
    let boundary = InMemoryBoundary::with_rows(existing.clone());
    let store = store_from(&existing).await;
    let generator = BulkScheduleGenerator::new(RecordFormatter::default(), 4);

    let report = generator
        .generate(&boundary, &store, &shift_request("D", "2025-03-10", ShiftType::Morning, 2), today())
        .await
        .unwrap();

    assert_eq!(report.created_records, 6);
    assert_eq!(report.skipped_count(), 1);
    assert_eq!(report.skipped[0].slot, SlotTime::H09);
    assert!(report.warnings.iter().any(|w| w.contains("09:00:00")));
    assert!(report.is_partial());
    assert_eq!(store.len().await, 7);
}

#[tokio::test]
async fn test_shift_with_half_the_slots_taken() {
    let existing = vec![
        persisted_row("e-13", "D", "2025-03-11", "13:00:00", "Đã đặt"),
        persisted_row("e-15", "D", "2025-03-11", "15:00:00", "Trống"),
    ];
    let boundary = InMemoryBoundary::with_rows(existing.clone());
    let store = store_from(&existing).await;
    let generator = BulkScheduleGenerator::new(RecordFormatter::default(), 2);

    let report = generator
        .generate(&boundary, &store, &shift_request("D", "2025-03-11", ShiftType::Afternoon, 3), today())
        .await
        .unwrap();

    assert_eq!(report.created_records, 2 * 3);
    assert_eq!(report.skipped_count(), 2);
    assert_eq!(boundary.creates(), 6);
}

#[tokio::test]
async fn test_fully_taken_shift_creates_nothing_and_warns() {
    let existing: Vec<_> = ShiftType::Afternoon
        .slots()
        .iter()
        .map(|slot| persisted_row(&format!("e-{}", slot.hour()), "D", "2025-03-11", slot.as_str(), "Trống"))
        .collect();
    let boundary = InMemoryBoundary::with_rows(existing.clone());
    let store = store_from(&existing).await;
    let generator = BulkScheduleGenerator::new(RecordFormatter::default(), 4);

    let report = generator
        .generate(&boundary, &store, &shift_request("D", "2025-03-11", ShiftType::Afternoon, 1), today())
        .await
        .unwrap();

    assert_eq!(report.created_records, 0);
    assert_eq!(boundary.creates(), 0);
    assert!(report.warnings.iter().any(|w| w.contains("afternoon") && w.contains("2025-03-11")));
}

#[tokio::test]
async fn test_single_mode_conflict_creates_nothing() {
    let existing = vec![persisted_row("e-1", "D", "2025-03-10", "10:00:00", "Đã hủy")];
    let boundary = InMemoryBoundary::with_rows(existing.clone());
    let store = store_from(&existing).await;
    let generator = BulkScheduleGenerator::new(RecordFormatter::default(), 4);

    let result = generator
        .generate(&boundary, &store, &single_request("D", "2025-03-10", SlotTime::H10, 4), today())
        .await;

    assert_matches!(result, Err(ScheduleError::Conflict { slot: SlotTime::H10, .. }));
    assert_eq!(boundary.creates(), 0);
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn test_single_mode_repeat_attempts_at_most_r_slots() {
    // Second week already has the slot, so it is skipped.
    let existing = vec![persisted_row("e-1", "D", "2025-03-17", "08:00:00", "Trống")];
    let boundary = InMemoryBoundary::with_rows(existing.clone());
    let store = store_from(&existing).await;
    let generator = BulkScheduleGenerator::new(RecordFormatter::default(), 4);

    let report = generator
        .generate(&boundary, &store, &single_request("D", "2025-03-10", SlotTime::H08, 3), today())
        .await
        .unwrap();

    assert!(boundary.creates() <= 3);
    assert_eq!(report.requested_slots, 3);
    assert_eq!(report.created_records, 2);
    assert_eq!(report.skipped[0].date, day(2025, 3, 17));

    let dates: Vec<_> = report.created.iter().map(|r| r.date).collect();
    assert!(dates.contains(&day(2025, 3, 10)));
    assert!(dates.contains(&day(2025, 3, 24)));
}

#[tokio::test]
async fn test_sunday_is_rejected_before_any_create() {
    let boundary = InMemoryBoundary::new();
    let store = SlotStore::new();
    let generator = BulkScheduleGenerator::new(RecordFormatter::default(), 4);

    let result = generator
        .generate(&boundary, &store, &shift_request("D", "2025-03-16", ShiftType::Morning, 1), today())
        .await;

    assert_matches!(result, Err(ScheduleError::Validation(_)));
    assert_eq!(boundary.creates(), 0);
}

#[tokio::test]
async fn test_past_date_and_bad_repeat_are_rejected() {
    let generator = BulkScheduleGenerator::new(RecordFormatter::default(), 4);

    let past = single_request("D", "2025-02-28", SlotTime::H08, 1);
    assert_matches!(generator.validate(&past, today()), Err(ScheduleError::Validation(_)));

    let too_many = single_request("D", "2025-03-10", SlotTime::H08, 13);
    assert_matches!(generator.validate(&too_many, today()), Err(ScheduleError::Validation(_)));

    let zero = single_request("D", "2025-03-10", SlotTime::H08, 0);
    assert_matches!(generator.validate(&zero, today()), Err(ScheduleError::Validation(_)));

    let mut no_doctor = single_request("  ", "2025-03-10", SlotTime::H08, 1);
    no_doctor.room_code = "101".to_string();
    assert_matches!(generator.validate(&no_doctor, today()), Err(ScheduleError::Validation(_)));
}

#[tokio::test]
async fn test_partial_failure_is_reported_and_marks_store_stale() {
    let boundary = InMemoryBoundary::new();
    *boundary.fail_creates_after.lock().await = Some(5);
    let store = SlotStore::new();
    let generator = BulkScheduleGenerator::new(RecordFormatter::default(), 1);

    let report = generator
        .generate(&boundary, &store, &shift_request("D", "2025-03-10", ShiftType::Morning, 2), today())
        .await
        .unwrap();

    assert_eq!(report.requested_records, 8);
    assert_eq!(report.created_records, 5);
    assert_eq!(report.failed_count(), 3);
    assert!(report.is_partial());
    assert!(report.reload_required);
    assert!(store.is_stale().await);
    assert_eq!(store.len().await, 5);
}

#[tokio::test]
async fn test_repeat_dates_are_weekly() {
    let generator = BulkScheduleGenerator::new(RecordFormatter::default(), 4);
    let validated = generator
        .validate(&single_request("D", "2025-03-10", SlotTime::H08, 3), today())
        .unwrap();

    assert_eq!(validated.dates, vec![day(2025, 3, 10), day(2025, 3, 17), day(2025, 3, 24)]);
}

/// Counts creates in flight, overall and per (doctor, date, slot).
#[derive(Default)]
struct InFlightBoundary {
    state: Mutex<InFlight>,
}

#[derive(Default)]
struct InFlight {
    per_key: HashMap<String, usize>,
    total: usize,
    max_per_key: usize,
    max_total: usize,
    created: usize,
}

#[async_trait]
impl SlotBoundary for InFlightBoundary {
    async fn list_slots(&self) -> Result<Vec<Value>> {
        Ok(vec![])
    }

    async fn create_slot(&self, row: NewSlotRow) -> Result<Value> {
        let key = format!("{}|{}|{}", row.doctor_id, row.date, row.slot);
        {
            let mut state = self.state.lock().unwrap();
            let count = state.per_key.entry(key.clone()).or_default();
            *count += 1;
            let current = *count;
            state.total += 1;
            state.max_per_key = state.max_per_key.max(current);
            state.max_total = state.max_total.max(state.total);
        }

        tokio::time::sleep(Duration::from_millis(10)).await;

        let id = {
            let mut state = self.state.lock().unwrap();
            if let Some(count) = state.per_key.get_mut(&key) {
                *count -= 1;
            }
            state.total -= 1;
            state.created += 1;
            format!("slot-{}", state.created)
        };

        let mut value = serde_json::to_value(&row)?;
        value["id"] = json!(id);
        Ok(value)
    }

    async fn delete_slot(&self, _id: &str) -> Result<DeleteOutcome> {
        Ok(DeleteOutcome::NotFound)
    }

    async fn list_doctors(&self) -> Result<Vec<Value>> {
        Ok(vec![])
    }
}

#[tokio::test]
async fn test_same_slot_creates_are_sequential_while_slots_run_concurrently() {
    let boundary = InFlightBoundary::default();
    let store = SlotStore::new();
    let generator = BulkScheduleGenerator::new(RecordFormatter::default(), 4);

    let report = generator
        .generate(&boundary, &store, &shift_request("D", "2025-03-10", ShiftType::Morning, 5), today())
        .await
        .unwrap();

    assert_eq!(report.created_records, 20);

    let state = boundary.state.lock().unwrap();
    assert_eq!(state.created, 20);
    assert_eq!(state.max_per_key, 1);
    assert!(state.max_total > 1, "independent slots never overlapped");
    assert!(state.max_total <= 4);
}
