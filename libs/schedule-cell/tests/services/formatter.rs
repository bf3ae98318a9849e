use serde_json::json;

use schedule_cell::models::{SemanticStatus, ShiftType, SlotTime, TEMP_ID_PREFIX};
use schedule_cell::services::formatter::RecordFormatter;

use super::{day, persisted_row};

#[test]
fn test_canonical_row_normalizes() {
    let formatter = RecordFormatter::default();
    let raw = persisted_row("slot-1", "doc-1", "2025-03-10", "09:00:00", "Đã đặt");

    let record = formatter.normalize(&raw).unwrap();

    assert_eq!(record.id, "slot-1");
    assert_eq!(record.doctor_id, "doc-1");
    assert_eq!(record.date, day(2025, 3, 10));
    assert_eq!(record.slot, SlotTime::H09);
    assert_eq!(record.status, SemanticStatus::Booked);
    assert_eq!(record.effective_shift(), ShiftType::Morning);
}

#[test]
fn test_alternate_field_names() {
    let formatter = RecordFormatter::default();
    let raw = json!({
        "_id": 42,
        "doctor": {"id": "doc-7", "full_name": "Dr. Le"},
        "work_date": "2025-03-12T00:00:00Z",
        "timeSlot": "14:00",
        "room": 205,
        "trang_thai": "Hoàn thành",
        "maxPatients": "3",
        "patient": {"_id": "pat-9"}
    });

    let record = formatter.normalize(&raw).unwrap();

    assert_eq!(record.id, "42");
    assert_eq!(record.doctor_id, "doc-7");
    assert_eq!(record.date, day(2025, 3, 12));
    assert_eq!(record.slot, SlotTime::H14);
    assert_eq!(record.room_code, "205");
    assert_eq!(record.status, SemanticStatus::Completed);
    assert_eq!(record.max_patients, 3);
    assert_eq!(record.patient_id.as_deref(), Some("pat-9"));
}

#[test]
fn test_defaults_for_missing_fields() {
    let formatter = RecordFormatter::default();
    let raw = json!({"doctor_id": "doc-1", "date": "2025-03-10"});

    let record = formatter.normalize(&raw).unwrap();

    assert!(record.id.starts_with(TEMP_ID_PREFIX));
    assert_eq!(record.slot, SlotTime::H08);
    assert_eq!(record.room_code, "100");
    assert_eq!(record.status, SemanticStatus::Available);
    assert_eq!(record.max_patients, 1);
    assert_eq!(record.shift_type, None);
}

#[test]
fn test_fallback_id_is_used_before_a_fresh_temp_id() {
    let formatter = RecordFormatter::default();
    let raw = json!({"doctor_id": "doc-1", "date": "2025-03-10", "slot": "10:00:00"});

    let record = formatter.normalize_with_fallback(&raw, Some("temp-draft-1")).unwrap();
    assert_eq!(record.id, "temp-draft-1");
    assert!(record.is_temporary());
}

#[test]
fn test_unknown_status_is_preserved() {
    let formatter = RecordFormatter::default();
    let raw = persisted_row("slot-1", "doc-1", "2025-03-10", "09:00:00", "Tạm ngưng");

    let record = formatter.normalize(&raw).unwrap();
    assert_eq!(record.status, SemanticStatus::Unknown("Tạm ngưng".to_string()));
}

#[test]
fn test_inconsistent_shift_is_derived_from_slot() {
    let formatter = RecordFormatter::default();
    let mut raw = persisted_row("slot-1", "doc-1", "2025-03-10", "15:00:00", "Trống");
    raw["shift_type"] = json!("morning");

    let record = formatter.normalize(&raw).unwrap();
    assert_eq!(record.shift_type, Some(ShiftType::Afternoon));
}

#[test]
fn test_bad_payloads_are_dropped_individually() {
    let formatter = RecordFormatter::default();
    let raws = vec![
        persisted_row("ok-1", "doc-1", "2025-03-10", "08:00:00", "Trống"),
        json!({"id": "no-doctor", "date": "2025-03-10"}),
        json!({"id": "bad-date", "doctor_id": "doc-1", "date": "10/03/2025"}),
        json!({"id": "lunch", "doctor_id": "doc-1", "date": "2025-03-10", "slot": "12:00:00"}),
        json!("not an object"),
        persisted_row("ok-2", "doc-1", "2025-03-10", "16:00:00", "Trống"),
    ];

    let records = formatter.normalize_all(&raws);
    let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();

    assert_eq!(ids, vec!["ok-1", "ok-2"]);
}

#[test]
fn test_doctor_names() {
    let formatter = RecordFormatter::default();
    let raws = vec![
        json!({"id": "doc-1", "full_name": "Dr. Nguyen Van An"}),
        json!({"id": "doc-2", "first_name": "Tran", "last_name": "Thi Binh"}),
        json!({"id": "doc-3"}),
        json!({"full_name": "No Id"}),
    ];

    let doctors = formatter.normalize_doctors(&raws);

    assert_eq!(doctors.len(), 3);
    assert_eq!(doctors[0].name, "Dr. Nguyen Van An");
    assert_eq!(doctors[1].name, "Tran Thi Binh");
    assert_eq!(doctors[2].name, "doc-3");
}
