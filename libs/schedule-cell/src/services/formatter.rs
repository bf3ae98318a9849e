use chrono::NaiveDate;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::models::{
    new_temp_id, DoctorSummary, SemanticStatus, ShiftType, SlotRecord, SlotTime,
    DEFAULT_ROOM_CODE, MAX_PATIENTS, MIN_PATIENTS,
};
use crate::services::status::StatusTranslator;

const ID_FIELDS: &[&str] = &["id", "_id", "slot_id", "slotId"];
const DOCTOR_FIELDS: &[&str] = &["doctor_id", "doctorId", "doctor_ref", "physician_id", "bac_si_id"];
const DOCTOR_OBJECT_FIELDS: &[&str] = &["doctor", "doctor_info", "doctorInfo"];
const DATE_FIELDS: &[&str] = &["date", "work_date", "workDate", "slot_date", "ngay"];
const SLOT_FIELDS: &[&str] = &["slot", "time_slot", "timeSlot", "start_time", "time"];
const ROOM_FIELDS: &[&str] = &["room_code", "roomCode", "room", "phong"];
const STATUS_FIELDS: &[&str] = &["status", "trang_thai"];
const SHIFT_FIELDS: &[&str] = &["shift_type", "shiftType", "shift"];
const CAPACITY_FIELDS: &[&str] = &["max_patients", "maxPatients", "capacity"];
const PATIENT_FIELDS: &[&str] = &["patient_id", "patientId"];
const PATIENT_OBJECT_FIELDS: &[&str] = &["patient", "patient_info"];

/// Normalizes raw boundary payloads into [`SlotRecord`]s.
///
/// Bad payloads are dropped one at a time with a warning; a listing never
/// fails because of a single record.
#[derive(Debug, Clone, Default)]
pub struct RecordFormatter {
    translator: StatusTranslator,
}

impl RecordFormatter {
    pub fn new(translator: StatusTranslator) -> Self {
        Self { translator }
    }

    pub fn translator(&self) -> &StatusTranslator {
        &self.translator
    }

    pub fn normalize(&self, raw: &Value) -> Option<SlotRecord> {
        self.normalize_with_fallback(raw, None)
    }

    /// `fallback_id` is used when the payload carries no id of its own, e.g.
    /// the temporary id of the draft a create response belongs to.
    pub fn normalize_with_fallback(&self, raw: &Value, fallback_id: Option<&str>) -> Option<SlotRecord> {
        match self.try_normalize(raw, fallback_id) {
            Ok(record) => Some(record),
            Err(reason) => {
                warn!("Dropping unparseable slot payload ({}): {}", reason, raw);
                None
            }
        }
    }

    pub fn normalize_all(&self, raws: &[Value]) -> Vec<SlotRecord> {
        let records: Vec<SlotRecord> = raws.iter().filter_map(|raw| self.normalize(raw)).collect();
        if records.len() != raws.len() {
            warn!("Dropped {} of {} slot payloads", raws.len() - records.len(), raws.len());
        }
        records
    }

    pub fn try_normalize(&self, raw: &Value, fallback_id: Option<&str>) -> Result<SlotRecord, String> {
        let obj = raw.as_object().ok_or_else(|| "payload is not an object".to_string())?;

        let doctor_id = extract_doctor_id(obj).ok_or_else(|| "missing doctor id".to_string())?;

        let date = first_field(obj, DATE_FIELDS)
            .and_then(Value::as_str)
            .and_then(parse_date)
            .ok_or_else(|| "missing or invalid date".to_string())?;

        let slot = match first_field(obj, SLOT_FIELDS) {
            None => SlotTime::H08,
            Some(value) => value
                .as_str()
                .and_then(SlotTime::parse)
                .ok_or_else(|| format!("unsupported time slot {}", value))?,
        };

        // Doctor and date are present, so a temporary id can always be generated here.
        let id = first_field(obj, ID_FIELDS)
            .and_then(as_id_string)
            .or_else(|| fallback_id.map(str::to_string))
            .unwrap_or_else(|| {
                let temp = new_temp_id();
                debug!("Slot payload without id, assigned {}", temp);
                temp
            });

        let room_code = first_field(obj, ROOM_FIELDS)
            .and_then(as_id_string)
            .unwrap_or_else(|| DEFAULT_ROOM_CODE.to_string());

        let status = match first_field(obj, STATUS_FIELDS).and_then(Value::as_str) {
            Some(raw_status) if !raw_status.trim().is_empty() => self.translator.to_semantic(raw_status),
            _ => SemanticStatus::Available,
        };

        let shift_type = first_field(obj, SHIFT_FIELDS)
            .and_then(Value::as_str)
            .and_then(ShiftType::parse)
            .map(|shift| {
                if shift != slot.shift() {
                    warn!("Slot {} tagged {} but belongs to {}; using {}", id, shift, slot.shift(), slot.shift());
                    slot.shift()
                } else {
                    shift
                }
            });

        let max_patients = first_field(obj, CAPACITY_FIELDS)
            .and_then(|value| value.as_i64().or_else(|| value.as_str().and_then(|s| s.trim().parse().ok())))
            .map(|n| n.clamp(MIN_PATIENTS as i64, MAX_PATIENTS as i64) as u8)
            .unwrap_or(MIN_PATIENTS);

        let patient_id = first_field(obj, PATIENT_FIELDS)
            .and_then(as_id_string)
            .or_else(|| nested_id(obj, PATIENT_OBJECT_FIELDS));

        Ok(SlotRecord {
            id,
            doctor_id,
            date,
            slot,
            room_code,
            status,
            shift_type,
            max_patients,
            patient_id,
        })
    }

    pub fn normalize_doctors(&self, raws: &[Value]) -> Vec<DoctorSummary> {
        raws.iter()
            .filter_map(|raw| {
                let obj = raw.as_object()?;
                let Some(id) = first_field(obj, ID_FIELDS).and_then(as_id_string) else {
                    warn!("Dropping doctor payload without id: {}", raw);
                    return None;
                };
                let name = first_field(obj, &["full_name", "fullName", "name"])
                    .and_then(Value::as_str)
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .or_else(|| {
                        let parts: Vec<&str> = ["first_name", "last_name"]
                            .iter()
                            .filter_map(|field| obj.get(*field).and_then(Value::as_str))
                            .map(str::trim)
                            .filter(|s| !s.is_empty())
                            .collect();
                        (!parts.is_empty()).then(|| parts.join(" "))
                    })
                    .unwrap_or_else(|| id.clone());
                Some(DoctorSummary { id, name })
            })
            .collect()
    }
}

fn first_field<'a>(obj: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names
        .iter()
        .filter_map(|name| obj.get(*name))
        .find(|value| !value.is_null())
}

fn as_id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn nested_id(obj: &Map<String, Value>, names: &[&str]) -> Option<String> {
    names.iter().filter_map(|name| obj.get(*name)).find_map(|value| match value {
        Value::Object(inner) => first_field(inner, &["id", "_id", "doctor_id", "patient_id"]).and_then(as_id_string),
        other => as_id_string(other),
    })
}

fn extract_doctor_id(obj: &Map<String, Value>) -> Option<String> {
    first_field(obj, DOCTOR_FIELDS)
        .and_then(as_id_string)
        .or_else(|| nested_id(obj, DOCTOR_OBJECT_FIELDS))
}

/// Accepts `YYYY-MM-DD` or any timestamp starting with it.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| raw.get(..10).and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()))
}
