use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};

pub const MIN_PATIENTS: u8 = 1;
pub const MAX_PATIENTS: u8 = 5;
pub const MIN_REPEAT_WEEKS: u32 = 1;
pub const MAX_REPEAT_WEEKS: u32 = 12;
pub const DEFAULT_ROOM_CODE: &str = "100";
pub const TEMP_ID_PREFIX: &str = "temp-";
pub const SLOT_DURATION_MINUTES: i64 = 30;

// ==============================================================================
// SLOT TIMES AND SHIFTS
// ==============================================================================

/// One of the eight bookable times of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SlotTime {
    H08,
    H09,
    H10,
    H11,
    H13,
    H14,
    H15,
    H16,
}

impl SlotTime {
    pub const ALL: [SlotTime; 8] = [
        SlotTime::H08, SlotTime::H09, SlotTime::H10, SlotTime::H11,
        SlotTime::H13, SlotTime::H14, SlotTime::H15, SlotTime::H16,
    ];

    pub fn hour(&self) -> u32 {
        match self {
            SlotTime::H08 => 8,
            SlotTime::H09 => 9,
            SlotTime::H10 => 10,
            SlotTime::H11 => 11,
            SlotTime::H13 => 13,
            SlotTime::H14 => 14,
            SlotTime::H15 => 15,
            SlotTime::H16 => 16,
        }
    }

    pub fn from_hour(hour: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|slot| slot.hour() == hour)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SlotTime::H08 => "08:00:00",
            SlotTime::H09 => "09:00:00",
            SlotTime::H10 => "10:00:00",
            SlotTime::H11 => "11:00:00",
            SlotTime::H13 => "13:00:00",
            SlotTime::H14 => "14:00:00",
            SlotTime::H15 => "15:00:00",
            SlotTime::H16 => "16:00:00",
        }
    }

    /// Accepts `HH:MM:SS`, `HH:MM` or `H:MM`; minutes and seconds must be zero.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let time = NaiveTime::parse_from_str(raw, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
            .ok()?;
        if time.minute() != 0 || time.second() != 0 {
            return None;
        }
        Self::from_hour(time.hour())
    }

    pub fn naive_time(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.hour(), 0, 0).unwrap_or(NaiveTime::MIN)
    }

    pub fn shift(&self) -> ShiftType {
        if self.hour() < 12 {
            ShiftType::Morning
        } else {
            ShiftType::Afternoon
        }
    }
}

impl fmt::Display for SlotTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for SlotTime {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        SlotTime::parse(&value).ok_or_else(|| format!("Invalid time slot: {}", value))
    }
}

impl From<SlotTime> for String {
    fn from(value: SlotTime) -> Self {
        value.as_str().to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShiftType {
    Morning,
    Afternoon,
}

impl ShiftType {
    pub fn slots(&self) -> [SlotTime; 4] {
        match self {
            ShiftType::Morning => [SlotTime::H08, SlotTime::H09, SlotTime::H10, SlotTime::H11],
            ShiftType::Afternoon => [SlotTime::H13, SlotTime::H14, SlotTime::H15, SlotTime::H16],
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "morning" | "sang" | "sáng" => Some(ShiftType::Morning),
            "afternoon" | "chieu" | "chiều" => Some(ShiftType::Afternoon),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ShiftType::Morning => "morning",
            ShiftType::Afternoon => "afternoon",
        }
    }
}

impl fmt::Display for ShiftType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==============================================================================
// STATUS
// ==============================================================================

/// Status vocabulary used by scheduling logic.
///
/// `Unknown` carries any persisted value the translation tables do not
/// recognise, unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SemanticStatus {
    Available,
    Cancelled,
    Active,
    Booked,
    PendingPayment,
    Confirmed,
    Completed,
    Unknown(String),
}

impl SemanticStatus {
    pub const KNOWN: [SemanticStatus; 7] = [
        SemanticStatus::Available,
        SemanticStatus::Cancelled,
        SemanticStatus::Active,
        SemanticStatus::Booked,
        SemanticStatus::PendingPayment,
        SemanticStatus::Confirmed,
        SemanticStatus::Completed,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            SemanticStatus::Available => "available",
            SemanticStatus::Cancelled => "cancelled",
            SemanticStatus::Active => "active",
            SemanticStatus::Booked => "booked",
            SemanticStatus::PendingPayment => "pending_payment",
            SemanticStatus::Confirmed => "confirmed",
            SemanticStatus::Completed => "completed",
            SemanticStatus::Unknown(raw) => raw.as_str(),
        }
    }

    /// Parses a semantic name; anything else becomes `Unknown`.
    pub fn from_name(raw: &str) -> Self {
        match raw {
            "available" => SemanticStatus::Available,
            "cancelled" => SemanticStatus::Cancelled,
            "active" => SemanticStatus::Active,
            "booked" => SemanticStatus::Booked,
            "pending_payment" => SemanticStatus::PendingPayment,
            "confirmed" => SemanticStatus::Confirmed,
            "completed" => SemanticStatus::Completed,
            other => SemanticStatus::Unknown(other.to_string()),
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, SemanticStatus::Unknown(_))
    }

    /// `active` and `booked` are the same lifecycle stage under two names.
    pub fn is_claimed(&self) -> bool {
        matches!(self, SemanticStatus::Active | SemanticStatus::Booked)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SemanticStatus::Completed | SemanticStatus::Cancelled)
    }

    /// Lifecycle: available -> active/booked -> pending_payment -> confirmed -> completed,
    /// with cancellation allowed from any non-terminal stage.
    pub fn can_transition_to(&self, next: &SemanticStatus) -> bool {
        if self == next {
            return true;
        }
        if next.is_unknown() || self.is_terminal() {
            return false;
        }
        // Records carrying an unrecognised persisted status may be repaired to any known one.
        if self.is_unknown() || *next == SemanticStatus::Cancelled {
            return true;
        }
        match self {
            SemanticStatus::Available => next.is_claimed(),
            SemanticStatus::Active | SemanticStatus::Booked => {
                next.is_claimed() || *next == SemanticStatus::PendingPayment
            }
            SemanticStatus::PendingPayment => *next == SemanticStatus::Confirmed,
            SemanticStatus::Confirmed => *next == SemanticStatus::Completed,
            _ => false,
        }
    }
}

impl fmt::Display for SemanticStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for SemanticStatus {
    fn from(value: String) -> Self {
        SemanticStatus::from_name(&value)
    }
}

impl From<SemanticStatus> for String {
    fn from(value: SemanticStatus) -> Self {
        value.as_str().to_string()
    }
}

// ==============================================================================
// SLOT RECORD
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SlotKey {
    pub doctor_id: String,
    pub date: NaiveDate,
    pub slot: SlotTime,
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.doctor_id, self.date, self.slot)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotRecord {
    pub id: String,
    pub doctor_id: String,
    pub date: NaiveDate,
    pub slot: SlotTime,
    pub room_code: String,
    pub status: SemanticStatus,
    pub shift_type: Option<ShiftType>,
    pub max_patients: u8,
    pub patient_id: Option<String>,
}

impl SlotRecord {
    pub fn effective_shift(&self) -> ShiftType {
        self.shift_type.unwrap_or_else(|| self.slot.shift())
    }

    pub fn is_temporary(&self) -> bool {
        self.id.starts_with(TEMP_ID_PREFIX)
    }

    pub fn starts_at(&self) -> NaiveDateTime {
        self.date.and_time(self.slot.naive_time())
    }
}

/// A slot the generator wants the boundary to create.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotDraft {
    pub temp_id: String,
    pub doctor_id: String,
    pub date: NaiveDate,
    pub slot: SlotTime,
    pub room_code: String,
    pub status: SemanticStatus,
    pub shift_type: Option<ShiftType>,
    pub max_patients: u8,
    pub patient_id: Option<String>,
}

impl SlotDraft {
    pub fn from_record(record: &SlotRecord) -> Self {
        Self {
            temp_id: new_temp_id(),
            doctor_id: record.doctor_id.clone(),
            date: record.date,
            slot: record.slot,
            room_code: record.room_code.clone(),
            status: record.status.clone(),
            shift_type: record.shift_type,
            max_patients: record.max_patients,
            patient_id: record.patient_id.clone(),
        }
    }

    /// Local view of the draft before the boundary confirms it.
    pub fn to_temporary_record(&self) -> SlotRecord {
        SlotRecord {
            id: self.temp_id.clone(),
            doctor_id: self.doctor_id.clone(),
            date: self.date,
            slot: self.slot,
            room_code: self.room_code.clone(),
            status: self.status.clone(),
            shift_type: self.shift_type,
            max_patients: self.max_patients,
            patient_id: self.patient_id.clone(),
        }
    }
}

pub fn new_temp_id() -> String {
    format!("{}{}", TEMP_ID_PREFIX, uuid::Uuid::new_v4())
}

pub fn is_bookable_weekday(weekday: Weekday) -> bool {
    weekday != Weekday::Sun
}

// ==============================================================================
// GENERATION REQUESTS AND REPORTS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum GenerationMode {
    Single { slot: SlotTime },
    Shift { shift_type: ShiftType },
}

impl GenerationMode {
    pub fn slots(&self) -> Vec<SlotTime> {
        match self {
            GenerationMode::Single { slot } => vec![*slot],
            GenerationMode::Shift { shift_type } => shift_type.slots().to_vec(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateScheduleRequest {
    pub doctor_id: String,
    pub date: NaiveDate,
    pub room_code: String,
    pub max_patients: Option<i32>,
    #[serde(flatten)]
    pub mode: GenerationMode,
    pub repeat_weeks: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedSlot {
    pub date: NaiveDate,
    pub slot: SlotTime,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedSlot {
    pub date: NaiveDate,
    pub slot: SlotTime,
    pub temp_id: String,
    pub error: String,
}

/// Outcome of one generator batch. Callers must surface partial results.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchReport {
    /// (date, slot) pairs the request expanded to.
    pub requested_slots: usize,
    /// Records attempted at the boundary (`planned pairs x max_patients`).
    pub requested_records: usize,
    pub created_records: usize,
    pub skipped: Vec<SkippedSlot>,
    pub failed: Vec<FailedSlot>,
    pub warnings: Vec<String>,
    pub created: Vec<SlotRecord>,
    /// Set when the boundary rejected or garbled something; local state
    /// should be refetched.
    pub reload_required: bool,
}

impl BatchReport {
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty() && self.failed.is_empty() && self.created_records == self.requested_records
    }

    pub fn is_partial(&self) -> bool {
        !self.is_complete() && self.created_records > 0
    }
}

// ==============================================================================
// UPDATE / DELETE
// ==============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateSlotRequest {
    pub date: Option<NaiveDate>,
    pub slot: Option<SlotTime>,
    pub room_code: Option<String>,
    pub status: Option<SemanticStatus>,
    pub patient_id: Option<String>,
    #[serde(default)]
    pub clear_patient: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusTransitionRequest {
    pub status: SemanticStatus,
    pub patient_id: Option<String>,
}

/// Result of a delete-then-create replace. The old id no longer exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateOutcome {
    pub old_id: String,
    pub record: SlotRecord,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoctorSummary {
    pub id: String,
    pub name: String,
}

// ==============================================================================
// PROJECTIONS
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorTag {
    Green,
    Blue,
    Orange,
    Purple,
    Gray,
    Red,
    Default,
}

impl ColorTag {
    pub fn for_status(status: &SemanticStatus) -> Self {
        match status {
            SemanticStatus::Available => ColorTag::Green,
            SemanticStatus::Active | SemanticStatus::Booked => ColorTag::Blue,
            SemanticStatus::PendingPayment => ColorTag::Orange,
            SemanticStatus::Confirmed => ColorTag::Purple,
            SemanticStatus::Completed => ColorTag::Gray,
            SemanticStatus::Cancelled => ColorTag::Red,
            SemanticStatus::Unknown(_) => ColorTag::Default,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: String,
    pub title: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub color: ColorTag,
    pub record: SlotRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaySchedule {
    pub date: NaiveDate,
    pub weekday: String,
    pub slots: Vec<SlotRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekSchedule {
    pub week_start: NaiveDate,
    pub reference_date: NaiveDate,
    pub days: Vec<DaySchedule>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CalendarMode {
    Month,
    WeekList,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusCount {
    pub status: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSummary {
    pub total: usize,
    pub by_status: Vec<StatusCount>,
}
