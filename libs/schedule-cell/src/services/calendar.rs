use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::models::{
    CalendarEvent, CalendarMode, ColorTag, DaySchedule, ScheduleSummary, SemanticStatus,
    SlotRecord, StatusCount, WeekSchedule, SLOT_DURATION_MINUTES,
};

/// Derived view over a slot set. Never stored; rebuild it whenever the slot
/// set or the reference date changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "view", rename_all = "kebab-case")]
pub enum CalendarView {
    Month(Vec<CalendarEvent>),
    WeekList(WeekSchedule),
}

pub struct CalendarProjection;

impl CalendarProjection {
    pub fn project(records: &[SlotRecord], mode: CalendarMode, reference: NaiveDate) -> CalendarView {
        match mode {
            CalendarMode::Month => CalendarView::Month(Self::month_events(records)),
            CalendarMode::WeekList => CalendarView::WeekList(Self::week_list(records, reference)),
        }
    }

    pub fn month_events(records: &[SlotRecord]) -> Vec<CalendarEvent> {
        records.iter().map(Self::event).collect()
    }

    fn event(record: &SlotRecord) -> CalendarEvent {
        let start = record.starts_at();
        CalendarEvent {
            id: record.id.clone(),
            title: format!("Room {} - {}", record.room_code, record.status),
            start,
            end: start + Duration::minutes(SLOT_DURATION_MINUTES),
            color: ColorTag::for_status(&record.status),
            record: record.clone(),
        }
    }

    /// Monday of the week containing `date`. A Sunday belongs to the week
    /// that started six days earlier.
    pub fn week_start(date: NaiveDate) -> NaiveDate {
        date - Duration::days(date.weekday().num_days_from_monday() as i64)
    }

    /// Monday..Saturday buckets; records keep their order in the slot set.
    pub fn week_list(records: &[SlotRecord], reference: NaiveDate) -> WeekSchedule {
        let week_start = Self::week_start(reference);

        let days = (0..6)
            .map(|offset| {
                let date = week_start + Duration::days(offset);
                DaySchedule {
                    date,
                    weekday: weekday_label(date.weekday()).to_string(),
                    slots: records.iter().filter(|r| r.date == date).cloned().collect(),
                }
            })
            .collect();

        WeekSchedule {
            week_start,
            reference_date: reference,
            days,
        }
    }

    pub fn filter_by_doctor(records: &[SlotRecord], doctor_id: Option<&str>) -> Vec<SlotRecord> {
        match doctor_id {
            Some(doctor_id) => records.iter().filter(|r| r.doctor_id == doctor_id).cloned().collect(),
            None => records.to_vec(),
        }
    }

    /// Per-status counts, known statuses first in lifecycle order, unknown
    /// persisted values after them alphabetically.
    pub fn summarize(records: &[SlotRecord]) -> ScheduleSummary {
        let mut unknown: BTreeMap<String, usize> = BTreeMap::new();
        let mut by_status: Vec<StatusCount> = SemanticStatus::KNOWN
            .iter()
            .map(|status| StatusCount {
                status: status.as_str().to_string(),
                count: records.iter().filter(|r| &r.status == status).count(),
            })
            .collect();

        for record in records.iter().filter(|r| r.status.is_unknown()) {
            *unknown.entry(record.status.as_str().to_string()).or_default() += 1;
        }
        by_status.extend(unknown.into_iter().map(|(status, count)| StatusCount { status, count }));

        ScheduleSummary {
            total: records.len(),
            by_status,
        }
    }
}

fn weekday_label(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}
