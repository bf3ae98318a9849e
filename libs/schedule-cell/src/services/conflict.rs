use std::collections::HashSet;

use chrono::NaiveDate;
use tracing::debug;

use crate::models::{SlotKey, SlotRecord, SlotTime};

/// A (doctor, date, slot) triple proposed for creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotCandidate<'a> {
    pub doctor_id: &'a str,
    pub date: NaiveDate,
    pub slot: SlotTime,
}

impl<'a> SlotCandidate<'a> {
    pub fn new(doctor_id: &'a str, date: NaiveDate, slot: SlotTime) -> Self {
        Self { doctor_id, date, slot }
    }

    fn matches(&self, record: &SlotRecord) -> bool {
        record.doctor_id == self.doctor_id && record.date == self.date && record.slot == self.slot
    }

    fn key(&self) -> SlotKey {
        SlotKey {
            doctor_id: self.doctor_id.to_string(),
            date: self.date,
            slot: self.slot,
        }
    }
}

/// Decides whether a candidate slot collides with known records.
///
/// Room and status never matter: a doctor holds at most one slot identity per
/// date and time. The check is advisory, the boundary remains the final arbiter.
#[derive(Debug, Default)]
pub struct ConflictDetector {
    planned: HashSet<SlotKey>,
}

impl ConflictDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_conflict(candidate: &SlotCandidate<'_>, existing: &[SlotRecord]) -> bool {
        existing.iter().any(|record| candidate.matches(record))
    }

    /// Like [`has_conflict`](Self::has_conflict) but ignores the record being replaced.
    pub fn has_conflict_excluding(
        candidate: &SlotCandidate<'_>,
        existing: &[SlotRecord],
        exclude_id: &str,
    ) -> bool {
        existing
            .iter()
            .filter(|record| record.id != exclude_id)
            .any(|record| candidate.matches(record))
    }

    /// Checks against `existing` and against everything already reserved in
    /// this batch, then reserves the candidate if it is free.
    pub fn try_reserve(&mut self, candidate: &SlotCandidate<'_>, existing: &[SlotRecord]) -> bool {
        let key = candidate.key();
        if self.planned.contains(&key) || Self::has_conflict(candidate, existing) {
            debug!("Slot {} is already taken", key);
            return false;
        }
        self.planned.insert(key);
        true
    }

    pub fn reserved(&self) -> usize {
        self.planned.len()
    }
}
