use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::{json, Value};
use tokio::sync::Mutex;

use schedule_cell::models::DeleteOutcome;
use schedule_cell::services::boundary::{NewSlotRow, SlotBoundary};

mod formatter;
mod generator;
mod status;

/// In-memory slot table that behaves like the PostgREST boundary: it assigns
/// ids, echoes created rows and reports missing ids on delete.
#[derive(Default)]
pub struct InMemoryBoundary {
    rows: Mutex<Vec<Value>>,
    next_id: AtomicUsize,
    pub create_calls: AtomicUsize,
    pub fail_creates: AtomicBool,
    pub fail_deletes: AtomicBool,
    /// Fails every create after this many have succeeded.
    pub fail_creates_after: Mutex<Option<usize>>,
}

impl InMemoryBoundary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(rows: Vec<Value>) -> Self {
        Self {
            rows: Mutex::new(rows),
            ..Self::default()
        }
    }

    pub async fn contains_id(&self, id: &str) -> bool {
        self.rows.lock().await.iter().any(|row| row["id"] == id)
    }

    pub fn creates(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SlotBoundary for InMemoryBoundary {
    async fn list_slots(&self) -> Result<Vec<Value>> {
        Ok(self.rows.lock().await.clone())
    }

    async fn create_slot(&self, row: NewSlotRow) -> Result<Value> {
        let attempt = self.create_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_creates.load(Ordering::SeqCst) {
            return Err(anyhow!("API error (500): insert rejected"));
        }
        if let Some(limit) = *self.fail_creates_after.lock().await {
            if attempt >= limit {
                return Err(anyhow!("API error (500): insert rejected"));
            }
        }

        let id = format!("slot-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let mut value = serde_json::to_value(&row)?;
        value["id"] = json!(id);
        self.rows.lock().await.push(value.clone());
        Ok(value)
    }

    async fn delete_slot(&self, id: &str) -> Result<DeleteOutcome> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(anyhow!("API error (503): service unavailable"));
        }
        let mut rows = self.rows.lock().await;
        let before = rows.len();
        rows.retain(|row| row["id"] != id);
        if rows.len() < before {
            Ok(DeleteOutcome::Deleted)
        } else {
            Ok(DeleteOutcome::NotFound)
        }
    }

    async fn list_doctors(&self) -> Result<Vec<Value>> {
        Ok(vec![
            json!({"id": "doc-1", "full_name": "Dr. Nguyen Van An"}),
            json!({"id": "doc-2", "first_name": "Tran", "last_name": "Thi Binh"}),
            json!({"id": "doc-3"}),
        ])
    }
}

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Fixed "today" so dates in tests never drift into the past.
pub fn today() -> NaiveDate {
    day(2025, 3, 1)
}

pub fn persisted_row(id: &str, doctor_id: &str, date: &str, slot: &str, status: &str) -> Value {
    json!({
        "id": id,
        "doctor_id": doctor_id,
        "date": date,
        "slot": slot,
        "room_code": "101",
        "status": status,
        "max_patients": 1
    })
}
