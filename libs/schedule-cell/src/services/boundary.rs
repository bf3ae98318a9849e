use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{DeleteOutcome, SlotDraft};
use crate::services::status::StatusTranslator;

/// Row sent to the boundary when creating a slot. `status` is already in the
/// persisted vocabulary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSlotRow {
    pub doctor_id: String,
    pub date: NaiveDate,
    pub slot: String,
    pub room_code: String,
    pub status: String,
    pub shift_type: Option<String>,
    pub max_patients: u8,
    pub patient_id: Option<String>,
}

impl NewSlotRow {
    pub fn from_draft(draft: &SlotDraft, translator: &StatusTranslator) -> Self {
        Self {
            doctor_id: draft.doctor_id.clone(),
            date: draft.date,
            slot: draft.slot.as_str().to_string(),
            room_code: draft.room_code.clone(),
            status: translator.to_persisted(&draft.status),
            shift_type: draft.shift_type.map(|shift| shift.as_str().to_string()),
            max_patients: draft.max_patients,
            patient_id: draft.patient_id.clone(),
        }
    }
}

/// True when `value` can be placed in a PostgREST filter (`?id=eq.{value}`)
/// as-is: ASCII letters, digits, `-` and `_` only.
pub fn is_safe_filter_value(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Persistence boundary for slot records. Payloads are returned raw and must
/// go through the record formatter.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SlotBoundary: Send + Sync {
    async fn list_slots(&self) -> Result<Vec<Value>>;

    async fn create_slot(&self, row: NewSlotRow) -> Result<Value>;

    async fn delete_slot(&self, id: &str) -> Result<DeleteOutcome>;

    async fn list_doctors(&self) -> Result<Vec<Value>>;
}

/// [`SlotBoundary`] backed by Supabase PostgREST tables.
pub struct SupabaseSlotBoundary {
    supabase: SupabaseClient,
    slot_path: String,
    doctor_path: String,
    auth_token: Option<String>,
}

impl SupabaseSlotBoundary {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            slot_path: config.slot_table_path(),
            doctor_path: config.doctor_table_path(),
            auth_token: None,
        }
    }

    pub fn with_token(mut self, token: &str) -> Self {
        self.auth_token = Some(token.to_string());
        self
    }

    fn token(&self) -> Option<&str> {
        self.auth_token.as_deref()
    }
}

#[async_trait]
impl SlotBoundary for SupabaseSlotBoundary {
    async fn list_slots(&self) -> Result<Vec<Value>> {
        let path = format!("{}?select=*&order=date.asc,slot.asc", self.slot_path);
        debug!("Listing slots from {}", path);

        self.supabase.request(Method::GET, &path, self.token(), None).await
    }

    async fn create_slot(&self, row: NewSlotRow) -> Result<Value> {
        debug!("Creating slot for doctor {} on {} at {}", row.doctor_id, row.date, row.slot);

        let body = serde_json::to_value(&row)?;
        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::POST,
            &self.slot_path,
            self.token(),
            Some(body),
            Some(SupabaseClient::representation_headers()),
        ).await?;

        result
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("Failed to create slot: empty response"))
    }

    async fn delete_slot(&self, id: &str) -> Result<DeleteOutcome> {
        debug!("Deleting slot: {}", id);

        if !is_safe_filter_value(id) {
            return Err(anyhow!("Refusing to delete slot with invalid id '{}'", id));
        }

        let path = format!("{}?id=eq.{}", self.slot_path, id);
        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::DELETE,
            &path,
            self.token(),
            None,
            Some(SupabaseClient::representation_headers()),
        ).await?;

        if result.is_empty() {
            Ok(DeleteOutcome::NotFound)
        } else {
            Ok(DeleteOutcome::Deleted)
        }
    }

    async fn list_doctors(&self) -> Result<Vec<Value>> {
        let path = format!("{}?select=*", self.doctor_path);
        self.supabase.request(Method::GET, &path, self.token(), None).await
    }
}
