use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;

pub const TEST_TOKEN: &str = "test-access-token";

pub struct TestConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub max_concurrent_creates: usize,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
            max_concurrent_creates: 4,
        }
    }
}

impl TestConfig {
    /// Config pointing at a mock server, e.g. `wiremock::MockServer::uri()`.
    pub fn with_url(url: &str) -> Self {
        Self {
            supabase_url: url.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            slot_table: "doctor_time_slots".to_string(),
            doctor_table: "doctors".to_string(),
            max_concurrent_creates: self.max_concurrent_creates,
            api_port: 3000,
        }
    }
}

pub struct MockSupabaseResponses;

impl MockSupabaseResponses {
    /// A slot row as the boundary stores it, with a persisted status label.
    pub fn slot_row(id: &str, doctor_id: &str, date: &str, slot: &str, status: &str) -> Value {
        json!({
            "id": id,
            "doctor_id": doctor_id,
            "date": date,
            "slot": slot,
            "room_code": "101",
            "status": status,
            "shift_type": null,
            "max_patients": 1,
            "patient_id": null
        })
    }

    /// Echoes a create request body back with a fresh id, like PostgREST
    /// does with `Prefer: return=representation`.
    pub fn created_from_body(body: &Value) -> Value {
        let mut row = body.clone();
        if let Some(obj) = row.as_object_mut() {
            obj.insert("id".to_string(), json!(Uuid::new_v4().to_string()));
        }
        json!([row])
    }

    pub fn doctor_row(id: &str, full_name: &str) -> Value {
        json!({
            "id": id,
            "full_name": full_name,
            "specialty": "General Practice",
            "is_available": true
        })
    }

    pub fn error_response(message: &str, code: &str) -> Value {
        json!({
            "message": message,
            "code": code
        })
    }
}
