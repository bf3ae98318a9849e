use std::env;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub slot_table: String,
    pub doctor_table: String,
    pub max_concurrent_creates: usize,
    pub api_port: u16,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_anon_key: env::var("SUPABASE_ANON_PUBLIC_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                    String::new()
                }),
            slot_table: env::var("SCHEDULE_SLOT_TABLE")
                .unwrap_or_else(|_| {
                    warn!("SCHEDULE_SLOT_TABLE not set, using default");
                    "doctor_time_slots".to_string()
                }),
            doctor_table: env::var("SCHEDULE_DOCTOR_TABLE")
                .unwrap_or_else(|_| {
                    warn!("SCHEDULE_DOCTOR_TABLE not set, using default");
                    "doctors".to_string()
                }),
            max_concurrent_creates: env::var("SCHEDULE_MAX_CONCURRENT_CREATES")
                .ok()
                .and_then(|raw| raw.parse::<usize>().ok())
                .map(|n| n.max(1))
                .unwrap_or_else(|| {
                    warn!("SCHEDULE_MAX_CONCURRENT_CREATES not set or invalid, using default");
                    4
                }),
            api_port: env::var("API_PORT")
                .ok()
                .and_then(|raw| raw.parse::<u16>().ok())
                .unwrap_or(3000),
        };

        if !config.is_configured() {
            warn!("Schedule boundary not configured - missing Supabase environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty()
            && !self.supabase_anon_key.is_empty()
    }

    /// PostgREST path of the slot table, e.g. `/rest/v1/doctor_time_slots`.
    pub fn slot_table_path(&self) -> String {
        format!("/rest/v1/{}", self.slot_table)
    }

    pub fn doctor_table_path(&self) -> String {
        format!("/rest/v1/{}", self.doctor_table)
    }
}
