//! Translation between semantic statuses and the persisted status labels.
//!
//! The two directions are separate tables and the mapping is lossy: several
//! persisted labels collapse onto one semantic status, and `Active` and
//! `Booked` share one persisted label. `to_persisted(to_semantic(x))` is
//! therefore not guaranteed to return `x`, and callers must not rely on it.

use std::collections::HashMap;

use crate::models::SemanticStatus;

/// Persisted label -> semantic status. Matched case-insensitively after trimming.
pub const PERSISTED_TO_SEMANTIC: &[(&str, SemanticStatus)] = &[
    ("Trống", SemanticStatus::Available),
    ("Còn trống", SemanticStatus::Available),
    ("Đã hủy", SemanticStatus::Cancelled),
    ("Hủy", SemanticStatus::Cancelled),
    ("Đang hoạt động", SemanticStatus::Active),
    ("Đã đặt", SemanticStatus::Booked),
    ("Đang chờ thanh toán", SemanticStatus::PendingPayment),
    ("Chờ thanh toán", SemanticStatus::PendingPayment),
    ("Đã thanh toán", SemanticStatus::Confirmed),
    ("Đã xác nhận", SemanticStatus::Confirmed),
    ("Hoàn thành", SemanticStatus::Completed),
];

/// Semantic status -> persisted label written on create.
pub const SEMANTIC_TO_PERSISTED: &[(SemanticStatus, &str)] = &[
    (SemanticStatus::Available, "Trống"),
    (SemanticStatus::Cancelled, "Đã hủy"),
    (SemanticStatus::Active, "Đang hoạt động"),
    (SemanticStatus::Booked, "Đang hoạt động"),
    (SemanticStatus::PendingPayment, "Đang chờ thanh toán"),
    (SemanticStatus::Confirmed, "Đã thanh toán"),
    (SemanticStatus::Completed, "Hoàn thành"),
];

#[derive(Debug, Clone)]
pub struct StatusTranslator {
    to_semantic: HashMap<String, SemanticStatus>,
    to_persisted: HashMap<SemanticStatus, String>,
}

impl Default for StatusTranslator {
    fn default() -> Self {
        let mut translator = Self {
            to_semantic: HashMap::new(),
            to_persisted: HashMap::new(),
        };
        for (label, status) in PERSISTED_TO_SEMANTIC {
            translator.register_persisted(label, status.clone());
        }
        for (status, label) in SEMANTIC_TO_PERSISTED {
            translator.register_semantic(status.clone(), label);
        }
        translator
    }
}

impl StatusTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a persisted alias. Does not touch the reverse table.
    pub fn register_persisted(&mut self, label: &str, status: SemanticStatus) {
        self.to_semantic.insert(Self::normalize(label), status);
    }

    pub fn register_semantic(&mut self, status: SemanticStatus, label: &str) {
        self.to_persisted.insert(status, label.to_string());
    }

    /// Best-effort mapping. Semantic names are accepted as-is; anything
    /// unmapped is returned as `SemanticStatus::Unknown` carrying the raw input.
    pub fn to_semantic(&self, raw: &str) -> SemanticStatus {
        if let Some(status) = self.to_semantic.get(&Self::normalize(raw)) {
            return status.clone();
        }
        SemanticStatus::from_name(raw.trim())
    }

    /// Returns the registered persisted label, or the semantic name itself.
    pub fn to_persisted(&self, status: &SemanticStatus) -> String {
        self.to_persisted
            .get(status)
            .cloned()
            .unwrap_or_else(|| status.as_str().to_string())
    }

    fn normalize(label: &str) -> String {
        label.trim().to_lowercase()
    }
}
