//! Tracked life variable model.
//!
//! # Responsibility
//! - Define the `DataKey` record shown as one row of the year grid.
//! - Normalize user-provided labels before they reach a provider.
//!
//! # Invariants
//! - `id` is assigned by the persistence provider and unique per user.
//! - `label` is trimmed and never empty.

use serde::{Deserialize, Serialize};

/// Provider-assigned identifier of a data key.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type DataKeyId = String;

/// A boolean life variable tracked per day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataKey {
    pub id: DataKeyId,
    pub label: String,
}

impl DataKey {
    pub fn new(id: impl Into<DataKeyId>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

/// Trims a label and returns `None` when nothing remains.
pub fn normalize_label(label: &str) -> Option<String> {
    let trimmed = label.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
