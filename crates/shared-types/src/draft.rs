//! Editable maintenance form state

use serde::{Deserialize, Serialize};

use crate::types::{MaintenanceRecord, TransformerStatus};

/// The maintenance form a report is composed from.
///
/// Serializes to the backend's maintenance report request body.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceDraft {
    pub transformer_number: String,
    #[serde(default)]
    pub inspector_name: String,
    #[serde(default, rename = "transformerStatus")]
    pub status: TransformerStatus,
    #[serde(default)]
    pub voltage: Option<f64>,
    #[serde(default)]
    pub current: Option<f64>,
    #[serde(default)]
    pub recommended_action: String,
    #[serde(default)]
    pub additional_remarks: String,
    #[serde(default)]
    pub other_notes: String,
    #[serde(default, rename = "inspectionsNumbers")]
    pub inspection_numbers: Vec<String>,
}

impl MaintenanceDraft {
    /// Empty form for a transformer
    pub fn blank(transformer_number: impl Into<String>) -> Self {
        Self {
            transformer_number: transformer_number.into(),
            ..Self::default()
        }
    }

    /// Form pre-filled from a persisted record, for reprinting
    pub fn from_record(transformer_number: impl Into<String>, record: &MaintenanceRecord) -> Self {
        Self {
            transformer_number: transformer_number.into(),
            inspector_name: record.inspector_name.clone(),
            status: record.status,
            voltage: record.voltage,
            current: record.current,
            recommended_action: record.recommended_action.clone(),
            additional_remarks: record.additional_remarks.clone(),
            other_notes: record.other_notes.clone(),
            inspection_numbers: record.inspection_numbers.clone(),
        }
    }
}

/// Acknowledgement returned once a maintenance report is stored
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ack {
    pub record_id: Option<i64>,
}
