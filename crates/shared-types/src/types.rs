use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};

/// Reference data for one transformer, fetched once per report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformerMetadata {
    pub transformer_number: String,
    #[serde(default)]
    pub pole_number: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub location_details: Option<String>,
}

impl TransformerMetadata {
    pub fn new(transformer_number: impl Into<String>) -> Self {
        Self {
            transformer_number: transformer_number.into(),
            pole_number: None,
            region: None,
            kind: None,
            location_details: None,
        }
    }
}

/// Operating status recorded by the inspector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TransformerStatus {
    #[default]
    Operational,
    #[serde(rename = "Under Maintenance")]
    UnderMaintenance,
    #[serde(rename = "Out of Service")]
    OutOfService,
    Faulty,
}

impl std::fmt::Display for TransformerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransformerStatus::Operational => write!(f, "Operational"),
            TransformerStatus::UnderMaintenance => write!(f, "Under Maintenance"),
            TransformerStatus::OutOfService => write!(f, "Out of Service"),
            TransformerStatus::Faulty => write!(f, "Faulty"),
        }
    }
}

/// A persisted maintenance record (read-only once stored)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceRecord {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub inspector_name: String,
    #[serde(
        default,
        rename = "transformerStatus",
        deserialize_with = "null_as_default"
    )]
    pub status: TransformerStatus,
    #[serde(default)]
    pub voltage: Option<f64>,
    #[serde(default)]
    pub current: Option<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub recommended_action: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub additional_remarks: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub other_notes: String,
    /// Associated inspection numbers, in the order the backend lists them
    #[serde(
        default,
        rename = "inspections",
        deserialize_with = "deserialize_inspection_refs"
    )]
    pub inspection_numbers: Vec<String>,
}

/// The backend writes `null` for unset columns; read those as the default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// The backend embeds full inspection objects; older payloads carry bare ids.
fn deserialize_inspection_refs<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum InspectionRef {
        Id(String),
        Object {
            #[serde(rename = "inspectionNumber")]
            inspection_number: String,
        },
    }

    let refs: Option<Vec<InspectionRef>> = Option::deserialize(deserializer)?;
    Ok(refs
        .unwrap_or_default()
        .into_iter()
        .map(|r| match r {
            InspectionRef::Id(id) => id,
            InspectionRef::Object { inspection_number } => inspection_number,
        })
        .collect())
}

/// Lifecycle status of an inspection. Unknown backend values are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum InspectionStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Other(String),
}

impl From<String> for InspectionStatus {
    fn from(value: String) -> Self {
        match value.trim() {
            "Pending" => InspectionStatus::Pending,
            "In Progress" => InspectionStatus::InProgress,
            "Completed" => InspectionStatus::Completed,
            _ => InspectionStatus::Other(value),
        }
    }
}

impl From<InspectionStatus> for String {
    fn from(value: InspectionStatus) -> Self {
        value.to_string()
    }
}

impl std::fmt::Display for InspectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InspectionStatus::Pending => write!(f, "Pending"),
            InspectionStatus::InProgress => write!(f, "In Progress"),
            InspectionStatus::Completed => write!(f, "Completed"),
            InspectionStatus::Other(text) => write!(f, "{}", text),
        }
    }
}

/// A scheduled or completed site visit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inspection {
    pub inspection_number: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub transformer_number: String,
    #[serde(default)]
    pub inspection_date: Option<String>,
    #[serde(default)]
    pub inspection_time: Option<String>,
    #[serde(default)]
    pub maintenance_date: Option<String>,
    #[serde(default)]
    pub maintenance_time: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: InspectionStatus,
}

impl Inspection {
    pub fn new(
        inspection_number: impl Into<String>,
        transformer_number: impl Into<String>,
        status: InspectionStatus,
    ) -> Self {
        Self {
            inspection_number: inspection_number.into(),
            transformer_number: transformer_number.into(),
            inspection_date: None,
            inspection_time: None,
            maintenance_date: None,
            maintenance_time: None,
            branch: None,
            status,
        }
    }
}

/// A defect found on an inspection image by the external analysis service.
///
/// Coordinates are in image pixels; `(x, y)` is the box center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Detection {
    #[serde(default, rename = "detectId")]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub inspection_number: String,
    #[serde(default)]
    pub detect_name: Option<String>,
    #[serde(default)]
    pub class_name: Option<String>,
    #[serde(default)]
    pub class_id: Option<i32>,
    pub confidence: f64,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Detection {
    /// Create a detection from its class code, confidence and center/size box
    pub fn new(
        inspection_number: impl Into<String>,
        class_name: impl Into<String>,
        confidence: f64,
        center: (f64, f64),
        size: (f64, f64),
    ) -> Self {
        Self {
            id: None,
            inspection_number: inspection_number.into(),
            detect_name: None,
            class_name: Some(class_name.into()),
            class_id: None,
            confidence,
            x: center.0,
            y: center.1,
            width: size.0,
            height: size.1,
        }
    }

    /// Human-readable name, then the raw class code, then "Unknown"
    pub fn label(&self) -> &str {
        [self.detect_name.as_deref(), self.class_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|s| !s.is_empty())
            .unwrap_or("Unknown")
    }
}

/// Free-text note attached to an inspection. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub inspection_number: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub topic: String,
    #[serde(default, rename = "comment", deserialize_with = "null_as_default")]
    pub body: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub author: String,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
}
