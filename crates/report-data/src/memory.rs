//! Fixture-backed [`DataService`] with injectable delays and failures

use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use shared_types::{
    Ack, Comment, Detection, Inspection, InspectionStatus, MaintenanceDraft, MaintenanceRecord,
    RasterImage, TransformerMetadata, TransformerStatus,
};

use crate::error::DataError;
use crate::service::DataService;

/// Service operations that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fetch {
    Records,
    Inspections,
    Detections,
    Comments,
    Image,
    Submit,
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryDataService {
    transformers: HashMap<String, TransformerMetadata>,
    records: HashMap<String, Vec<MaintenanceRecord>>,
    inspections: HashMap<String, Vec<Inspection>>,
    detections: HashMap<String, Vec<Detection>>,
    comments: HashMap<String, Vec<Comment>>,
    images: HashMap<String, RasterImage>,
    /// Per-inspection delay applied to each artifact fetch
    delays: HashMap<String, Duration>,
    /// Inspections whose image fetch never completes
    stalled_images: HashSet<String>,
    failures: HashSet<Fetch>,
    submissions: Arc<Mutex<Vec<(String, MaintenanceDraft)>>>,
}

impl InMemoryDataService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_transformer(mut self, transformer: TransformerMetadata) -> Self {
        self.transformers
            .insert(transformer.transformer_number.clone(), transformer);
        self
    }

    pub fn with_record(mut self, transformer_id: &str, record: MaintenanceRecord) -> Self {
        self.records
            .entry(transformer_id.to_string())
            .or_default()
            .push(record);
        self
    }

    pub fn with_inspection(mut self, inspection: Inspection) -> Self {
        self.inspections
            .entry(inspection.transformer_number.clone())
            .or_default()
            .push(inspection);
        self
    }

    pub fn with_detections(mut self, inspection_id: &str, detections: Vec<Detection>) -> Self {
        self.detections.insert(inspection_id.to_string(), detections);
        self
    }

    pub fn with_comments(mut self, inspection_id: &str, comments: Vec<Comment>) -> Self {
        self.comments.insert(inspection_id.to_string(), comments);
        self
    }

    pub fn with_image(mut self, inspection_id: &str, image: RasterImage) -> Self {
        self.images.insert(inspection_id.to_string(), image);
        self
    }

    pub fn with_delay(mut self, inspection_id: &str, delay: Duration) -> Self {
        self.delays.insert(inspection_id.to_string(), delay);
        self
    }

    pub fn with_stalled_image(mut self, inspection_id: &str) -> Self {
        self.stalled_images.insert(inspection_id.to_string());
        self
    }

    pub fn with_failure(mut self, fetch: Fetch) -> Self {
        self.failures.insert(fetch);
        self
    }

    /// Drafts accepted so far, in submission order
    pub fn submissions(&self) -> Vec<(String, MaintenanceDraft)> {
        self.submissions
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    fn check(&self, fetch: Fetch, id: &str) -> Result<(), DataError> {
        if self.failures.contains(&fetch) {
            return Err(DataError::Unavailable(format!("{:?} for {}", fetch, id)));
        }
        Ok(())
    }

    async fn pause(&self, inspection_id: &str) {
        if let Some(delay) = self.delays.get(inspection_id) {
            tokio::time::sleep(*delay).await;
        }
    }

    /// Demo data set used by the `generate --fixture` CLI mode
    pub fn sample() -> Self {
        let mut transformer = TransformerMetadata::new("AZ-8890");
        transformer.pole_number = Some("EN-122-A".into());
        transformer.region = Some("Nugegoda".into());
        transformer.kind = Some("Bulk".into());
        transformer.location_details = Some("Behind the substation gate".into());

        let mut completed = Inspection::new("INS-0001", "AZ-8890", InspectionStatus::Completed);
        completed.inspection_date = Some("2025-07-14".into());
        completed.inspection_time = Some("09:30".into());
        completed.branch = Some("Nugegoda".into());
        completed.maintenance_date = Some("2025-07-20".into());

        let mut pending = Inspection::new("INS-0002", "AZ-8890", InspectionStatus::Pending);
        pending.inspection_date = Some("2025-08-02".into());
        pending.inspection_time = Some("14:00".into());
        pending.branch = Some("Nugegoda".into());

        let created_at = NaiveDate::from_ymd_opt(2025, 7, 14)
            .and_then(|d| d.and_hms_opt(11, 5, 0))
            .unwrap_or_default();

        let record = MaintenanceRecord {
            id: Some(1),
            inspector_name: "N. Perera".into(),
            status: TransformerStatus::UnderMaintenance,
            voltage: Some(230.5),
            current: Some(15.3),
            recommended_action: "Replace the cracked bushing on phase B and re-torque the clamps."
                .into(),
            additional_remarks: "Oil level slightly below the mark.".into(),
            other_notes: String::new(),
            inspection_numbers: vec!["INS-0001".into(), "INS-0002".into()],
        };

        let mut service = Self::new()
            .with_transformer(transformer)
            .with_record("AZ-8890", record)
            .with_inspection(completed)
            .with_inspection(pending)
            .with_detections(
                "INS-0001",
                vec![
                    Detection::new("INS-0001", "pf", 0.91, (160.0, 110.0), (60.0, 50.0)),
                    Detection::new("INS-0001", "f", 0.60, (330.0, 190.0), (80.0, 70.0)),
                ],
            )
            .with_comments(
                "INS-0001",
                vec![Comment {
                    id: Some(1),
                    inspection_number: "INS-0001".into(),
                    topic: "Hot spot".into(),
                    body: "Thermal reading on the phase B bushing is well above the other phases."
                        .into(),
                    author: "tech".into(),
                    created_at: Some(created_at),
                }],
            );

        if let Some(image) = sample_thermal_image() {
            service = service.with_image("INS-0001", image);
        }
        service
    }
}

/// Synthetic gradient standing in for a thermal capture
fn sample_thermal_image() -> Option<RasterImage> {
    let img = RgbImage::from_fn(480, 300, |x, y| {
        let heat = ((x * 255) / 480) as u8;
        Rgb([heat, (y * 120 / 300) as u8, 255 - heat])
    });
    let mut buffer = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .ok()?;
    Some(RasterImage::new(buffer))
}

#[async_trait]
impl DataService for InMemoryDataService {
    async fn get_transformer(&self, transformer_id: &str) -> Result<TransformerMetadata, DataError> {
        self.transformers
            .get(transformer_id)
            .cloned()
            .ok_or_else(|| DataError::NotFound(format!("transformer {}", transformer_id)))
    }

    async fn get_maintenance_records(
        &self,
        transformer_id: &str,
    ) -> Result<Vec<MaintenanceRecord>, DataError> {
        self.check(Fetch::Records, transformer_id)?;
        Ok(self.records.get(transformer_id).cloned().unwrap_or_default())
    }

    async fn get_inspections(&self, transformer_id: &str) -> Result<Vec<Inspection>, DataError> {
        self.check(Fetch::Inspections, transformer_id)?;
        Ok(self.inspections.get(transformer_id).cloned().unwrap_or_default())
    }

    async fn get_detections(&self, inspection_id: &str) -> Result<Vec<Detection>, DataError> {
        self.pause(inspection_id).await;
        self.check(Fetch::Detections, inspection_id)?;
        Ok(self.detections.get(inspection_id).cloned().unwrap_or_default())
    }

    async fn get_comments(&self, inspection_id: &str) -> Result<Vec<Comment>, DataError> {
        self.pause(inspection_id).await;
        self.check(Fetch::Comments, inspection_id)?;
        Ok(self.comments.get(inspection_id).cloned().unwrap_or_default())
    }

    async fn get_image(&self, inspection_id: &str) -> Result<RasterImage, DataError> {
        if self.stalled_images.contains(inspection_id) {
            std::future::pending::<()>().await;
        }
        self.pause(inspection_id).await;
        self.check(Fetch::Image, inspection_id)?;
        self.images
            .get(inspection_id)
            .cloned()
            .ok_or_else(|| DataError::NotFound(format!("image for {}", inspection_id)))
    }

    async fn submit_maintenance_report(
        &self,
        transformer_id: &str,
        draft: &MaintenanceDraft,
    ) -> Result<Ack, DataError> {
        if self.failures.contains(&Fetch::Submit) {
            return Err(DataError::SubmissionFailed(
                "storage rejected the record".to_string(),
            ));
        }

        let mut submissions = self
            .submissions
            .lock()
            .map_err(|_| DataError::SubmissionFailed("submission log poisoned".to_string()))?;
        submissions.push((transformer_id.to_string(), draft.clone()));

        let existing = self.records.get(transformer_id).map_or(0, Vec::len);
        Ok(Ack {
            record_id: Some((existing + submissions.len()) as i64),
        })
    }
}
