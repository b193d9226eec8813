//! Fetch everything one report needs in a single consistent snapshot
//!
//! Only the transformer lookup is fatal. Every other fetch degrades to an
//! empty value and a warning so the report still renders.

use std::fmt::Display;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use report_core::annotate;
use shared_types::{
    Comment, Detection, ImageSlot, Inspection, MaintenanceDraft, MaintenanceRecord, RasterImage,
    ReportData,
};
use tokio::task::JoinSet;

use crate::config::ServiceConfig;
use crate::error::DataError;
use crate::service::DataService;

/// Which form values a report is composed from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordSelection {
    /// Empty form listing every inspection
    #[default]
    Blank,
    /// The existing record with the highest id
    Latest,
    Record(i64),
}

/// Parses `blank`, `latest` or a numeric record id
impl FromStr for RecordSelection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "blank" => Ok(RecordSelection::Blank),
            "latest" => Ok(RecordSelection::Latest),
            other => other
                .parse()
                .map(RecordSelection::Record)
                .map_err(|_| format!("expected 'blank', 'latest' or a record id, got '{}'", s)),
        }
    }
}

/// Per-inspection fetch result produced by one fan-out task
#[derive(Debug)]
struct InspectionArtifacts {
    inspection_number: String,
    detections: Vec<Detection>,
    comments: Vec<Comment>,
    image: Option<ImageSlot>,
}

#[derive(Clone)]
pub struct Aggregator {
    service: Arc<dyn DataService>,
    image_timeout: Duration,
}

impl Aggregator {
    pub fn new(service: Arc<dyn DataService>, config: &ServiceConfig) -> Self {
        Self {
            service,
            image_timeout: config.image_timeout,
        }
    }

    pub fn image_timeout(&self) -> Duration {
        self.image_timeout
    }

    pub async fn aggregate(&self, transformer_id: &str) -> Result<ReportData, DataError> {
        self.aggregate_with(transformer_id, RecordSelection::Blank)
            .await
    }

    pub async fn aggregate_with(
        &self,
        transformer_id: &str,
        selection: RecordSelection,
    ) -> Result<ReportData, DataError> {
        let transformer = self.service.get_transformer(transformer_id).await?;
        let number = transformer.transformer_number.clone();

        let records = degrade(
            self.service.get_maintenance_records(transformer_id).await,
            "maintenance records",
            transformer_id,
        );
        let inspections = degrade(
            self.service.get_inspections(transformer_id).await,
            "inspections",
            transformer_id,
        );

        let draft = select_draft(&number, &records, &inspections, selection)?;

        tracing::info!(
            "Aggregating report data for {} ({} inspection(s), {} record(s))",
            number,
            inspections.len(),
            records.len()
        );

        let mut tasks = JoinSet::new();
        for inspection in &inspections {
            tasks.spawn(load_artifacts(
                Arc::clone(&self.service),
                inspection.inspection_number.clone(),
                self.image_timeout,
            ));
        }

        let mut data = ReportData::new(transformer);
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(artifacts) => {
                    let key = artifacts.inspection_number;
                    data.detections.insert(key.clone(), artifacts.detections);
                    data.comments.insert(key.clone(), artifacts.comments);
                    if let Some(image) = artifacts.image {
                        data.images.insert(key, image);
                    }
                }
                Err(e) => tracing::warn!("Inspection fetch task failed: {}", e),
            }
        }

        // A task that panicked still leaves its inspection with empty lists
        for inspection in &inspections {
            let key = &inspection.inspection_number;
            data.detections.entry(key.clone()).or_default();
            data.comments.entry(key.clone()).or_default();
        }

        data.records = records;
        data.inspections = inspections;
        data.draft = draft;
        Ok(data)
    }
}

fn degrade<T: Default, E: Display>(result: Result<T, E>, what: &str, id: &str) -> T {
    result.unwrap_or_else(|e| {
        tracing::warn!("Failed to load {} for {}: {}", what, id, e);
        T::default()
    })
}

fn select_draft(
    transformer_number: &str,
    records: &[MaintenanceRecord],
    inspections: &[Inspection],
    selection: RecordSelection,
) -> Result<MaintenanceDraft, DataError> {
    let record = match selection {
        RecordSelection::Blank => None,
        RecordSelection::Latest => records.iter().max_by_key(|r| r.id),
        RecordSelection::Record(id) => Some(
            records
                .iter()
                .find(|r| r.id == Some(id))
                .ok_or_else(|| DataError::NotFound(format!("maintenance record {}", id)))?,
        ),
    };

    Ok(match record {
        Some(record) => MaintenanceDraft::from_record(transformer_number, record),
        None => {
            let mut draft = MaintenanceDraft::blank(transformer_number);
            draft.inspection_numbers = inspections
                .iter()
                .map(|i| i.inspection_number.clone())
                .collect();
            draft
        }
    })
}

async fn load_artifacts(
    service: Arc<dyn DataService>,
    inspection_number: String,
    image_timeout: Duration,
) -> InspectionArtifacts {
    let id = inspection_number.as_str();
    let (detections, comments, image) = tokio::join!(
        service.get_detections(id),
        service.get_comments(id),
        tokio::time::timeout(image_timeout, service.get_image(id)),
    );

    let detections = degrade(detections, "detections", id);
    let comments = degrade(comments, "comments", id);

    let image = match image {
        Err(_elapsed) => {
            tracing::warn!(
                "Image for {} did not arrive within {}ms",
                id,
                image_timeout.as_millis()
            );
            Some(ImageSlot::Unavailable)
        }
        Ok(Err(e)) => {
            if e.is_not_found() {
                tracing::debug!("No image stored for {}", id);
            } else {
                tracing::warn!("Failed to load image for {}: {}", id, e);
            }
            None
        }
        Ok(Ok(raster)) if raster.is_empty() => None,
        Ok(Ok(raster)) => Some(annotate_off_thread(raster, &detections, id).await),
    };

    InspectionArtifacts {
        inspection_number,
        detections,
        comments,
        image,
    }
}

/// Annotation is CPU-bound; run it on the blocking pool
async fn annotate_off_thread(raster: RasterImage, detections: &[Detection], id: &str) -> ImageSlot {
    let boxes = detections.to_vec();
    match tokio::task::spawn_blocking(move || annotate(&raster, &boxes)).await {
        Ok(annotated) => ImageSlot::Annotated(annotated),
        Err(e) => {
            tracing::warn!("Annotation task for {} failed: {}", id, e);
            ImageSlot::Unavailable
        }
    }
}
