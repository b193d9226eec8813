//! Aggregated snapshot a report is composed from

use std::collections::HashMap;

use crate::draft::MaintenanceDraft;
use crate::raster::RasterImage;
use crate::types::{Comment, Detection, Inspection, MaintenanceRecord, TransformerMetadata};

/// Outcome of loading one inspection's image
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSlot {
    /// Image with detection boxes drawn on it
    Annotated(RasterImage),
    /// The fetch did not finish within the image timeout
    Unavailable,
}

/// Everything needed to render one report, fetched once.
///
/// The per-inspection maps are keyed by inspection number. An inspection with
/// no image has no entry in `images`.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportData {
    pub transformer: TransformerMetadata,
    pub records: Vec<MaintenanceRecord>,
    pub draft: MaintenanceDraft,
    pub inspections: Vec<Inspection>,
    pub detections: HashMap<String, Vec<Detection>>,
    pub comments: HashMap<String, Vec<Comment>>,
    pub images: HashMap<String, ImageSlot>,
}

impl ReportData {
    /// Snapshot with no records, inspections or artifacts
    pub fn new(transformer: TransformerMetadata) -> Self {
        let draft = MaintenanceDraft::blank(transformer.transformer_number.clone());
        Self {
            transformer,
            records: Vec::new(),
            draft,
            inspections: Vec::new(),
            detections: HashMap::new(),
            comments: HashMap::new(),
            images: HashMap::new(),
        }
    }

    pub fn detections_for(&self, inspection_number: &str) -> &[Detection] {
        self.detections
            .get(inspection_number)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn comments_for(&self, inspection_number: &str) -> &[Comment] {
        self.comments
            .get(inspection_number)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn image_for(&self, inspection_number: &str) -> Option<&ImageSlot> {
        self.images.get(inspection_number)
    }
}
