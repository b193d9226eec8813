//! Turns a report snapshot into the ordered block stream and lays it out

use chrono::NaiveDate;
use shared_types::{
    Comment, Detection, ImageSlot, Inspection, MaintenanceDraft, RasterImage, ReportData, Signature,
    Signatures,
};

use crate::layout::{
    CommentEntry, Document, ImageContent, InspectionEntry, KeyValue, LayoutEngine, PageGeometry,
    ReportBlock, SignaturePair,
};

pub const REPORT_TITLE: &str = "MAINTENANCE RECORD REPORT";
pub const FOOTER_TEXT: &str = "This is a computer-generated maintenance report";

const NOT_AVAILABLE: &str = "N/A";
const SECTION_GAP: f64 = 5.0;
const ENTRY_GAP: f64 = 3.0;

#[derive(Debug, Clone)]
pub struct ComposeOptions {
    /// Date printed in the banner
    pub generated_on: NaiveDate,
    pub geometry: PageGeometry,
}

impl ComposeOptions {
    pub fn new(generated_on: NaiveDate) -> Self {
        Self {
            generated_on,
            geometry: PageGeometry::A4,
        }
    }
}

impl Default for ComposeOptions {
    fn default() -> Self {
        Self::new(chrono::Local::now().date_naive())
    }
}

/// Pure composition from a report snapshot and a draft. No I/O.
#[derive(Debug, Clone, Default)]
pub struct ReportComposer {
    options: ComposeOptions,
}

impl ReportComposer {
    pub fn new(options: ComposeOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ComposeOptions {
        &self.options
    }

    pub fn compose(
        &self,
        data: &ReportData,
        draft: &MaintenanceDraft,
        signatures: &Signatures,
    ) -> Document {
        let blocks = self.compose_blocks(data, draft, signatures);
        tracing::debug!(
            "Composing report for {} from {} block(s)",
            data.transformer.transformer_number,
            blocks.len()
        );
        LayoutEngine::layout(self.options.geometry, &blocks)
    }

    /// Block stream in fixed section order
    pub fn compose_blocks(
        &self,
        data: &ReportData,
        draft: &MaintenanceDraft,
        signatures: &Signatures,
    ) -> Vec<ReportBlock> {
        let mut blocks = vec![ReportBlock::Banner {
            title: REPORT_TITLE.to_string(),
            generated: format!("Generated: {}", self.options.generated_on.format("%B %-d, %Y")),
        }];

        transformer_section(&mut blocks, data, draft);
        readings_section(&mut blocks, draft);

        section(&mut blocks, "RECOMMENDED ACTION");
        blocks.push(ReportBlock::Paragraph {
            text: or_na(&draft.recommended_action).to_string(),
        });

        for (title, text) in [
            ("ADDITIONAL REMARKS", &draft.additional_remarks),
            ("OTHER NOTES", &draft.other_notes),
        ] {
            if !text.trim().is_empty() {
                section(&mut blocks, title);
                blocks.push(ReportBlock::Paragraph { text: text.clone() });
            }
        }

        if !data.inspections.is_empty() {
            section(
                &mut blocks,
                &format!("RELATED INSPECTIONS ({})", data.inspections.len()),
            );
            for inspection in &data.inspections {
                inspection_blocks(&mut blocks, data, inspection);
            }
        }

        blocks.push(ReportBlock::SignaturePair(SignaturePair {
            technician: inked(&signatures.technician),
            supervisor: inked(&signatures.supervisor),
        }));
        blocks.push(ReportBlock::Footer {
            text: FOOTER_TEXT.to_string(),
        });

        blocks
    }
}

fn section(blocks: &mut Vec<ReportBlock>, title: &str) {
    blocks.push(ReportBlock::SectionHeader {
        title: title.to_string(),
    });
}

fn row(left: Option<KeyValue>, right: Option<KeyValue>) -> ReportBlock {
    ReportBlock::KeyValueRow { left, right }
}

fn or_na(value: &str) -> &str {
    if value.trim().is_empty() {
        NOT_AVAILABLE
    } else {
        value
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn transformer_section(blocks: &mut Vec<ReportBlock>, data: &ReportData, draft: &MaintenanceDraft) {
    let transformer = &data.transformer;
    let number = if draft.transformer_number.trim().is_empty() {
        transformer.transformer_number.as_str()
    } else {
        draft.transformer_number.as_str()
    };

    section(blocks, "TRANSFORMER INFORMATION");
    blocks.push(row(
        Some(KeyValue::new("Transformer Number:", or_na(number))),
        present(&transformer.pole_number).map(|pole| KeyValue::new("Pole Name:", pole)),
    ));
    blocks.push(row(
        present(&transformer.kind).map(|kind| KeyValue::new("Type:", kind)),
        present(&transformer.region).map(|region| KeyValue::new("Region:", region)),
    ));
    blocks.push(row(
        Some(KeyValue::new("Status:", draft.status.to_string())),
        Some(KeyValue::new("Inspector:", or_na(&draft.inspector_name))),
    ));
    if let Some(location) = present(&transformer.location_details) {
        blocks.push(row(Some(KeyValue::new("Location:", location)), None));
    }
    blocks.push(ReportBlock::Spacing(SECTION_GAP));
}

fn readings_section(blocks: &mut Vec<ReportBlock>, draft: &MaintenanceDraft) {
    section(blocks, "ELECTRICAL READINGS");
    blocks.push(row(
        Some(KeyValue::new("Voltage:", reading(draft.voltage, "V"))),
        Some(KeyValue::new("Current:", reading(draft.current, "A"))),
    ));
    blocks.push(ReportBlock::Spacing(SECTION_GAP));
}

/// Shortest decimal that round-trips, so `230.5` prints as entered
fn reading(value: Option<f64>, unit: &str) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{} {}", v, unit),
        _ => format!("{} {}", NOT_AVAILABLE, unit),
    }
}

fn inspection_blocks(blocks: &mut Vec<ReportBlock>, data: &ReportData, inspection: &Inspection) {
    let number = inspection.inspection_number.as_str();
    let date = present(&inspection.inspection_date).unwrap_or(NOT_AVAILABLE);
    let time = present(&inspection.inspection_time).unwrap_or(NOT_AVAILABLE);

    let entry = InspectionEntry {
        inspection_number: or_na(number).to_string(),
        status: inspection.status.clone(),
        schedule: format!("Date: {} at {}", date, time),
        branch: format!(
            "Branch: {}",
            present(&inspection.branch).unwrap_or(NOT_AVAILABLE)
        ),
        maintenance: present(&inspection.maintenance_date).map(|date| {
            format!(
                "Maintenance: {} at {}",
                date,
                present(&inspection.maintenance_time).unwrap_or(NOT_AVAILABLE)
            )
        }),
        detections: data.detections_for(number).iter().map(detection_line).collect(),
        comments: data.comments_for(number).iter().map(comment_entry).collect(),
    };
    blocks.push(ReportBlock::BorderedEntry(entry));

    let image = match data.image_for(number) {
        Some(ImageSlot::Annotated(raster)) => ImageContent::Raster(raster.clone()),
        Some(ImageSlot::Unavailable) => ImageContent::Unavailable,
        None => ImageContent::Missing,
    };
    blocks.push(ReportBlock::Image(image));
    blocks.push(ReportBlock::Spacing(ENTRY_GAP));
}

fn detection_line(detection: &Detection) -> String {
    format!(
        "- {} ({:.1}% confidence)",
        detection.label(),
        normalized_confidence(detection) * 100.0
    )
}

/// Confidence clamped into [0, 1]; non-finite values count as zero
fn normalized_confidence(detection: &Detection) -> f64 {
    let raw = detection.confidence;
    let clamped = if raw.is_finite() { raw.clamp(0.0, 1.0) } else { 0.0 };
    if clamped != raw {
        tracing::debug!(
            "Clamped confidence {} to {} for detection on {}",
            raw,
            clamped,
            detection.inspection_number
        );
    }
    clamped
}

fn comment_entry(comment: &Comment) -> CommentEntry {
    let author = if comment.author.trim().is_empty() {
        "Unknown"
    } else {
        comment.author.as_str()
    };
    CommentEntry {
        topic: or_na(&comment.topic).to_string(),
        body: comment.body.clone(),
        byline: format!(
            "By: {} - {}",
            author,
            comment
                .created_at
                .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default()
        ),
    }
}

/// The signature image, unless it is missing or fully transparent
fn inked(signature: &Signature) -> Option<RasterImage> {
    let raster = signature.image()?;
    match image::load_from_memory(raster.as_bytes()) {
        Ok(decoded) if decoded.to_rgba8().pixels().all(|p| p.0[3] == 0) => None,
        // Undecodable captures are passed on; layout leaves the box empty
        _ => Some(raster.clone()),
    }
}
