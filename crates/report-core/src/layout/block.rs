use shared_types::{InspectionStatus, RasterImage};

use super::wrap::wrap_text;
use super::FontStyle;

pub(crate) const BANNER_HEIGHT: f64 = 20.0;
pub(crate) const BANNER_ADVANCE: f64 = 28.0;
pub(crate) const DATE_ADVANCE: f64 = 12.0;
pub(crate) const SECTION_ADVANCE: f64 = 12.0;
pub(crate) const ROW_ADVANCE: f64 = 7.0;

pub(crate) const PARAGRAPH_SIZE: f64 = 11.0;
pub(crate) const PARAGRAPH_LINE: f64 = 5.0;
pub(crate) const PARAGRAPH_TRAILER: f64 = 10.0;
/// Paragraphs wrap to the content width minus this inset
pub(crate) const PARAGRAPH_INSET: f64 = 10.0;

pub(crate) const ENTRY_BOX_HEIGHT: f64 = 25.0;
pub(crate) const ENTRY_ADVANCE: f64 = 28.0;
pub(crate) const LIST_HEADER_ADVANCE: f64 = 6.0;
pub(crate) const DETECTION_LINE: f64 = 5.0;
pub(crate) const LIST_TRAILER: f64 = 1.0;
pub(crate) const COMMENT_TOPIC_ADVANCE: f64 = 4.0;
pub(crate) const COMMENT_SIZE: f64 = 9.0;
pub(crate) const COMMENT_LINE: f64 = 4.0;
pub(crate) const COMMENT_FOOTER_ADVANCE: f64 = 5.0;
/// Comment bodies wrap to the content width minus this inset
pub(crate) const COMMENT_INSET: f64 = 30.0;

pub(crate) const IMAGE_TITLE_ADVANCE: f64 = 5.0;
pub(crate) const IMAGE_WIDTH: f64 = 120.0;
pub(crate) const IMAGE_HEIGHT: f64 = 70.0;
pub(crate) const IMAGE_TRAILER: f64 = 2.0;
pub(crate) const PLACEHOLDER_ADVANCE: f64 = 3.0;

pub(crate) const SIGNATURE_HEADER_ADVANCE: f64 = 15.0;
pub(crate) const SIGNATURE_WIDTH: f64 = 65.0;
pub(crate) const SIGNATURE_HEIGHT: f64 = 25.0;
pub(crate) const SIGNATURE_CAPTION_OFFSET: f64 = 6.0;
pub(crate) const SIGNATURE_TRAILER: f64 = 2.0;

/// A label/value pair in a two-column row
#[derive(Debug, Clone, PartialEq)]
pub struct KeyValue {
    pub label: String,
    pub value: String,
}

impl KeyValue {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommentEntry {
    pub topic: String,
    pub body: String,
    /// Pre-formatted attribution line
    pub byline: String,
}

/// One inspection's summary box with its detection and comment lists
#[derive(Debug, Clone, PartialEq)]
pub struct InspectionEntry {
    pub inspection_number: String,
    pub status: InspectionStatus,
    pub schedule: String,
    pub branch: String,
    pub maintenance: Option<String>,
    /// Pre-formatted detection lines
    pub detections: Vec<String>,
    pub comments: Vec<CommentEntry>,
}

/// What to draw in an image slot
#[derive(Debug, Clone, PartialEq)]
pub enum ImageContent {
    Raster(RasterImage),
    /// The image existed but could not be fetched or decoded
    Unavailable,
    Missing,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SignaturePair {
    pub technician: Option<RasterImage>,
    pub supervisor: Option<RasterImage>,
}

/// Layout input, placed strictly in order
#[derive(Debug, Clone, PartialEq)]
pub enum ReportBlock {
    /// Colored title bar followed by the right-aligned generation date
    Banner { title: String, generated: String },
    SectionHeader { title: String },
    KeyValueRow {
        left: Option<KeyValue>,
        right: Option<KeyValue>,
    },
    Paragraph { text: String },
    BorderedEntry(InspectionEntry),
    Image(ImageContent),
    SignaturePair(SignaturePair),
    /// Fixed vertical gap; never triggers a page break
    Spacing(f64),
    /// Closing line anchored near the bottom of the last page
    Footer { text: String },
}

impl ReportBlock {
    /// Vertical space the block consumes, in millimetres, for the given
    /// content width
    pub fn estimated_height(&self, content_width: f64) -> f64 {
        match self {
            ReportBlock::Banner { .. } => BANNER_ADVANCE + DATE_ADVANCE,
            ReportBlock::SectionHeader { .. } => SECTION_ADVANCE,
            ReportBlock::KeyValueRow { .. } => ROW_ADVANCE,
            ReportBlock::Paragraph { text } => {
                let lines = paragraph_lines(text, content_width).len();
                lines as f64 * PARAGRAPH_LINE + PARAGRAPH_TRAILER
            }
            ReportBlock::BorderedEntry(entry) => entry.height(content_width),
            ReportBlock::Image(content) => image_height(content),
            ReportBlock::SignaturePair(_) => {
                SIGNATURE_HEADER_ADVANCE
                    + SIGNATURE_HEIGHT
                    + SIGNATURE_CAPTION_OFFSET
                    + SIGNATURE_TRAILER
            }
            ReportBlock::Spacing(gap) => *gap,
            ReportBlock::Footer { .. } => 0.0,
        }
    }
}

impl InspectionEntry {
    fn height(&self, content_width: f64) -> f64 {
        let mut height = ENTRY_ADVANCE;
        if !self.detections.is_empty() {
            height += LIST_HEADER_ADVANCE
                + self.detections.len() as f64 * DETECTION_LINE
                + LIST_TRAILER;
        }
        if !self.comments.is_empty() {
            height += LIST_HEADER_ADVANCE + LIST_TRAILER;
            for comment in &self.comments {
                height += comment.height(content_width);
            }
        }
        height
    }
}

impl CommentEntry {
    pub(crate) fn height(&self, content_width: f64) -> f64 {
        let lines = comment_lines(&self.body, content_width).len();
        COMMENT_TOPIC_ADVANCE + lines as f64 * COMMENT_LINE + COMMENT_FOOTER_ADVANCE
    }

    /// Topic plus the first body line; the rest may flow onto later pages
    pub(crate) fn lead_height(&self) -> f64 {
        let first_line = if self.body.trim().is_empty() { 0.0 } else { COMMENT_LINE };
        COMMENT_TOPIC_ADVANCE + first_line
    }
}

pub(crate) fn image_height(content: &ImageContent) -> f64 {
    match content {
        ImageContent::Raster(_) => IMAGE_TITLE_ADVANCE + IMAGE_HEIGHT + IMAGE_TRAILER,
        ImageContent::Unavailable | ImageContent::Missing => PLACEHOLDER_ADVANCE,
    }
}

pub(crate) fn paragraph_lines(text: &str, content_width: f64) -> Vec<String> {
    wrap_text(
        text,
        content_width - PARAGRAPH_INSET,
        PARAGRAPH_SIZE,
        FontStyle::Regular,
    )
}

pub(crate) fn comment_lines(text: &str, content_width: f64) -> Vec<String> {
    wrap_text(
        text,
        content_width - COMMENT_INSET,
        COMMENT_SIZE,
        FontStyle::Regular,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> InspectionEntry {
        InspectionEntry {
            inspection_number: "INS-1".into(),
            status: InspectionStatus::Completed,
            schedule: "Date: 2024-05-01 at 10:00".into(),
            branch: "Branch: Kandy".into(),
            maintenance: None,
            detections: Vec::new(),
            comments: Vec::new(),
        }
    }

    #[test]
    fn test_bare_entry_height_is_the_box_advance() {
        let block = ReportBlock::BorderedEntry(entry());
        assert_eq!(block.estimated_height(180.0), ENTRY_ADVANCE);
    }

    #[test]
    fn test_entry_height_counts_detections_and_comments() {
        let mut e = entry();
        e.detections = vec!["- pf (91.0% confidence)".into(), "- f (60.0% confidence)".into()];
        e.comments = vec![CommentEntry {
            topic: "Oil".into(),
            body: "Short".into(),
            byline: "By: tech - 2024-05-01 10:15".into(),
        }];
        let expected = 28.0 + (6.0 + 2.0 * 5.0 + 1.0) + (6.0 + 1.0) + (4.0 + 4.0 + 5.0);
        assert_eq!(ReportBlock::BorderedEntry(e).estimated_height(180.0), expected);
    }

    #[test]
    fn test_paragraph_height_grows_with_lines() {
        let short = ReportBlock::Paragraph { text: "one line".into() };
        let long = ReportBlock::Paragraph {
            text: "word ".repeat(200),
        };
        assert_eq!(short.estimated_height(180.0), 15.0);
        assert!(long.estimated_height(180.0) > 30.0);
    }

    #[test]
    fn test_image_placeholder_is_short() {
        assert_eq!(ReportBlock::Image(ImageContent::Missing).estimated_height(180.0), 3.0);
        assert_eq!(
            ReportBlock::Image(ImageContent::Raster(RasterImage::new(vec![1]))).estimated_height(180.0),
            77.0
        );
    }
}
