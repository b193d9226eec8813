use shared_types::{InspectionStatus, RasterImage};

use super::block::*;
use super::metrics::text_width;
use super::{Color, Document, DrawOp, EmbeddedImage, FontStyle, Page, PageGeometry, Stroke};

const BANNER_TITLE_SIZE: f64 = 22.0;
const BANNER_BASELINE: f64 = 13.0;
const DATE_SIZE: f64 = 10.0;
const SECTION_BAR_HEIGHT: f64 = 8.0;
const SECTION_TITLE_SIZE: f64 = 14.0;
const SECTION_BASELINE: f64 = 6.0;
const ROW_SIZE: f64 = 11.0;
const ENTRY_TITLE_SIZE: f64 = 12.0;
const BADGE_SIZE: f64 = 9.0;
const BADGE_WIDTH: f64 = 30.0;
const BADGE_HEIGHT: f64 = 6.0;
const BODY_SIZE: f64 = 10.0;
const BYLINE_SIZE: f64 = 8.0;
const FOOTER_SIZE: f64 = 8.0;
const FOOTER_OFFSET: f64 = 15.0;
const THIN: f64 = 0.3;
const MEDIUM: f64 = 0.5;

const BADGE_COMPLETED: Color = Color(76, 175, 80);
const BADGE_PENDING: Color = Color(255, 193, 7);
const BADGE_OTHER: Color = Color(158, 158, 158);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Center,
    Right,
}

/// Pages touched by one placed block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub first_page: usize,
    pub last_page: usize,
}

/// Places report blocks top to bottom, starting a new page whenever the
/// next unit would cross the page limit.
///
/// A unit that does not fit is moved whole to the next page. A unit that is
/// taller than a page is placed at the top of a fresh page and allowed to
/// overrun rather than breaking again.
pub struct LayoutEngine {
    geometry: PageGeometry,
    pages: Vec<Page>,
    images: Vec<EmbeddedImage>,
    y: f64,
    first_touched: Option<usize>,
}

impl LayoutEngine {
    pub fn new(geometry: PageGeometry) -> Self {
        let mut engine = Self {
            geometry,
            pages: Vec::new(),
            images: Vec::new(),
            y: geometry.top,
            first_touched: None,
        };
        engine.start_page();
        engine
    }

    /// Lay out a whole block stream
    pub fn layout(geometry: PageGeometry, blocks: &[ReportBlock]) -> Document {
        let mut engine = Self::new(geometry);
        for block in blocks {
            engine.place(block);
        }
        engine.finish()
    }

    /// Current cursor position
    pub fn cursor(&self) -> f64 {
        self.y
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn place(&mut self, block: &ReportBlock) -> Span {
        self.first_touched = None;

        match block {
            ReportBlock::Banner { title, generated } => self.place_banner(title, generated),
            ReportBlock::SectionHeader { title } => {
                // Keep a header together with at least one row of its content
                self.ensure_space(SECTION_ADVANCE + ROW_ADVANCE, self.geometry.limit);
                self.section_bar(title);
                self.y += SECTION_ADVANCE;
            }
            ReportBlock::KeyValueRow { left, right } => self.place_row(left.as_ref(), right.as_ref()),
            ReportBlock::Paragraph { text } => self.place_paragraph(text),
            ReportBlock::BorderedEntry(entry) => self.place_entry(entry),
            ReportBlock::Image(content) => self.place_image(content),
            ReportBlock::SignaturePair(pair) => self.place_signatures(pair),
            ReportBlock::Spacing(gap) => self.y += gap,
            ReportBlock::Footer { text } => {
                let y = self.geometry.height - FOOTER_OFFSET;
                let x = self.geometry.width / 2.0;
                self.text(x, y, text, FOOTER_SIZE, FontStyle::Italic, Color::CAPTION, Align::Center);
            }
        }

        let last_page = self.pages.len() - 1;
        Span {
            first_page: self.first_touched.unwrap_or(last_page),
            last_page,
        }
    }

    pub fn finish(self) -> Document {
        tracing::debug!("Layout finished with {} page(s)", self.pages.len());
        Document {
            pages: self.pages,
            images: self.images,
        }
    }

    fn start_page(&mut self) {
        self.pages.push(Page::default());
        self.y = self.geometry.top;

        let inset = self.geometry.border_inset;
        self.push(DrawOp::Rect {
            x: inset,
            y: inset,
            width: self.geometry.width - 2.0 * inset,
            height: self.geometry.height - 2.0 * inset,
            fill: None,
            stroke: Some(Stroke {
                color: Color::PAGE_BORDER,
                width: MEDIUM,
            }),
        });
    }

    /// Break before a unit of height `height` that would cross `limit`.
    /// Never breaks at the top of a page.
    fn ensure_space(&mut self, height: f64, limit: f64) {
        if self.y + height > limit && self.y > self.geometry.top {
            tracing::debug!(
                "Page break at y={:.1} for a {:.1}mm unit (page {})",
                self.y,
                height,
                self.pages.len() + 1
            );
            self.start_page();
        }
    }

    fn push(&mut self, op: DrawOp) {
        let index = self.pages.len() - 1;
        // Page borders don't count as block content
        if !self.pages[index].ops.is_empty() && self.first_touched.is_none() {
            self.first_touched = Some(index);
        }
        self.pages[index].ops.push(op);
    }

    #[allow(clippy::too_many_arguments)]
    fn text(
        &mut self,
        x: f64,
        y: f64,
        text: &str,
        size: f64,
        style: FontStyle,
        color: Color,
        align: Align,
    ) {
        let x = match align {
            Align::Left => x,
            Align::Center => x - text_width(text, size, style) / 2.0,
            Align::Right => x - text_width(text, size, style),
        };
        self.push(DrawOp::Text {
            x,
            y,
            text: text.to_string(),
            size,
            style,
            color,
        });
    }

    fn fill(&mut self, x: f64, y: f64, width: f64, height: f64, color: Color) {
        self.push(DrawOp::Rect {
            x,
            y,
            width,
            height,
            fill: Some(color),
            stroke: None,
        });
    }

    fn frame(&mut self, x: f64, y: f64, width: f64, height: f64, color: Color, line: f64) {
        self.push(DrawOp::Rect {
            x,
            y,
            width,
            height,
            fill: None,
            stroke: Some(Stroke { color, width: line }),
        });
    }

    fn section_bar(&mut self, title: &str) {
        let (margin, width) = (self.geometry.margin, self.geometry.content_width());
        let y = self.y;
        self.fill(margin, y, width, SECTION_BAR_HEIGHT, Color::SECTION_FILL);
        self.text(
            margin + 2.0,
            y + SECTION_BASELINE,
            title,
            SECTION_TITLE_SIZE,
            FontStyle::Bold,
            Color::BRAND,
            Align::Left,
        );
    }

    fn place_banner(&mut self, title: &str, generated: &str) {
        self.ensure_space(BANNER_ADVANCE + DATE_ADVANCE, self.geometry.limit);
        let (margin, width) = (self.geometry.margin, self.geometry.content_width());
        let page_width = self.geometry.width;
        let y = self.y;

        self.fill(margin, y, width, BANNER_HEIGHT, Color::BRAND);
        self.text(
            page_width / 2.0,
            y + BANNER_BASELINE,
            title,
            BANNER_TITLE_SIZE,
            FontStyle::Bold,
            Color::WHITE,
            Align::Center,
        );
        self.y += BANNER_ADVANCE;

        let y = self.y;
        self.text(
            page_width - margin,
            y,
            generated,
            DATE_SIZE,
            FontStyle::Regular,
            Color::MUTED,
            Align::Right,
        );
        self.y += DATE_ADVANCE;
    }

    fn place_row(&mut self, left: Option<&KeyValue>, right: Option<&KeyValue>) {
        self.ensure_space(ROW_ADVANCE, self.geometry.limit);
        let y = self.y;
        let columns = [
            (left, self.geometry.margin + 5.0, 50.0),
            (right, self.geometry.width / 2.0 + 5.0, 30.0),
        ];
        for (pair, x, value_offset) in columns {
            if let Some(pair) = pair {
                self.text(x, y, &pair.label, ROW_SIZE, FontStyle::Bold, Color::BLACK, Align::Left);
                self.text(
                    x + value_offset,
                    y,
                    &pair.value,
                    ROW_SIZE,
                    FontStyle::Regular,
                    Color::BLACK,
                    Align::Left,
                );
            }
        }
        self.y += ROW_ADVANCE;
    }

    fn place_paragraph(&mut self, text: &str) {
        let x = self.geometry.margin + 5.0;
        for line in paragraph_lines(text, self.geometry.content_width()) {
            self.ensure_space(PARAGRAPH_LINE, self.geometry.limit);
            let y = self.y;
            self.text(x, y, &line, PARAGRAPH_SIZE, FontStyle::Regular, Color::BLACK, Align::Left);
            self.y += PARAGRAPH_LINE;
        }
        self.y += PARAGRAPH_TRAILER;
    }

    fn place_entry(&mut self, entry: &InspectionEntry) {
        let limit = self.geometry.limit;
        let margin = self.geometry.margin;
        let content_width = self.geometry.content_width();

        self.ensure_space(ENTRY_ADVANCE, limit);
        let y = self.y;
        self.frame(margin + 3.0, y, content_width - 6.0, ENTRY_BOX_HEIGHT, Color::BRAND, MEDIUM);
        self.text(
            margin + 6.0,
            y + 6.0,
            &format!("Inspection: {}", entry.inspection_number),
            ENTRY_TITLE_SIZE,
            FontStyle::Bold,
            Color::BLACK,
            Align::Left,
        );

        let badge_x = self.geometry.width - margin - 35.0;
        let badge_color = match entry.status {
            InspectionStatus::Completed => BADGE_COMPLETED,
            InspectionStatus::Pending => BADGE_PENDING,
            _ => BADGE_OTHER,
        };
        self.fill(badge_x, y + 2.0, BADGE_WIDTH, BADGE_HEIGHT, badge_color);
        self.text(
            badge_x + BADGE_WIDTH / 2.0,
            y + 6.0,
            &entry.status.to_string(),
            BADGE_SIZE,
            FontStyle::Bold,
            Color::WHITE,
            Align::Center,
        );

        let details = [Some(&entry.schedule), Some(&entry.branch), entry.maintenance.as_ref()];
        for (line, offset) in details.into_iter().zip([12.0, 17.0, 22.0]) {
            if let Some(line) = line {
                self.text(
                    margin + 6.0,
                    y + offset,
                    line,
                    BODY_SIZE,
                    FontStyle::Regular,
                    Color::BODY,
                    Align::Left,
                );
            }
        }
        self.y += ENTRY_ADVANCE;

        if !entry.detections.is_empty() {
            self.ensure_space(LIST_HEADER_ADVANCE + DETECTION_LINE, limit);
            let y = self.y;
            self.text(
                margin + 6.0,
                y,
                &format!("Detected Issues ({}):", entry.detections.len()),
                BODY_SIZE,
                FontStyle::Bold,
                Color::ALERT,
                Align::Left,
            );
            self.y += LIST_HEADER_ADVANCE;

            for line in &entry.detections {
                self.ensure_space(DETECTION_LINE, limit);
                let y = self.y;
                self.text(
                    margin + 10.0,
                    y,
                    line,
                    BODY_SIZE,
                    FontStyle::Regular,
                    Color::BODY,
                    Align::Left,
                );
                self.y += DETECTION_LINE;
            }
            self.y += LIST_TRAILER;
        }

        if let Some(first) = entry.comments.first() {
            self.ensure_space(LIST_HEADER_ADVANCE + first.lead_height(), limit);
            let y = self.y;
            self.text(
                margin + 6.0,
                y,
                "Comments:",
                BODY_SIZE,
                FontStyle::Bold,
                Color::BRAND,
                Align::Left,
            );
            self.y += LIST_HEADER_ADVANCE;

            for comment in &entry.comments {
                self.place_comment(comment);
            }
            self.y += LIST_TRAILER;
        }
    }

    fn place_comment(&mut self, comment: &CommentEntry) {
        let margin = self.geometry.margin;
        let content_width = self.geometry.content_width();
        let limit = self.geometry.limit;
        self.ensure_space(comment.lead_height(), limit);

        let y = self.y;
        self.text(
            margin + 10.0,
            y,
            &format!("- {}", comment.topic),
            BODY_SIZE,
            FontStyle::Bold,
            Color::BODY,
            Align::Left,
        );
        self.y += COMMENT_TOPIC_ADVANCE;

        for line in comment_lines(&comment.body, content_width) {
            self.ensure_space(COMMENT_LINE, limit);
            let y = self.y;
            self.text(
                margin + 12.0,
                y,
                &line,
                COMMENT_SIZE,
                FontStyle::Regular,
                Color::BODY,
                Align::Left,
            );
            self.y += COMMENT_LINE;
        }

        self.ensure_space(COMMENT_FOOTER_ADVANCE, limit);
        let y = self.y;
        self.text(
            margin + 12.0,
            y,
            &comment.byline,
            BYLINE_SIZE,
            FontStyle::Regular,
            Color::CAPTION,
            Align::Left,
        );
        self.y += COMMENT_FOOTER_ADVANCE;
    }

    fn place_image(&mut self, content: &ImageContent) {
        let raster = match content {
            ImageContent::Raster(raster) => raster,
            ImageContent::Unavailable => return self.placeholder("(Image could not be loaded)"),
            ImageContent::Missing => return self.placeholder("(No image available)"),
        };

        let Some(image) = self.embed(raster) else {
            return self.placeholder("(Image could not be loaded)");
        };

        let margin = self.geometry.margin;
        self.ensure_space(image_height(content), self.geometry.image_limit);
        let y = self.y;
        self.text(
            margin + 6.0,
            y,
            "Annotated Image with Detections:",
            BODY_SIZE,
            FontStyle::Bold,
            Color::BODY,
            Align::Left,
        );
        self.y += IMAGE_TITLE_ADVANCE;

        let x = margin + (self.geometry.content_width() - IMAGE_WIDTH) / 2.0;
        let y = self.y;
        self.push(DrawOp::Image {
            x,
            y,
            width: IMAGE_WIDTH,
            height: IMAGE_HEIGHT,
            image,
        });
        self.frame(x, y, IMAGE_WIDTH, IMAGE_HEIGHT, Color::FRAME, THIN);
        self.y += IMAGE_HEIGHT + IMAGE_TRAILER;
    }

    fn placeholder(&mut self, message: &str) {
        self.ensure_space(PLACEHOLDER_ADVANCE, self.geometry.limit);
        let y = self.y;
        self.text(
            self.geometry.margin + 5.0,
            y,
            message,
            BODY_SIZE,
            FontStyle::Regular,
            Color::PLACEHOLDER,
            Align::Left,
        );
        self.y += PLACEHOLDER_ADVANCE;
    }

    fn place_signatures(&mut self, pair: &SignaturePair) {
        let height = ReportBlock::SignaturePair(SignaturePair::default())
            .estimated_height(self.geometry.content_width());
        self.ensure_space(height, self.geometry.limit);

        self.section_bar("SIGNATURES");
        self.y += SIGNATURE_HEADER_ADVANCE;

        let y = self.y;
        let boxes = [
            (self.geometry.margin + 10.0, &pair.technician, "Technician Signature"),
            (self.geometry.width / 2.0 + 10.0, &pair.supervisor, "Supervisor Signature"),
        ];
        for (x, signature, caption) in boxes {
            self.frame(x, y, SIGNATURE_WIDTH, SIGNATURE_HEIGHT, Color::FRAME, THIN);
            if let Some(image) = signature.as_ref().and_then(|raster| self.embed(raster)) {
                self.push(DrawOp::Image {
                    x: x + 2.0,
                    y: y + 2.0,
                    width: SIGNATURE_WIDTH - 4.0,
                    height: SIGNATURE_HEIGHT - 4.0,
                    image,
                });
            }
            self.text(
                x + SIGNATURE_WIDTH / 2.0,
                y + SIGNATURE_HEIGHT + SIGNATURE_CAPTION_OFFSET,
                caption,
                BODY_SIZE,
                FontStyle::Bold,
                Color::BLACK,
                Align::Center,
            );
        }
        self.y += SIGNATURE_HEIGHT + SIGNATURE_CAPTION_OFFSET + SIGNATURE_TRAILER;
    }

    /// Decode and register an image, returning its index
    fn embed(&mut self, raster: &RasterImage) -> Option<usize> {
        match EmbeddedImage::decode(raster) {
            Ok(image) => {
                self.images.push(image);
                Some(self.images.len() - 1)
            }
            Err(e) => {
                tracing::warn!("Skipping image that could not be decoded: {}", e);
                None
            }
        }
    }
}
