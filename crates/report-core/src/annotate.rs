//! Draw detection boxes and labels onto inspection images
//!
//! Annotation is best-effort: any decode or encode failure hands back the
//! original image unchanged.

use std::io::Cursor;
use std::sync::OnceLock;

use ab_glyph::{FontRef, PxScale};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use shared_types::{Detection, RasterImage};

use crate::error::ReportError;

/// Box outline width in pixels
pub const STROKE_WIDTH: i32 = 3;
/// Height of the filled label tab above each box
pub const LABEL_HEIGHT: u32 = 25;
/// Horizontal padding added to the rendered label width
pub const LABEL_PADDING: u32 = 10;

const LABEL_SCALE: f32 = 16.0;
const LABEL_INSET: i64 = 5;
const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

static LABEL_FONT: OnceLock<Option<FontRef<'static>>> = OnceLock::new();

/// First embedded font that parses, loaded once per process
fn label_font() -> Option<&'static FontRef<'static>> {
    LABEL_FONT
        .get_or_init(|| {
            let font = typst_assets::fonts().find_map(|data| FontRef::try_from_slice(data).ok());
            if font.is_none() {
                tracing::warn!("No embedded font available, detection labels will be blank");
            }
            font
        })
        .as_ref()
}

/// Severity bucket derived from a detection's class code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Potentially faulty (`pf`)
    Critical,
    /// Faulty (`f`)
    Fault,
    Normal,
}

impl Severity {
    /// Total over all strings: anything unrecognised is `Normal`
    pub fn classify(code: &str) -> Self {
        match code.trim().to_ascii_lowercase().as_str() {
            "pf" => Severity::Critical,
            "f" => Severity::Fault,
            _ => Severity::Normal,
        }
    }

    /// Colour follows the class code only; a missing code is `Normal`
    pub fn of(detection: &Detection) -> Self {
        Self::classify(detection.class_name.as_deref().unwrap_or(""))
    }

    pub fn color(self) -> Rgba<u8> {
        match self {
            Severity::Critical => Rgba([255, 0, 0, 255]),
            Severity::Fault => Rgba([255, 165, 0, 255]),
            Severity::Normal => Rgba([50, 205, 50, 255]),
        }
    }
}

/// Top-left anchored box in image pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxGeometry {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl BoxGeometry {
    /// Convert the center/size box reported by the detector
    pub fn from_detection(detection: &Detection) -> Self {
        Self {
            left: detection.x - detection.width / 2.0,
            top: detection.y - detection.height / 2.0,
            width: detection.width,
            height: detection.height,
        }
    }
}

/// Return a copy of `image` with every detection outlined and labelled.
///
/// The input buffer is never modified. Output is PNG encoded.
pub fn annotate(image: &RasterImage, detections: &[Detection]) -> RasterImage {
    if detections.is_empty() {
        return image.clone();
    }

    match try_annotate(image, detections) {
        Ok(annotated) => annotated,
        Err(e) => {
            tracing::warn!("Annotation failed, using original image: {}", e);
            image.clone()
        }
    }
}

fn try_annotate(image: &RasterImage, detections: &[Detection]) -> Result<RasterImage, ReportError> {
    let decoded = image::load_from_memory(image.as_bytes())?;
    let mut canvas = decoded.to_rgba8();
    let font = label_font();

    for detection in detections {
        draw_detection(&mut canvas, detection, font);
    }

    let mut buffer = Vec::new();
    DynamicImage::ImageRgba8(canvas).write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)?;
    Ok(RasterImage::new(buffer))
}

fn draw_detection(canvas: &mut RgbaImage, detection: &Detection, font: Option<&FontRef<'static>>) {
    let geometry = BoxGeometry::from_detection(detection);
    if ![geometry.left, geometry.top, geometry.width, geometry.height]
        .iter()
        .all(|v| v.is_finite())
    {
        tracing::debug!("Skipping detection with non-finite geometry: {:?}", geometry);
        return;
    }

    let color = Severity::of(detection).color();
    let label = detection.label();
    let scale = PxScale::from(LABEL_SCALE);
    let text_width = match font {
        Some(font) => text_size(scale, font, label).0,
        None => label.chars().count() as u32 * 9,
    };
    let label_width = i64::from(text_width) + i64::from(LABEL_PADDING);

    // Past this margin every stroke, tab and glyph is off the canvas, so
    // clamping there keeps the pixel math small without moving anything visible
    let margin = (label_width + i64::from(LABEL_HEIGHT) + i64::from(STROKE_WIDTH) + 1) as f64;
    let (canvas_w, canvas_h) = (i64::from(canvas.width()), i64::from(canvas.height()));
    let px = |v: f64, extent: i64| v.round().clamp(-margin, extent as f64 + margin) as i64;

    let left = px(geometry.left, canvas_w);
    let top = px(geometry.top, canvas_h);
    let right = px(geometry.left.round() + geometry.width.round().max(1.0), canvas_w) - 1;
    let bottom = px(geometry.top.round() + geometry.height.round().max(1.0), canvas_h) - 1;

    // Stroke is centered on the box edge, like a canvas strokeRect
    let half = i64::from(STROKE_WIDTH / 2);
    let label_top = top - i64::from(LABEL_HEIGHT);
    let extent_right = (right + half).max(left + label_width - 1);
    if extent_right < 0 || bottom + half < 0 || left - half >= canvas_w || label_top >= canvas_h {
        return;
    }

    fill_clipped(canvas, left - half, top - half, left + half, bottom + half, color);
    fill_clipped(canvas, right - half, top - half, right + half, bottom + half, color);
    fill_clipped(canvas, left - half, top - half, right + half, top + half, color);
    fill_clipped(canvas, left - half, bottom - half, right + half, bottom + half, color);

    fill_clipped(canvas, left, label_top, left + label_width - 1, top - 1, color);

    if let (Some(font), Ok(x), Ok(y)) = (
        font,
        i32::try_from(left + LABEL_INSET),
        i32::try_from(label_top + 4),
    ) {
        draw_text_mut(canvas, WHITE, x, y, scale, font, label);
    }
}

/// Fill the inclusive pixel span `x0..=x1`, `y0..=y1`, clipped to the canvas
fn fill_clipped(canvas: &mut RgbaImage, x0: i64, y0: i64, x1: i64, y1: i64, color: Rgba<u8>) {
    let x0 = x0.max(0);
    let y0 = y0.max(0);
    let x1 = x1.min(i64::from(canvas.width()) - 1);
    let y1 = y1.min(i64::from(canvas.height()) - 1);
    if x0 > x1 || y0 > y1 {
        return;
    }
    let rect = Rect::at(x0 as i32, y0 as i32).of_size((x1 - x0 + 1) as u32, (y1 - y0 + 1) as u32);
    draw_filled_rect_mut(canvas, rect, color);
}
