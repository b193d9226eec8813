//! Paginated document model and the cursor-based layout engine
//!
//! All coordinates are millimetres from the top-left corner of the page.
//! Text positions are baselines.

mod block;
mod engine;
pub mod metrics;
mod wrap;

pub use block::{CommentEntry, ImageContent, InspectionEntry, KeyValue, ReportBlock, SignaturePair};
pub use engine::{LayoutEngine, Span};
pub use wrap::wrap_text;

use shared_types::RasterImage;

use crate::error::ReportError;

/// RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color(pub u8, pub u8, pub u8);

impl Color {
    pub const BLACK: Color = Color(0, 0, 0);
    pub const WHITE: Color = Color(255, 255, 255);
    pub const BRAND: Color = Color(41, 128, 185);
    pub const PAGE_BORDER: Color = Color(200, 200, 200);
    pub const SECTION_FILL: Color = Color(240, 240, 240);
    pub const BODY: Color = Color(60, 60, 60);
    pub const MUTED: Color = Color(100, 100, 100);
    pub const CAPTION: Color = Color(120, 120, 120);
    pub const PLACEHOLDER: Color = Color(150, 150, 150);
    pub const FRAME: Color = Color(180, 180, 180);
    pub const ALERT: Color = Color(200, 0, 0);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FontStyle {
    #[default]
    Regular,
    Bold,
    Italic,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub color: Color,
    pub width: f64,
}

/// One drawing instruction on a page
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        fill: Option<Color>,
        stroke: Option<Stroke>,
    },
    Text {
        x: f64,
        y: f64,
        text: String,
        size: f64,
        style: FontStyle,
        color: Color,
    },
    /// `image` indexes into [`Document::images`]
    Image {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        image: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Page {
    pub ops: Vec<DrawOp>,
}

impl Page {
    /// Text runs in drawing order
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

/// Decoded 8-bit RGB pixels ready for embedding
#[derive(Clone, PartialEq, Eq)]
pub struct EmbeddedImage {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

impl EmbeddedImage {
    /// Decode a PNG/JPEG buffer, flattening any alpha channel onto white
    pub fn decode(raster: &RasterImage) -> Result<Self, ReportError> {
        let decoded = image::load_from_memory(raster.as_bytes())?.to_rgba8();
        let (width, height) = decoded.dimensions();

        let mut rgb = Vec::with_capacity(width as usize * height as usize * 3);
        for pixel in decoded.pixels() {
            let [r, g, b, a] = pixel.0;
            let alpha = a as u32;
            for channel in [r, g, b] {
                let blended = (channel as u32 * alpha + 255 * (255 - alpha)) / 255;
                rgb.push(blended as u8);
            }
        }

        Ok(Self { width, height, rgb })
    }
}

impl std::fmt::Debug for EmbeddedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddedImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

/// Laid-out report, independent of the output encoding
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    pub pages: Vec<Page>,
    pub images: Vec<EmbeddedImage>,
}

impl Document {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Every text run of every page, in order
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.pages.iter().flat_map(Page::texts)
    }

    pub fn contains_text(&self, needle: &str) -> bool {
        self.texts().any(|t| t.contains(needle))
    }
}

/// Page size and pagination thresholds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width: f64,
    pub height: f64,
    pub margin: f64,
    /// Cursor position at the start of every page
    pub top: f64,
    /// Content may not extend past this y
    pub limit: f64,
    /// Tighter limit for image units
    pub image_limit: f64,
    pub border_inset: f64,
}

impl PageGeometry {
    /// A4 portrait
    pub const A4: PageGeometry = PageGeometry {
        width: 210.0,
        height: 297.0,
        margin: 15.0,
        top: 15.0,
        limit: 255.0,
        image_limit: 237.0,
        border_inset: 10.0,
    };

    pub fn content_width(&self) -> f64 {
        self.width - 2.0 * self.margin
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::A4
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    #[test]
    fn test_decode_flattens_transparency_onto_white() {
        let mut img = RgbaImage::from_pixel(2, 1, Rgba([0, 0, 0, 0]));
        img.put_pixel(1, 0, Rgba([10, 20, 30, 255]));
        let mut buffer = Vec::new();
        DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .unwrap();

        let embedded = EmbeddedImage::decode(&RasterImage::new(buffer)).unwrap();
        assert_eq!(embedded.width, 2);
        assert_eq!(embedded.height, 1);
        assert_eq!(embedded.rgb, vec![255, 255, 255, 10, 20, 30]);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let result = EmbeddedImage::decode(&RasterImage::new(vec![0, 1, 2, 3]));
        assert!(matches!(result, Err(ReportError::ImageDecode(_))));
    }

    #[test]
    fn test_a4_content_width() {
        assert_eq!(PageGeometry::A4.content_width(), 180.0);
    }
}
