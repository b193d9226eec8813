//! Owned raster buffers passed between the aggregation and rendering stages

use serde::{Deserialize, Serialize};

/// Encoded raster image (PNG or JPEG bytes)
///
/// Always an owned copy: nothing downstream holds a reference to the
/// surface the pixels came from.
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RasterImage {
    bytes: Vec<u8>,
}

impl RasterImage {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }
}

impl std::fmt::Debug for RasterImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterImage")
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl From<Vec<u8>> for RasterImage {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

/// Hand-drawn signature capture owned by the report being composed
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Signature {
    image: Option<RasterImage>,
}

impl Signature {
    /// A signature nobody has drawn on yet
    pub fn blank() -> Self {
        Self { image: None }
    }

    pub fn from_image(image: RasterImage) -> Self {
        if image.is_empty() {
            return Self::blank();
        }
        Self { image: Some(image) }
    }

    pub fn image(&self) -> Option<&RasterImage> {
        self.image.as_ref()
    }

    /// True when no strokes were captured
    pub fn is_empty(&self) -> bool {
        self.image.is_none()
    }
}

/// The two signature boxes printed at the end of every report
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signatures {
    pub technician: Signature,
    pub supervisor: Signature,
}
