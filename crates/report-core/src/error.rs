use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to decode image: {0}")]
    ImageDecode(String),

    #[error("Failed to encode image: {0}")]
    ImageEncode(String),

    #[error("PDF encoding failed: {0}")]
    PdfError(String),
}

impl From<image::ImageError> for ReportError {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::Encoding(e) => ReportError::ImageEncode(e.to_string()),
            other => ReportError::ImageDecode(other.to_string()),
        }
    }
}
