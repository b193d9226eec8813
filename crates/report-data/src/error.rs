use report_core::ReportError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Failed to decode {what}: {message}")]
    Decode { what: String, message: String },

    #[error("Invalid service URL: {0}")]
    InvalidUrl(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to submit maintenance report: {0}")]
    SubmissionFailed(String),

    #[error("Report rendering failed: {0}")]
    Render(#[from] ReportError),
}

impl DataError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, DataError::NotFound(_))
    }
}
