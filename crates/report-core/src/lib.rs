//! Report rendering: detection annotation, block layout and PDF output
//!
//! Everything here is pure and synchronous. Fetching report data lives in
//! `report-data`.

pub mod annotate;
pub mod compose;
pub mod error;
pub mod layout;
pub mod pdf;

pub use annotate::{annotate, BoxGeometry, Severity};
pub use compose::{ComposeOptions, ReportComposer};
pub use error::ReportError;
pub use layout::{Document, LayoutEngine, PageGeometry, ReportBlock};
pub use pdf::render_pdf;

/// Default download name for a generated report
pub fn report_filename(transformer_number: &str, epoch_millis: i64) -> String {
    format!(
        "maintenance-report-{}-{}.pdf",
        transformer_number, epoch_millis
    )
}
