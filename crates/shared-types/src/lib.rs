//! Domain model shared by the report pipeline crates

pub mod draft;
pub mod raster;
pub mod report;
pub mod types;

pub use draft::{Ack, MaintenanceDraft};
pub use raster::{RasterImage, Signature, Signatures};
pub use report::{ImageSlot, ReportData};
pub use types::{
    Comment, Detection, Inspection, InspectionStatus, MaintenanceRecord, TransformerMetadata,
    TransformerStatus,
};
