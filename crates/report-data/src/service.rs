use async_trait::async_trait;
use shared_types::{
    Ack, Comment, Detection, Inspection, MaintenanceDraft, MaintenanceRecord, RasterImage,
    TransformerMetadata,
};

use crate::error::DataError;

/// Read access to transformer data plus the single write used on submit.
///
/// Implementations must be shareable across the aggregation fan-out tasks.
#[async_trait]
pub trait DataService: Send + Sync {
    /// Fails with [`DataError::NotFound`] when the transformer does not exist
    async fn get_transformer(&self, transformer_id: &str) -> Result<TransformerMetadata, DataError>;

    async fn get_maintenance_records(
        &self,
        transformer_id: &str,
    ) -> Result<Vec<MaintenanceRecord>, DataError>;

    async fn get_inspections(&self, transformer_id: &str) -> Result<Vec<Inspection>, DataError>;

    async fn get_detections(&self, inspection_id: &str) -> Result<Vec<Detection>, DataError>;

    async fn get_comments(&self, inspection_id: &str) -> Result<Vec<Comment>, DataError>;

    /// Encoded inspection image
    async fn get_image(&self, inspection_id: &str) -> Result<RasterImage, DataError>;

    /// Store a new maintenance record. Called once per user submission,
    /// never retried.
    async fn submit_maintenance_report(
        &self,
        transformer_id: &str,
        draft: &MaintenanceDraft,
    ) -> Result<Ack, DataError>;
}
