//! End-to-end report generation and draft submission

use std::sync::Arc;

use report_core::{render_pdf, report_filename, Document, ReportComposer};
use shared_types::{Ack, MaintenanceDraft, ReportData, Signatures};

use crate::aggregate::{Aggregator, RecordSelection};
use crate::error::DataError;
use crate::service::DataService;

/// A rendered report ready to be downloaded or written to disk
#[derive(Debug, Clone)]
pub struct GeneratedReport {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub page_count: usize,
}

#[derive(Clone)]
pub struct ReportGenerator {
    aggregator: Aggregator,
    composer: ReportComposer,
}

impl ReportGenerator {
    pub fn new(aggregator: Aggregator, composer: ReportComposer) -> Self {
        Self {
            aggregator,
            composer,
        }
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    /// Aggregate fresh data and render it.
    ///
    /// `draft` replaces the form values picked by `selection` when given.
    pub async fn generate(
        &self,
        transformer_id: &str,
        selection: RecordSelection,
        draft: Option<&MaintenanceDraft>,
        signatures: &Signatures,
    ) -> Result<GeneratedReport, DataError> {
        let data = self
            .aggregator
            .aggregate_with(transformer_id, selection)
            .await?;
        let draft = draft.unwrap_or(&data.draft);
        self.render(&data, draft, signatures)
    }

    pub fn compose(
        &self,
        data: &ReportData,
        draft: &MaintenanceDraft,
        signatures: &Signatures,
    ) -> Document {
        self.composer.compose(data, draft, signatures)
    }

    pub fn render(
        &self,
        data: &ReportData,
        draft: &MaintenanceDraft,
        signatures: &Signatures,
    ) -> Result<GeneratedReport, DataError> {
        let document = self.compose(data, draft, signatures);
        let bytes = render_pdf(&document, &self.composer.options().geometry)?;
        let filename = report_filename(
            &data.transformer.transformer_number,
            chrono::Utc::now().timestamp_millis(),
        );

        tracing::info!(
            "Generated {} ({} page(s), {} bytes)",
            filename,
            document.page_count(),
            bytes.len()
        );

        Ok(GeneratedReport {
            filename,
            bytes,
            page_count: document.page_count(),
        })
    }
}

/// Store `draft` as a new maintenance record.
///
/// A single attempt. The draft is only borrowed so the caller still holds it
/// when the submission fails.
pub async fn submit_draft(
    service: &Arc<dyn DataService>,
    draft: &MaintenanceDraft,
) -> Result<Ack, DataError> {
    match service
        .submit_maintenance_report(&draft.transformer_number, draft)
        .await
    {
        Ok(ack) => {
            tracing::info!(
                "Stored maintenance record {:?} for {}",
                ack.record_id,
                draft.transformer_number
            );
            Ok(ack)
        }
        Err(e) => {
            tracing::warn!(
                "Maintenance report for {} was not stored: {}",
                draft.transformer_number,
                e
            );
            Err(match e {
                DataError::SubmissionFailed(_) => e,
                other => DataError::SubmissionFailed(other.to_string()),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServiceConfig;
    use crate::memory::{Fetch, InMemoryDataService};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use report_core::ComposeOptions;

    fn generator(service: InMemoryDataService) -> ReportGenerator {
        let aggregator = Aggregator::new(Arc::new(service), &ServiceConfig::default());
        let options = ComposeOptions::new(NaiveDate::from_ymd_opt(2025, 8, 1).unwrap());
        ReportGenerator::new(aggregator, ReportComposer::new(options))
    }

    #[tokio::test]
    async fn test_generates_pdf_for_sample_transformer() {
        let report = generator(InMemoryDataService::sample())
            .generate(
                "AZ-8890",
                RecordSelection::Latest,
                None,
                &Signatures::default(),
            )
            .await
            .unwrap();

        assert!(report.bytes.starts_with(b"%PDF-"));
        assert!(report.filename.starts_with("maintenance-report-AZ-8890-"));
        assert!(report.filename.ends_with(".pdf"));
        assert!(report.page_count >= 1);

        let parsed = lopdf::Document::load_mem(&report.bytes).unwrap();
        assert_eq!(parsed.get_pages().len(), report.page_count);
    }

    #[tokio::test]
    async fn test_unknown_transformer_produces_no_document() {
        let err = generator(InMemoryDataService::sample())
            .generate("T404", RecordSelection::Blank, None, &Signatures::default())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_image_renders_placeholder() {
        let service = InMemoryDataService::sample().with_stalled_image("INS-0001");
        let generator = generator(service);

        let data = generator.aggregator().aggregate("AZ-8890").await.unwrap();
        let document = generator.compose(&data, &data.draft, &Signatures::default());

        assert!(document.contains_text("(Image could not be loaded)"));
        // INS-0002 has no image at all
        assert!(document.contains_text("(No image available)"));
        assert!(document.images.is_empty());
    }

    #[tokio::test]
    async fn test_explicit_draft_overrides_selection() {
        let generator = generator(InMemoryDataService::sample());
        let data = generator
            .aggregator()
            .aggregate_with("AZ-8890", RecordSelection::Latest)
            .await
            .unwrap();
        assert_eq!(data.draft.inspector_name, "N. Perera");

        let mut draft = MaintenanceDraft::blank("AZ-8890");
        draft.inspector_name = "R. Jayasuriya".into();
        let document = generator.compose(&data, &draft, &Signatures::default());

        assert!(document.contains_text("R. Jayasuriya"));
        assert!(!document.contains_text("N. Perera"));
    }

    #[tokio::test]
    async fn test_failed_submission_keeps_the_draft() {
        let service = InMemoryDataService::sample().with_failure(Fetch::Submit);
        let shared: Arc<dyn DataService> = Arc::new(service.clone());

        let mut draft = MaintenanceDraft::blank("AZ-8890");
        draft.inspector_name = "A. Silva".into();
        draft.recommended_action = "Replace fuse".into();
        let before = draft.clone();

        let err = submit_draft(&shared, &draft).await.unwrap_err();
        assert!(matches!(err, DataError::SubmissionFailed(_)));
        assert_eq!(draft, before);
        assert!(service.submissions().is_empty());
    }

    #[tokio::test]
    async fn test_submission_stores_the_draft() {
        let service = InMemoryDataService::sample();
        let shared: Arc<dyn DataService> = Arc::new(service.clone());
        let draft = MaintenanceDraft::blank("AZ-8890");

        let ack = submit_draft(&shared, &draft).await.unwrap();
        assert_eq!(ack.record_id, Some(2));
        assert_eq!(service.submissions(), vec![("AZ-8890".to_string(), draft)]);
    }
}
