//! API handlers for the report server
//!
//! Provides REST endpoints for:
//! - Report PDF generation
//! - Draft storage
//! - Maintenance report submission

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use report_data::{submit_draft, GeneratedReport, RecordSelection};
use serde::{Deserialize, Serialize};
use shared_types::{MaintenanceDraft, RasterImage, Signature, Signatures};
use tracing::{debug, info};

use crate::error::ServerError;
use crate::AppState;

/// Full router for the server
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        .route(
            "/api/v1/transformers/:id/report",
            get(handle_get_report).post(handle_post_report),
        )
        .route(
            "/api/v1/transformers/:id/draft",
            get(handle_get_draft).put(handle_put_draft),
        )
        .route(
            "/api/v1/transformers/:id/maintenance-report",
            post(handle_submit),
        )
        .with_state(state)
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Handler: GET /health
pub async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "report-server",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Deserialize, Default)]
pub struct ReportQuery {
    /// `blank`, `latest` or a record id
    pub record: Option<String>,
}

impl ReportQuery {
    fn selection(&self) -> Result<RecordSelection, ServerError> {
        self.record
            .as_deref()
            .map_or(Ok(RecordSelection::Blank), |s| s.parse())
            .map_err(ServerError::InvalidRequest)
    }
}

/// Base64 PNG captures; a `data:` URL prefix is accepted
#[derive(Deserialize, Default)]
pub struct SignaturePayload {
    pub technician: Option<String>,
    pub supervisor: Option<String>,
}

impl SignaturePayload {
    fn decode(&self) -> Result<Signatures, ServerError> {
        Ok(Signatures {
            technician: decode_signature(self.technician.as_deref(), "technician")?,
            supervisor: decode_signature(self.supervisor.as_deref(), "supervisor")?,
        })
    }
}

fn decode_signature(encoded: Option<&str>, role: &str) -> Result<Signature, ServerError> {
    let Some(encoded) = encoded.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(Signature::blank());
    };
    let data = match encoded.split_once(";base64,") {
        Some((_, data)) => data,
        None => encoded,
    };
    let bytes = STANDARD.decode(data).map_err(|e| {
        ServerError::InvalidRequest(format!("{} signature is not valid base64: {}", role, e))
    })?;
    Ok(Signature::from_image(RasterImage::new(bytes)))
}

/// Report request body
#[derive(Deserialize, Default)]
pub struct ReportRequest {
    /// Form values to print instead of the stored draft
    pub draft: Option<MaintenanceDraft>,
    pub signatures: Option<SignaturePayload>,
    pub record: Option<String>,
}

fn pdf_response(report: GeneratedReport) -> Response {
    (
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", report.filename),
            ),
        ],
        report.bytes,
    )
        .into_response()
}

/// Handler: GET /api/v1/transformers/:id/report
pub async fn handle_get_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ReportQuery>,
) -> Result<Response, ServerError> {
    let selection = query.selection()?;
    let stored = state.draft(&id).await;
    info!("Report request: transformer={}, selection={:?}", id, selection);

    let report = state
        .generator()
        .generate(&id, selection, stored.as_ref(), &Signatures::default())
        .await?;
    Ok(pdf_response(report))
}

/// Handler: POST /api/v1/transformers/:id/report
pub async fn handle_post_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ReportRequest>,
) -> Result<Response, ServerError> {
    let selection = ReportQuery { record: req.record }.selection()?;
    let signatures = req.signatures.unwrap_or_default().decode()?;
    let draft = match req.draft {
        Some(draft) => Some(draft),
        None => state.draft(&id).await,
    };
    info!(
        "Report request: transformer={}, signed={}/{}",
        id,
        !signatures.technician.is_empty(),
        !signatures.supervisor.is_empty()
    );

    let report = state
        .generator()
        .generate(&id, selection, draft.as_ref(), &signatures)
        .await?;
    Ok(pdf_response(report))
}

/// Handler: GET /api/v1/transformers/:id/draft
pub async fn handle_get_draft(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<MaintenanceDraft> {
    let draft = state
        .draft(&id)
        .await
        .unwrap_or_else(|| MaintenanceDraft::blank(&id));
    Json(draft)
}

/// Handler: PUT /api/v1/transformers/:id/draft
pub async fn handle_put_draft(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(mut draft): Json<MaintenanceDraft>,
) -> Json<MaintenanceDraft> {
    draft.transformer_number = id.clone();
    debug!("Storing draft for {}: {:?}", id, draft);
    state.drafts.write().await.insert(id, draft.clone());
    Json(draft)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub success: bool,
    pub record_id: Option<i64>,
}

/// Handler: POST /api/v1/transformers/:id/maintenance-report
///
/// The stored draft is cleared only once the backend accepted it.
pub async fn handle_submit(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SubmitResponse>, ServerError> {
    let draft = state
        .draft(&id)
        .await
        .ok_or_else(|| ServerError::InvalidRequest(format!("no draft stored for {}", id)))?;

    let ack = submit_draft(&state.service, &draft).await?;

    // Keep an edit that landed while the submission was in flight
    let mut drafts = state.drafts.write().await;
    if drafts.get(&id) == Some(&draft) {
        drafts.remove(&id);
    }

    Ok(Json(SubmitResponse {
        success: true,
        record_id: ack.record_id,
    }))
}
