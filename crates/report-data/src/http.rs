//! [`DataService`] backed by the maintenance backend's REST API

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use shared_types::{
    Ack, Comment, Detection, Inspection, MaintenanceDraft, MaintenanceRecord, RasterImage,
    TransformerMetadata,
};

use crate::config::ServiceConfig;
use crate::error::DataError;
use crate::service::DataService;

pub struct HttpDataService {
    client: Client,
    base_url: Url,
}

impl HttpDataService {
    pub fn new(config: &ServiceConfig) -> Result<Self, DataError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| DataError::InvalidUrl(format!("{}: {}", config.base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(DataError::InvalidUrl(config.base_url.clone()));
        }

        let client = Client::builder().timeout(config.request_timeout).build()?;

        Ok(Self { client, base_url })
    }

    /// `{base}/api/v1/{segments...}`, with each segment percent-encoded
    fn endpoint(&self, segments: &[&str]) -> Result<Url, DataError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| DataError::InvalidUrl(self.base_url.to_string()))?;
            path.pop_if_empty().extend(["api", "v1"]).extend(segments);
        }
        Ok(url)
    }

    async fn send_get(&self, url: Url) -> Result<Response, DataError> {
        tracing::debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        check_status(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str], what: &str) -> Result<T, DataError> {
        let response = self.send_get(self.endpoint(segments)?).await?;
        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| DataError::Decode {
            what: what.to_string(),
            message: e.to_string(),
        })
    }
}

fn check_status(response: Response) -> Result<Response, DataError> {
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Err(DataError::NotFound(response.url().path().to_string()));
    }
    if !status.is_success() {
        return Err(DataError::Status {
            status: status.as_u16(),
            url: response.url().to_string(),
        });
    }
    Ok(response)
}

/// The backend answers a submit with either the stored record or a wrapper
/// holding it
fn ack_from_body(body: &[u8]) -> Ack {
    let value: serde_json::Value = match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(_) => return Ack::default(),
    };
    let record_id = value
        .get("maintenanceRecord")
        .unwrap_or(&value)
        .get("id")
        .and_then(serde_json::Value::as_i64);
    Ack { record_id }
}

#[async_trait]
impl DataService for HttpDataService {
    async fn get_transformer(&self, transformer_id: &str) -> Result<TransformerMetadata, DataError> {
        self.get_json(&["transformers", transformer_id], "transformer")
            .await
            .map_err(|e| match e {
                DataError::NotFound(_) => DataError::NotFound(format!("transformer {}", transformer_id)),
                other => other,
            })
    }

    async fn get_maintenance_records(
        &self,
        transformer_id: &str,
    ) -> Result<Vec<MaintenanceRecord>, DataError> {
        self.get_json(
            &["transformers", transformer_id, "maintenance-report"],
            "maintenance records",
        )
        .await
    }

    async fn get_inspections(&self, transformer_id: &str) -> Result<Vec<Inspection>, DataError> {
        self.get_json(&["transformers", transformer_id, "inspections"], "inspections")
            .await
    }

    async fn get_detections(&self, inspection_id: &str) -> Result<Vec<Detection>, DataError> {
        self.get_json(&["inspections", inspection_id, "analyze"], "detections")
            .await
    }

    async fn get_comments(&self, inspection_id: &str) -> Result<Vec<Comment>, DataError> {
        self.get_json(&["inspections", inspection_id, "comments"], "comments")
            .await
    }

    async fn get_image(&self, inspection_id: &str) -> Result<RasterImage, DataError> {
        let url = self.endpoint(&["inspections", inspection_id, "image"])?;
        let response = self.send_get(url).await?;
        let bytes = response.bytes().await?;
        Ok(RasterImage::new(bytes.to_vec()))
    }

    async fn submit_maintenance_report(
        &self,
        transformer_id: &str,
        draft: &MaintenanceDraft,
    ) -> Result<Ack, DataError> {
        let url = self.endpoint(&["transformers", transformer_id, "maintenance-report"])?;
        tracing::info!("Submitting maintenance report for {}", transformer_id);

        let response = self
            .client
            .post(url)
            .json(draft)
            .send()
            .await
            .map_err(|e| DataError::SubmissionFailed(e.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| DataError::SubmissionFailed(e.to_string()))?;

        if !status.is_success() {
            let message = String::from_utf8_lossy(&body);
            return Err(DataError::SubmissionFailed(format!("{}: {}", status, message.trim())));
        }

        Ok(ack_from_body(&body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::Path,
        http::StatusCode as AxumStatus,
        routing::get,
        Json, Router,
    };
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use shared_types::InspectionStatus;

    async fn serve(router: Router) -> HttpDataService {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        HttpDataService::new(&ServiceConfig::new(format!("http://{}", addr))).unwrap()
    }

    fn backend() -> Router {
        Router::new()
            .route(
                "/api/v1/transformers/:id",
                get(|Path(id): Path<String>| async move {
                    if id == "T1" {
                        Ok(Json(json!({
                            "transformerNumber": "T1",
                            "poleNumber": "P-7",
                            "region": "Central",
                            "type": "Bulk"
                        })))
                    } else {
                        Err(AxumStatus::NOT_FOUND)
                    }
                }),
            )
            .route(
                "/api/v1/transformers/:id/inspections",
                get(|| async {
                    Json(json!([
                        {"inspectionNumber": "INS 1", "transformerNumber": "T1", "status": "Completed"}
                    ]))
                }),
            )
            .route(
                "/api/v1/inspections/:id/analyze",
                get(|Path(id): Path<String>| async move {
                    Json(json!([{
                        "detectId": 5,
                        "inspectionNumber": id,
                        "className": "pf",
                        "confidence": 0.91,
                        "x": 10.0, "y": 20.0, "width": 4.0, "height": 6.0
                    }]))
                }),
            )
            .route(
                "/api/v1/inspections/:id/comments",
                get(|| async { AxumStatus::INTERNAL_SERVER_ERROR }),
            )
            .route(
                "/api/v1/inspections/:id/image",
                get(|| async { vec![0x89u8, b'P', b'N', b'G'] }),
            )
            .route(
                "/api/v1/transformers/:id/maintenance-report",
                get(|| async {
                    Json(json!([{
                        "id": 7,
                        "inspectorName": "N. Perera",
                        "transformerStatus": null,
                        "voltage": 230.5,
                        "current": null,
                        "recommendedAction": null,
                        "additionalRemarks": "Oil level low",
                        "otherNotes": null,
                        "inspections": [{"inspectionNumber": "INS 1", "status": null}]
                    }]))
                })
                .post(
                    |Json(body): Json<serde_json::Value>| async move {
                        if body["inspectorName"] == "reject" {
                            Err((AxumStatus::BAD_REQUEST, "inspector rejected"))
                        } else {
                            Ok(Json(json!({"maintenanceRecord": {"id": 42}, "inspections": []})))
                        }
                    },
                ),
            )
    }

    #[test]
    fn test_endpoint_encodes_segments() {
        let service = HttpDataService::new(&ServiceConfig::new("http://backend:8080/")).unwrap();
        let url = service.endpoint(&["inspections", "INS 1/a", "image"]).unwrap();
        assert_eq!(
            url.as_str(),
            "http://backend:8080/api/v1/inspections/INS%201%2Fa/image"
        );
    }

    #[test]
    fn test_rejects_unusable_base_url() {
        let result = HttpDataService::new(&ServiceConfig::new("not a url"));
        assert!(matches!(result, Err(DataError::InvalidUrl(_))));
        let result = HttpDataService::new(&ServiceConfig::new("mailto:ops@example.com"));
        assert!(matches!(result, Err(DataError::InvalidUrl(_))));
    }

    #[test]
    fn test_ack_accepts_wrapper_or_record() {
        assert_eq!(ack_from_body(br#"{"maintenanceRecord":{"id":3}}"#).record_id, Some(3));
        assert_eq!(ack_from_body(br#"{"id":8}"#).record_id, Some(8));
        assert_eq!(ack_from_body(b"ok").record_id, None);
    }

    #[tokio::test]
    async fn test_fetches_transformer_and_inspections() {
        let service = serve(backend()).await;

        let transformer = service.get_transformer("T1").await.unwrap();
        assert_eq!(transformer.pole_number.as_deref(), Some("P-7"));
        assert_eq!(transformer.kind.as_deref(), Some("Bulk"));

        let inspections = service.get_inspections("T1").await.unwrap();
        assert_eq!(inspections.len(), 1);
        assert_eq!(inspections[0].inspection_number, "INS 1");
        assert_eq!(inspections[0].status, InspectionStatus::Completed);

        let detections = service.get_detections("INS 1").await.unwrap();
        assert_eq!(detections[0].inspection_number, "INS 1");
        assert_eq!(detections[0].id, Some(5));
    }

    #[tokio::test]
    async fn test_missing_transformer_is_not_found() {
        let service = serve(backend()).await;
        let err = service.get_transformer("T404").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_server_error_maps_to_status() {
        let service = serve(backend()).await;
        let err = service.get_comments("INS 1").await.unwrap_err();
        assert!(matches!(err, DataError::Status { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_image_returns_raw_bytes() {
        let service = serve(backend()).await;
        let image = service.get_image("INS 1").await.unwrap();
        assert_eq!(image.as_bytes(), &[0x89, b'P', b'N', b'G']);
    }

    #[tokio::test]
    async fn test_records_with_null_columns_are_kept() {
        let service = serve(backend()).await;
        let records = service.get_maintenance_records("T1").await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, Some(7));
        assert_eq!(records[0].inspector_name, "N. Perera");
        assert_eq!(records[0].recommended_action, "");
        assert_eq!(records[0].inspection_numbers, vec!["INS 1"]);
    }

    #[tokio::test]
    async fn test_submit_reports_record_id_or_failure() {
        let service = serve(backend()).await;

        let mut draft = MaintenanceDraft::blank("T1");
        draft.inspector_name = "A. Silva".into();
        let ack = service.submit_maintenance_report("T1", &draft).await.unwrap();
        assert_eq!(ack.record_id, Some(42));

        draft.inspector_name = "reject".into();
        let err = service.submit_maintenance_report("T1", &draft).await.unwrap_err();
        match err {
            DataError::SubmissionFailed(message) => assert!(message.contains("inspector rejected")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
