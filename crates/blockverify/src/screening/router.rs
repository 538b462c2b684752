use std::io::Cursor;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::batch::{BatchScreener, DEFAULT_BATCH_INSTITUTION};
use super::domain::CertificateSubmission;
use super::service::ScreeningService;

/// Batch payload: the CSV text plus an optional institution for rows that
/// leave it blank.
#[derive(Debug, Deserialize)]
pub struct BatchScreeningRequest {
    pub csv: String,
    #[serde(default)]
    pub default_institution: Option<String>,
}

/// Router builder exposing HTTP endpoints for certificate screening.
pub fn screening_router(service: Arc<ScreeningService>) -> Router {
    Router::new()
        .route("/api/v1/screening/certificates", post(screen_handler))
        .route("/api/v1/screening/batch", post(batch_handler))
        .route("/api/v1/screening/statistics", get(statistics_handler))
        .with_state(service)
}

pub(crate) async fn screen_handler(
    State(service): State<Arc<ScreeningService>>,
    axum::Json(submission): axum::Json<CertificateSubmission>,
) -> Response {
    let report = service.screen(&submission);
    (StatusCode::OK, axum::Json(report)).into_response()
}

pub(crate) async fn batch_handler(
    State(service): State<Arc<ScreeningService>>,
    axum::Json(request): axum::Json<BatchScreeningRequest>,
) -> Response {
    let institution = request
        .default_institution
        .as_deref()
        .unwrap_or(DEFAULT_BATCH_INSTITUTION);
    let reader = Cursor::new(request.csv.into_bytes());

    match BatchScreener::from_reader(&service, reader, institution) {
        Ok(report) => (StatusCode::OK, axum::Json(report)).into_response(),
        Err(error) => {
            let payload = json!({
                "error": error.to_string(),
            });
            (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn statistics_handler(State(service): State<Arc<ScreeningService>>) -> Response {
    (StatusCode::OK, axum::Json(service.statistics())).into_response()
}
