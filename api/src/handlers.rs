use crate::error::ApiError;
use crate::hackrx_request::HackRxRequest;
use crate::hackrx_response::{HackRxResponse, HealthResponse};
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use uuid::Uuid;

pub const SERVICE_NAME: &str = "HackRx LLM Query-Retrieval API";

/// `POST /hackrx/run`: download the document and answer every question
/// against it. Authentication has already happened in the route layer.
pub async fn run_query(
    State(state): State<AppState>,
    payload: Result<Json<HackRxRequest>, JsonRejection>,
) -> Result<Json<HackRxResponse>, ApiError> {
    let request_id = Uuid::new_v4();

    let Json(request) = payload.map_err(|rejection| {
        log::warn!("[{}] Rejected malformed body: {}", request_id, rejection.body_text());
        ApiError::BadRequest(rejection.body_text())
    })?;

    let documents = &request.documents;
    if !matches!(documents.scheme(), "http" | "https") || documents.host_str().is_none() {
        return Err(ApiError::BadRequest(format!(
            "documents must be an absolute http(s) URL, got {}",
            documents
        )));
    }

    log::info!(
        "[{}] Received {} questions for {}",
        request_id,
        request.questions.len(),
        documents
    );

    let answers = state
        .query_service
        .run(documents, &request.questions)
        .await
        .map_err(|e| {
            log::error!("[{}] Query failed: {}", request_id, e);
            ApiError::from(e)
        })?;

    log::info!("[{}] Returning {} answers", request_id, answers.len());
    Ok(Json(HackRxResponse { answers }))
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: SERVICE_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
