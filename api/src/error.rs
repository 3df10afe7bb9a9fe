use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use hackrx_engine::QueryError;
use serde::Serialize;
use thiserror::Error;

pub const UNAUTHORIZED_DETAIL: &str = "Invalid or missing authorization token";
const INTERNAL_DETAIL: &str = "An unexpected error occurred while processing the request.";

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub detail: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{}", UNAUTHORIZED_DETAIL)]
    Unauthorized,

    #[error("{0}")]
    BadRequest(String),

    /// The message is for server-side logs; callers only see a generic detail.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        if err.is_document_error() {
            ApiError::BadRequest(format!("Failed to download document: {}", err))
        } else {
            ApiError::Internal(err.to_string())
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match self {
            ApiError::Internal(_) => INTERNAL_DETAIL.to_string(),
            other => other.to_string(),
        };

        (status, Json(ErrorBody { detail })).into_response()
    }
}
