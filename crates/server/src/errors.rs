use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use extraction::ExtractionError;
use llm::LlmError;
use log::error;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;
use verification::VerificationError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Session {0} not found")]
    SessionNotFound(Uuid),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unprocessable(String),

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Verification(#[from] VerificationError),

    #[error("Internal error: {0:#}")]
    Internal(#[from] anyhow::Error),
}

fn llm_status(error: &LlmError) -> StatusCode {
    match error {
        LlmError::Connection(_) => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::BAD_GATEWAY,
    }
}

fn extraction_status(error: &ExtractionError) -> StatusCode {
    match error {
        ExtractionError::NoText => StatusCode::UNPROCESSABLE_ENTITY,
        ExtractionError::Llm(inner) => llm_status(inner),
        ExtractionError::Shape(_) => StatusCode::BAD_GATEWAY,
    }
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Llm(inner) => llm_status(inner),
            ApiError::Extraction(inner) => extraction_status(inner),
            ApiError::Verification(inner) => match inner {
                VerificationError::UnknownField(_) => StatusCode::BAD_REQUEST,
                VerificationError::NoText | VerificationError::Document(_) => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                VerificationError::Extraction(inner) => extraction_status(inner),
            },
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
