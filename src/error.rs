use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::sheets::SinkError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid JSON body: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Request body must be a JSON object")]
    NotAnObject,

    #[error(transparent)]
    Sink(#[from] SinkError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Every per-request failure is terminal and reported verbatim.
        let message = self.to_string();
        match &self {
            AppError::Sink(e) => tracing::error!(error = %e, "Failed to append row"),
            _ => tracing::error!(error = %message, "Rejected request body"),
        }

        let body = json!({ "error": message });
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
