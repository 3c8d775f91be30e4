//! Server-specific error types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::ingest::IngestError;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Ingestion error: {0}")]
    Ingest(#[from] IngestError),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Ingest(e) => match e {
                IngestError::RunInProgress => StatusCode::CONFLICT,
                IngestError::Upstream { .. } | IngestError::Http(_) => StatusCode::BAD_GATEWAY,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_message = match self {
            AppError::Ingest(IngestError::Database(ref e)) => {
                tracing::error!("Database error during ingestion: {:?}", e);
                "A database error occurred during ingestion".to_string()
            },
            AppError::Ingest(ref e) => {
                if status.is_server_error() {
                    tracing::error!("Ingestion error: {}", e);
                }
                e.to_string()
            },
            AppError::Validation(ref message) => message.clone(),
        };

        let body = Json(json!({
            "error": {
                "message": error_message,
                "status": status.as_u16(),
            }
        }));

        (status, body).into_response()
    }
}
