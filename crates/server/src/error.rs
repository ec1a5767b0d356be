//! Unified error handling for the HTTP surface.
//!
//! Route handlers return `Result<T, AppError>`; the `IntoResponse`
//! implementation is the single place where pipeline errors become
//! transport-facing status codes.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::catalog::CatalogError;
use crate::ingest::IngestError;

/// Application-level error type for the server.
#[derive(Debug, Error)]
pub enum AppError {
    /// A stage of the ingestion pipeline failed.
    #[error(transparent)]
    Ingest(#[from] IngestError),

    /// The request body could not be read (bad multipart, malformed JSON).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Response envelope shared with the legacy partner API: `Status` is `true`
/// on success and `false` on failure, with the failure text under `Error`.
#[derive(Debug, Serialize)]
pub struct StatusBody {
    #[serde(rename = "Status")]
    pub status: bool,
    #[serde(rename = "Error", skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StatusBody {
    /// A failure envelope with the given message.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: false,
            error: Some(message.into()),
        }
    }
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Ingest(err) => match err {
                IngestError::MissingSource
                | IngestError::InvalidUrl(_)
                | IngestError::UnrecognizedFormat(_)
                | IngestError::InvalidFormat(_)
                | IngestError::Validation(_) => StatusCode::BAD_REQUEST,
                IngestError::Fetch(_) => StatusCode::NOT_FOUND,
                IngestError::NotShopAccount => StatusCode::FORBIDDEN,
                IngestError::Catalog(CatalogError::ShopNotOwned) => StatusCode::FORBIDDEN,
                IngestError::Catalog(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        // Don't expose storage internals to clients.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            "internal server error".to_owned()
        } else {
            self.to_string()
        };

        (status, Json(StatusBody::error(message))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
