//! HTTP layer: route registration, request extraction and error rendering.
//!
//! Handlers return [`crate::Result<Response>`]. Any [`Error`] they raise is
//! turned into a JSON body of the form
//!
//! ```json
//! { "error": "validation_error", "description": "sex: must be one of ..." }
//! ```
//!
//! with a status code chosen by the error kind.

pub mod app_routes;
pub mod attributes;
pub mod docs;
pub mod extractor;
pub mod format;
pub mod monitoring;
pub mod query;
mod routes;

use std::fmt;

pub use app_routes::{AppRoutes, ListRoutes};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
pub use routes::{Handler, Routes};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Error;

/// Public error body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetail {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Value>,
}

impl ErrorDetail {
    /// Create a new `ErrorDetail` with the specified error and description.
    #[must_use]
    pub fn new<T: Into<String> + AsRef<str>>(error: T, description: T) -> Self {
        Self {
            error: Some(error.into()),
            description: Some(description.into()),
            errors: None,
        }
    }
}

impl fmt::Display for ErrorDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.error, &self.description) {
            (_, Some(description)) => f.write_str(description),
            (Some(error), None) => f.write_str(error),
            (None, None) => f.write_str("error"),
        }
    }
}

impl IntoResponse for Error {
    /// Convert an `Error` into an HTTP response.
    #[allow(clippy::cognitive_complexity)]
    fn into_response(self) -> Response {
        match &self {
            Self::Validation(_) | Self::NotFound => {
                tracing::debug!(error.msg = %self, "client error");
            }
            Self::Graph(err) if err.status().is_client_error() => {
                tracing::warn!(error.msg = %self, error.details = ?self, "graph store rejected the query");
            }
            _ => {
                tracing::error!(error.msg = %self, error.details = ?self, "controller_error");
            }
        }

        let (status, detail) = match self {
            Self::NotFound => (
                StatusCode::NOT_FOUND,
                ErrorDetail::new("not_found", "Resource was not found"),
            ),
            Self::Validation(err) => {
                let issues = err.issues();
                let errors = (!issues.is_empty())
                    .then(|| serde_json::to_value(issues).ok())
                    .flatten();
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    ErrorDetail {
                        error: Some("validation_error".to_string()),
                        description: Some(err.to_string()),
                        errors,
                    },
                )
            }
            Self::Graph(err) => (
                err.status(),
                ErrorDetail::new(err.kind().to_string(), err.to_string()),
            ),
            Self::CustomError(status, detail) => (status, detail),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new("internal_server_error", "Internal Server Error"),
            ),
        };

        (status, Json(detail)).into_response()
    }
}
