//! # Application Error Handling

use axum::http::StatusCode;

use crate::{graph::GraphError, query::params::ValidationError};

/*
backtrace principles:
- only install when the error is unexpected, and only in development.
- errors describing a client mistake carry a human message and no backtrace.
*/

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Message(String),

    #[error("cannot parse `{1}`: {0}")]
    YAMLFile(#[source] serde_yaml::Error, String),

    #[error(transparent)]
    YAML(#[from] serde_yaml::Error),

    #[error(transparent)]
    JSON(#[from] serde_json::Error),

    #[error(transparent)]
    IO(#[from] std::io::Error),

    #[error(transparent)]
    Axum(#[from] axum::http::Error),

    #[error(transparent)]
    Tera(#[from] tera::Error),

    #[error(transparent)]
    EnvFilter(#[from] tracing_subscriber::filter::ParseError),

    /// Query parameters failed validation; rendered as `422`.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The graph store call failed.
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("not found")]
    NotFound,

    #[error("{1}")]
    CustomError(StatusCode, crate::controller::ErrorDetail),

    #[error(transparent)]
    Any(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    pub fn wrap(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Any(Box::new(err))
    }

    pub fn msg(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Message(err.to_string())
    }

    #[must_use]
    pub fn string(s: &str) -> Self {
        Self::Message(s.to_string())
    }
}
