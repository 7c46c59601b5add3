//! Access to the SPARQL graph store.
//!
//! Handlers only see the [`GraphStore`] trait; [`http::HttpGraphStore`] is the
//! production implementation and tests substitute an in-memory fake.

pub mod http;

use std::collections::BTreeMap;

use async_trait::async_trait;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use http::HttpGraphStore;

/// Query used to check that the graph store answers at all.
pub const PING_QUERY: &str = "SELECT * WHERE { } LIMIT 1";

/// A SPARQL endpoint answering `SELECT` queries.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Runs a `SELECT` query and returns its solutions.
    async fn select(&self, query: &str) -> Result<QuerySolutions, GraphError>;

    /// Returns `true` when the store answers a trivial query.
    async fn ping(&self) -> bool {
        self.select(PING_QUERY).await.is_ok()
    }
}

/// Failures talking to the graph store.
#[derive(Debug, Clone, Error)]
pub enum GraphError {
    /// The store rejected the configured credentials.
    #[error("Unauthorized: {body}")]
    Authentication { body: String },

    /// The store answered with a non-success status other than `401`.
    #[error("{reason}: {body}")]
    Upstream {
        status: StatusCode,
        reason: String,
        body: String,
    },

    /// The request never produced a response (connection refused, timeout).
    #[error("graph store unreachable: {0}")]
    Transport(String),

    /// The store answered, but not with SPARQL JSON results we understand.
    #[error("malformed graph store response: {0}")]
    MalformedResponse(String),
}

impl GraphError {
    /// Status code the API answers with when this error ends a request.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Authentication { .. } => StatusCode::UNAUTHORIZED,
            Self::Upstream { status, .. } => *status,
            Self::Transport(_) | Self::MalformedResponse(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short machine-readable error kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Authentication { .. } => "authentication_error",
            Self::Upstream { .. } => "upstream_error",
            Self::Transport(_) => "transport_error",
            Self::MalformedResponse(_) => "malformed_upstream_response",
        }
    }
}

/// SPARQL 1.1 Query Results JSON document.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct QuerySolutions {
    pub head: Head,
    pub results: Bindings,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Head {
    #[serde(default)]
    pub vars: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Bindings {
    pub bindings: Vec<Solution>,
}

/// One result row: variable name to bound term. Unbound variables are absent.
pub type Solution = BTreeMap<String, RdfTerm>;

/// A bound RDF term as serialized in SPARQL JSON results.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct RdfTerm {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datatype: Option<String>,
    #[serde(
        rename = "xml:lang",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub lang: Option<String>,
}

impl RdfTerm {
    #[must_use]
    pub fn uri(value: impl Into<String>) -> Self {
        Self {
            kind: "uri".to_string(),
            value: value.into(),
            datatype: None,
            lang: None,
        }
    }

    #[must_use]
    pub fn literal(value: impl Into<String>) -> Self {
        Self {
            kind: "literal".to_string(),
            value: value.into(),
            datatype: None,
            lang: None,
        }
    }

    #[must_use]
    pub fn typed_literal(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        Self {
            datatype: Some(datatype.into()),
            ..Self::literal(value)
        }
    }
}

impl QuerySolutions {
    /// Builds a result document from rows of `(variable, term)` pairs.
    #[must_use]
    pub fn from_rows<I, R>(vars: &[&str], rows: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = (&'static str, RdfTerm)>,
    {
        Self {
            head: Head {
                vars: vars.iter().map(ToString::to_string).collect(),
            },
            results: Bindings {
                bindings: rows
                    .into_iter()
                    .map(|row| {
                        row.into_iter()
                            .map(|(var, term)| (var.to_string(), term))
                            .collect()
                    })
                    .collect(),
            },
        }
    }

    /// Values bound to `var`, in row order, skipping rows where it is unbound.
    pub fn column<'a>(&'a self, var: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.results
            .bindings
            .iter()
            .filter_map(move |row| row.get(var).map(|term| term.value.as_str()))
    }
}
