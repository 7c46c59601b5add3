//! `reqwest` client for a SPARQL 1.1 query endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use tracing::{debug, error};

use super::{GraphError, GraphStore, QuerySolutions};
use crate::config;

const SPARQL_QUERY: &str = "application/sparql-query";
const SPARQL_RESULTS_JSON: &str = "application/sparql-results+json";

/// Graph store reached over HTTP with basic authentication.
#[derive(Clone)]
pub struct HttpGraphStore {
    client: Client,
    url: String,
    username: String,
    password: String,
}

impl std::fmt::Debug for HttpGraphStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpGraphStore")
            .field("url", &self.url)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl HttpGraphStore {
    /// Builds a client from the `graph` configuration section.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Transport`] when the HTTP client cannot be
    /// constructed (for example when no TLS backend is available).
    pub fn from_config(config: &config::Graph) -> Result<Self, GraphError> {
        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|err| GraphError::Transport(err.to_string()))?;
        Ok(Self {
            client,
            url: config.url.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    async fn post_query(&self, query: String) -> Result<QuerySolutions, GraphError> {
        let response = self
            .client
            .post(&self.url)
            .header(header::CONTENT_TYPE, SPARQL_QUERY)
            .header(header::ACCEPT, SPARQL_RESULTS_JSON)
            .basic_auth(&self.username, Some(&self.password))
            .body(query)
            .send()
            .await
            .map_err(|err| GraphError::Transport(err.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| GraphError::Transport(err.to_string()))?;

        if status == StatusCode::UNAUTHORIZED {
            return Err(GraphError::Authentication { body });
        }
        if !status.is_success() {
            return Err(GraphError::Upstream {
                status,
                reason: status.canonical_reason().unwrap_or("Error").to_string(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|err| GraphError::MalformedResponse(err.to_string()))
    }
}

#[async_trait]
impl GraphStore for HttpGraphStore {
    async fn select(&self, query: &str) -> Result<QuerySolutions, GraphError> {
        debug!(url = %self.url, "sending query to graph store");
        // Run on its own task: a client hanging up must not abort the
        // upstream request half way.
        let store = self.clone();
        let query = query.to_string();
        let result = tokio::spawn(async move { store.post_query(query).await })
            .await
            .map_err(|err| GraphError::Transport(err.to_string()))?;

        if let Err(err) = &result {
            error!(err.msg = %err, err.detail = ?err, "graph store query failed");
        }
        result
    }
}
