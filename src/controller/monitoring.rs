//! Liveness and readiness routes. `/_readiness` reports whether the graph
//! store answers a trivial query.

use axum::{extract::State, response::Response, routing::get};
use serde::Serialize;

use super::{format, routes::Routes};
use crate::{app::AppContext, Result};

/// Represents the health status of the application.
#[derive(Serialize)]
pub struct Health {
    pub ok: bool,
}

/// Check application ping endpoint
///
/// # Errors
/// This function always returns `Ok` with a JSON response.
pub async fn ping() -> Result<Response> {
    format::json(Health { ok: true })
}

/// Check application health endpoint
///
/// # Errors
/// This function always returns `Ok` with a JSON response.
pub async fn health() -> Result<Response> {
    format::json(Health { ok: true })
}

/// Check the readiness of the application by pinging the graph store.
///
/// # Errors
/// Failures are logged, and the readiness status is returned as a JSON
/// response.
pub async fn readiness(State(ctx): State<AppContext>) -> Result<Response> {
    let is_ok = ctx.graph.ping().await;
    if !is_ok {
        tracing::error!(url = %ctx.config.graph.url, "readiness_graph_ping_error");
    }
    format::json(Health { ok: is_ok })
}

/// Defines and returns the readiness-related routes.
pub fn routes() -> Routes {
    Routes::new()
        .add("/_readiness", get(readiness))
        .add("/_ping", get(ping))
        .add("/_health", get(health))
}
