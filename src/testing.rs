//! Helpers for exercising the HTTP API in tests.
//!
//! ```rust,no_run
//! use neurobagel_api::{testing, tests_cfg};
//!
//! # async fn demo() {
//! let ctx = tests_cfg::app::get_app_context().await;
//! testing::request(ctx, |server, _ctx| async move {
//!     let response = server.get("/query").await;
//!     assert_eq!(response.status_code(), 200);
//! })
//! .await;
//! # }
//! ```

use std::future::Future;

use axum::{http::StatusCode, Router};
use axum_test::TestServer;
use serde_json::Value;

use crate::{app::AppContext, controller::AppRoutes};

/// Builds the full API router for `ctx`.
///
/// # Panics
///
/// When the router cannot be built, e.g. because of an invalid CORS origin.
#[must_use]
pub fn router(ctx: AppContext) -> Router {
    AppRoutes::api()
        .to_router(ctx, Router::new())
        .expect("build api router")
}

/// Starts a [`TestServer`] over the full API and hands it to `callback`.
///
/// # Panics
///
/// When the test server cannot be started.
pub async fn request<F, Fut>(ctx: AppContext, callback: F)
where
    F: FnOnce(TestServer, AppContext) -> Fut,
    Fut: Future<Output = ()>,
{
    let server = TestServer::new(router(ctx.clone())).expect("start test server");
    callback(server, ctx).await;
}

/// Sends `GET uri` and returns the status with the decoded JSON body.
///
/// # Panics
///
/// When the server cannot be started or the body is not JSON.
pub async fn get_json(ctx: AppContext, uri: &str) -> (StatusCode, Value) {
    let server = TestServer::new(router(ctx)).expect("start test server");
    let response = server.get(uri).await;
    (response.status_code(), response.json::<Value>())
}
