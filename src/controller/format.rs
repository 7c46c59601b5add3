//! Response helpers used by every handler.

use axum::{
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::Result;

/// Returns a JSON response.
///
/// # Errors
///
/// Currently this function doesn't return any error. Keeping the `Result`
/// lets handlers end with `format::json(...)`.
pub fn json<T: Serialize>(t: T) -> Result<Response> {
    Ok(Json(t).into_response())
}

