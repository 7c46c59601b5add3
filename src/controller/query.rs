//! `GET /query`: find datasets with subjects matching the given criteria.

use axum::{extract::State, response::Response, routing::get};

use super::{extractor::CohortQuery, format, routes::Routes};
use crate::{app::AppContext, query, Result};

/// Runs the cohort query described by the query string.
///
/// # Errors
///
/// `422` when parameters are invalid, otherwise whatever the graph store
/// call fails with.
pub async fn search(
    State(ctx): State<AppContext>,
    CohortQuery(filters): CohortQuery,
) -> Result<Response> {
    let datasets = query::run_cohort_query(ctx.graph.as_ref(), &filters, ctx.result_mode()).await?;
    format::json(datasets)
}

pub fn routes() -> Routes {
    Routes::new()
        .add("/query", get(search))
        .add("/query/", get(search))
}
