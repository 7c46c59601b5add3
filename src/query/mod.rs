//! The cohort query pipeline: validated filters in, dataset summaries out.

pub mod params;
pub mod shaper;
pub mod template;

use std::collections::BTreeMap;

use tracing::debug;

pub use params::{CohortFilters, CohortQueryParams, ValidationError};
pub use shaper::{CohortQueryResponse, SessionRecord, SubjectData};
pub use template::ResultMode;

use crate::{graph::GraphStore, Result};

/// Runs a cohort query against `graph` and shapes the answer.
///
/// When any dataset matches, a second query fetches the total number of
/// subjects of each matching dataset.
///
/// # Errors
///
/// Propagates graph store failures and malformed responses.
pub async fn run_cohort_query(
    graph: &dyn GraphStore,
    filters: &CohortFilters,
    mode: ResultMode,
) -> Result<Vec<CohortQueryResponse>> {
    let query = template::cohort_query(filters, mode)?;
    let solutions = graph.select(&query).await?;
    debug!(
        rows = solutions.results.bindings.len(),
        "cohort query answered"
    );

    let datasets = shaper::dataset_iris(&solutions)?;
    let sizes = if datasets.is_empty() {
        BTreeMap::new()
    } else {
        let sizes_query = template::dataset_sizes_query(&datasets)?;
        shaper::dataset_sizes(&graph.select(&sizes_query).await?)?
    };

    Ok(shaper::shape(&solutions, &sizes, mode)?)
}
