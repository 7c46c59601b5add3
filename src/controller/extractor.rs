//! Request extractors that validate their input.

use axum::{
    extract::{FromRequestParts, Query},
    http::request::Parts,
};

use crate::{
    query::{CohortFilters, CohortQueryParams, ValidationError},
    Error,
};

/// Decodes `/query` parameters and converts them into [`CohortFilters`].
///
/// Decoding failures (unknown parameter, non-numeric age, ...) and rule
/// violations are both reported as validation errors, i.e. `422`.
#[derive(Debug, Clone)]
pub struct CohortQuery(pub CohortFilters);

impl<S> FromRequestParts<S> for CohortQuery
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(params) = Query::<CohortQueryParams>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ValidationError::Request(rejection.body_text()))?;
        Ok(Self(CohortFilters::try_from(params)?))
    }
}
