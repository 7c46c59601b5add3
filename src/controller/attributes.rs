//! Discovery of controlled-term attributes and their terms.

use std::collections::BTreeMap;

use axum::{
    extract::{Path, State},
    response::Response,
    routing::get,
};
use serde::Serialize;
use tracing::warn;

use super::{format, routes::Routes};
use crate::{
    app::AppContext,
    query::{template, ValidationError},
    vocab::{self, ControlledTerm},
    Error, Result,
};

/// One instance of an attribute, with its label when a lookup table has one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TermLabel {
    #[serde(rename = "TermURL")]
    pub term_url: String,
    #[serde(rename = "Label")]
    pub label: Option<String>,
}

fn parse_attribute(data_element_uri: &str) -> Result<ControlledTerm> {
    ControlledTerm::parse(data_element_uri)
        .map_err(|err| ValidationError::for_param("data_element_uri", err.to_string()).into())
}

/// Lists controlled-term attributes known to the graph, compacted where a
/// namespace is recognized.
///
/// # Errors
///
/// Fails when the graph store call fails.
pub async fn list(State(ctx): State<AppContext>) -> Result<Response> {
    let solutions = ctx.graph.select(&template::attributes_query()?).await?;
    let attributes: Vec<String> = solutions
        .column("attribute")
        .map(|iri| vocab::compact_iri(iri).unwrap_or_else(|| iri.to_string()))
        .collect();
    format::json(attributes)
}

/// Lists the terms used for `data_element_uri`, e.g. every assessment.
///
/// Terms from unrecognized namespaces are left out.
///
/// # Errors
///
/// `422` for a malformed attribute, otherwise graph store failures.
pub async fn terms(
    State(ctx): State<AppContext>,
    Path(data_element_uri): Path<String>,
) -> Result<Response> {
    let attribute = parse_attribute(&data_element_uri)?;
    let solutions = ctx
        .graph
        .select(&template::attribute_terms_query(&attribute)?)
        .await?;

    let mut terms = Vec::new();
    for iri in solutions.column("termURL") {
        let Some(compact) = vocab::compact_iri(iri) else {
            warn!(
                term = iri,
                attribute = %attribute,
                "term does not come from a vocabulary recognized by Neurobagel, skipping"
            );
            continue;
        };
        let label = compact
            .split_once(':')
            .and_then(|(prefix, local)| ctx.vocabularies.label_for(prefix, local))
            .map(ToString::to_string);
        terms.push(TermLabel {
            term_url: compact,
            label,
        });
    }

    format::json(BTreeMap::from([(data_element_uri, terms)]))
}

/// Describes the vocabulary used for `data_element_uri`.
///
/// # Errors
///
/// `422` for a malformed attribute, `404` when no vocabulary is registered
/// for it.
pub async fn vocabulary(
    State(ctx): State<AppContext>,
    Path(data_element_uri): Path<String>,
) -> Result<Response> {
    let attribute = parse_attribute(&data_element_uri)?;
    let vocabulary = ctx
        .vocabularies
        .for_attribute(&attribute.to_string())
        .ok_or(Error::NotFound)?;
    format::json(vocabulary)
}

pub fn routes() -> Routes {
    Routes::new()
        .add("/attributes", get(list))
        .add("/attributes/", get(list))
        .add("/attributes/{data_element_uri}", get(terms))
        .add("/attributes/{data_element_uri}/vocab", get(vocabulary))
}
