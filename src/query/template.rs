//! Renders the SPARQL sent to the graph store.
//!
//! Templates live next to this file and are rendered with `tera`. Only
//! validated values reach them: controlled terms and dataset IRIs are checked
//! by [`Iri`], numbers are formatted here, so template output never contains
//! caller-controlled text.

use serde::Serialize;
use tera::{Context, Tera};

use super::params::CohortFilters;
use crate::{
    vocab::{self, ControlledTerm, Iri},
    Result,
};

const COHORT: &str = include_str!("templates/cohort.rq");
const AGGREGATE: &str = include_str!("templates/aggregate.rq");
const DATASET_SIZES: &str = include_str!("templates/dataset_sizes.rq");
const ATTRIBUTES: &str = include_str!("templates/attributes.rq");
const ATTRIBUTE_TERMS: &str = include_str!("templates/attribute_terms.rq");

/// Whether results are reduced to dataset-level aggregates or returned per
/// subject session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultMode {
    Aggregate,
    Detail,
}

impl ResultMode {
    #[must_use]
    pub fn from_return_agg(return_agg: bool) -> Self {
        if return_agg {
            Self::Aggregate
        } else {
            Self::Detail
        }
    }

    #[must_use]
    pub fn is_aggregate(self) -> bool {
        matches!(self, Self::Aggregate)
    }
}

fn render(template: &str, context: &Context) -> Result<String> {
    Ok(Tera::one_off(template, context, false)?)
}

fn base_context() -> Context {
    let mut context = Context::new();
    context.insert("prefixes", &vocab::sparql_prefixes());
    context
}

/// Formats a number as a SPARQL numeric literal (`23`, `30.5`).
fn numeric(value: f64) -> String {
    format!("{value}")
}

/// Row-level constraints for the given filters, in a fixed order.
fn cohort_filters(filters: &CohortFilters) -> Vec<String> {
    let mut clauses = Vec::new();
    if let Some(min_age) = filters.min_age {
        clauses.push(format!(
            "FILTER (BOUND(?age) && ?age >= {})",
            numeric(min_age)
        ));
    }
    if let Some(max_age) = filters.max_age {
        clauses.push(format!(
            "FILTER (BOUND(?age) && ?age <= {})",
            numeric(max_age)
        ));
    }
    if let Some(sex) = &filters.sex {
        clauses.push(format!("FILTER (?sex = {})", sex.iri().to_sparql()));
    }
    if let Some(diagnosis) = &filters.diagnosis {
        clauses.push(format!(
            "FILTER EXISTS {{ ?subject nb:hasDiagnosis {} . }}",
            diagnosis.iri().to_sparql()
        ));
    }
    match filters.is_control {
        Some(true) => clauses.push(format!(
            "FILTER (?subject_group = <{}>)",
            vocab::HEALTHY_CONTROL
        )),
        Some(false) => clauses.push(format!(
            "FILTER (!BOUND(?subject_group) || ?subject_group != <{}>)",
            vocab::HEALTHY_CONTROL
        )),
        None => {}
    }
    if let Some(min) = filters.min_num_phenotypic_sessions {
        clauses.push(format!(
            "FILTER (COALESCE(?num_matching_phenotypic_sessions, 0) >= {min})"
        ));
    }
    if let Some(min) = filters.min_num_imaging_sessions {
        clauses.push(format!(
            "FILTER (COALESCE(?num_matching_imaging_sessions, 0) >= {min})"
        ));
    }
    if let Some(assessment) = &filters.assessment {
        clauses.push(format!(
            "FILTER EXISTS {{ ?subject nb:hasAssessment {} . }}",
            assessment.iri().to_sparql()
        ));
    }
    if let Some(image_modal) = &filters.image_modal {
        clauses.push(format!(
            "FILTER EXISTS {{ ?subject nb:hasSession/nb:hasAcquisition/nb:hasContrastType {} . }}",
            image_modal.iri().to_sparql()
        ));
    }
    clauses
}

/// Builds the cohort query for `filters`.
///
/// The same filters and mode always produce the same text.
///
/// # Errors
///
/// Returns an error when a template fails to render.
pub fn cohort_query(filters: &CohortFilters, mode: ResultMode) -> Result<String> {
    let mut context = Context::new();
    context.insert("filters", &cohort_filters(filters));
    let inner = render(COHORT, &context)?;

    match mode {
        ResultMode::Detail => Ok(format!("{}\n\n{inner}", vocab::sparql_prefixes())),
        ResultMode::Aggregate => {
            let mut context = base_context();
            context.insert("inner", inner.trim_end());
            render(AGGREGATE, &context)
        }
    }
}

/// Counts all subjects of each dataset in `datasets`.
///
/// # Errors
///
/// Returns an error when the template fails to render.
pub fn dataset_sizes_query(datasets: &[Iri]) -> Result<String> {
    let mut context = base_context();
    let datasets: Vec<String> = datasets.iter().map(Iri::to_sparql).collect();
    context.insert("datasets", &datasets);
    render(DATASET_SIZES, &context)
}

/// Lists every controlled-term attribute class.
///
/// # Errors
///
/// Returns an error when the template fails to render.
pub fn attributes_query() -> Result<String> {
    render(ATTRIBUTES, &base_context())
}

/// Lists the instances of a controlled-term attribute class.
///
/// # Errors
///
/// Returns an error when the template fails to render.
pub fn attribute_terms_query(attribute: &ControlledTerm) -> Result<String> {
    let mut context = base_context();
    context.insert("attribute", &attribute.iri().to_sparql());
    render(ATTRIBUTE_TERMS, &context)
}

/// The per-subject query with no filters, kept under `docs/` for reference.
///
/// # Errors
///
/// Returns an error when a template fails to render.
pub fn default_query() -> Result<String> {
    cohort_query(&CohortFilters::default(), ResultMode::Detail)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn term(value: &str) -> ControlledTerm {
        ControlledTerm::parse(value).expect("valid term")
    }

    fn all_filters() -> CohortFilters {
        CohortFilters {
            min_age: Some(30.5),
            max_age: Some(60.0),
            sex: Some(term("snomed:248152002")),
            diagnosis: Some(term("snomed:35489007")),
            is_control: Some(false),
            min_num_phenotypic_sessions: Some(1),
            min_num_imaging_sessions: Some(2),
            assessment: Some(term("cogatlas:tsk_U9gDp8utahAfO")),
            image_modal: Some(term("nidm:T1Weighted")),
        }
    }

    #[test]
    fn rendering_is_deterministic() {
        for mode in [ResultMode::Aggregate, ResultMode::Detail] {
            let first = cohort_query(&all_filters(), mode).expect("renders");
            let second = cohort_query(&all_filters(), mode).expect("renders");
            assert_eq!(first, second);
        }
    }

    #[test]
    fn starts_with_sorted_prefixes() {
        let query = default_query().expect("renders");
        assert!(query.starts_with("PREFIX cogatlas: <https://www.cognitiveatlas.org/task/id/>\n"));
        assert!(query.contains("PREFIX snomed: <http://purl.bioontology.org/ontology/SNOMEDCT/>"));
    }

    #[test]
    fn unfiltered_query_has_no_constraints() {
        let query = default_query().expect("renders");
        assert!(!query.contains("FILTER"));
        assert!(!query.contains("GROUP BY ?dataset_uuid"));
        assert!(query.contains("?session_file_path"));
    }

    #[test]
    fn filters_render_full_iris() {
        let query = cohort_query(&all_filters(), ResultMode::Detail).expect("renders");
        assert!(query.contains("FILTER (BOUND(?age) && ?age >= 30.5)"));
        assert!(query.contains("FILTER (BOUND(?age) && ?age <= 60)"));
        assert!(query
            .contains("FILTER (?sex = <http://purl.bioontology.org/ontology/SNOMEDCT/248152002>)"));
        assert!(query.contains(
            "FILTER EXISTS { ?subject nb:hasDiagnosis <http://purl.bioontology.org/ontology/SNOMEDCT/35489007> . }"
        ));
        assert!(query.contains("FILTER (!BOUND(?subject_group) || ?subject_group != <http://ncicb.nci.nih.gov/xml/owl/EVS/Thesaurus.owl#C94342>)"));
        assert!(query.contains("FILTER (COALESCE(?num_matching_phenotypic_sessions, 0) >= 1)"));
        assert!(query.contains("FILTER (COALESCE(?num_matching_imaging_sessions, 0) >= 2)"));
        assert!(query.contains("<https://www.cognitiveatlas.org/task/id/tsk_U9gDp8utahAfO>"));
        assert!(query.contains("nb:hasContrastType <http://purl.org/nidash/nidm#T1Weighted>"));
        assert!(!query.contains("{{"));
    }

    fn session_count_subqueries(query: &str) -> Vec<&str> {
        query
            .match_indices("SELECT ?subject (COUNT")
            .map(|(start, _)| {
                let end = query[start..].find("GROUP BY ?subject").expect("grouped count");
                &query[start..start + end]
            })
            .collect()
    }

    #[test]
    fn session_counts_cover_every_session_of_a_matching_subject() {
        let unfiltered = default_query().expect("renders");
        let filtered = cohort_query(&all_filters(), ResultMode::Detail).expect("renders");

        let counts = session_count_subqueries(&unfiltered);
        assert_eq!(counts.len(), 2);
        assert_eq!(counts, session_count_subqueries(&filtered));
        assert!(counts.iter().all(|block| !block.contains("FILTER")));
    }

    #[test]
    fn healthy_controls_filter() {
        let filters = CohortFilters {
            is_control: Some(true),
            ..CohortFilters::default()
        };
        let query = cohort_query(&filters, ResultMode::Detail).expect("renders");
        assert!(query.contains(
            "FILTER (?subject_group = <http://ncicb.nci.nih.gov/xml/owl/EVS/Thesaurus.owl#C94342>)"
        ));
    }

    #[test]
    fn aggregate_mode_wraps_the_detail_query() {
        let query = cohort_query(&all_filters(), ResultMode::Aggregate).expect("renders");
        assert!(query.contains("SELECT ?dataset_uuid ?dataset_name ?dataset_portal_uri ?subject ?sub_id ?image_modal"));
        assert!(query.trim_end().ends_with(
            "GROUP BY ?dataset_uuid ?dataset_name ?dataset_portal_uri ?subject ?sub_id ?image_modal"
        ));
        assert_eq!(query.matches("PREFIX nb:").count(), 1);
        assert!(query.contains("FILTER (?sex ="));
    }

    #[test]
    fn dataset_sizes_lists_every_dataset() {
        let datasets = vec![
            Iri::new("http://neurobagel.org/vocab/ds1234").expect("iri"),
            Iri::new("http://neurobagel.org/vocab/ds2345").expect("iri"),
        ];
        let query = dataset_sizes_query(&datasets).expect("renders");
        assert!(query.contains("(COUNT(DISTINCT ?subject) AS ?total_subjects)"));
        assert!(query.contains("<http://neurobagel.org/vocab/ds1234>"));
        assert!(query.contains("<http://neurobagel.org/vocab/ds2345>"));
    }

    #[test]
    fn attribute_queries() {
        assert!(attributes_query()
            .expect("renders")
            .contains("?attribute <http://www.w3.org/2000/01/rdf-schema#subClassOf> nb:ControlledTerm"));
        let terms = attribute_terms_query(&term("nb:Assessment")).expect("renders");
        assert!(terms.contains("?termURL a <http://neurobagel.org/vocab/Assessment> ."));
    }
}
