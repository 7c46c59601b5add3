//! Controlled vocabularies known to the API.
//!
//! Every coded value accepted by the API or returned by the graph belongs to
//! one of the namespaces listed in [`CONTEXT`]. The module offers prefix
//! expansion (`snomed:248152002` to a full IRI), the reverse compaction, and
//! the `PREFIX` header shared by every generated SPARQL query.

pub mod registry;
pub mod terms;

pub use registry::{Vocabulary, VocabularyError, VocabularyRegistry};
pub use terms::{ControlledTerm, Iri, IriError, TermError};

/// A namespace prefix and the IRI it abbreviates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Namespace {
    pub prefix: &'static str,
    pub url: &'static str,
}

/// Namespaces recognized by Neurobagel, sorted by prefix.
pub const CONTEXT: &[Namespace] = &[
    Namespace {
        prefix: "cogatlas",
        url: "https://www.cognitiveatlas.org/task/id/",
    },
    Namespace {
        prefix: "nb",
        url: "http://neurobagel.org/vocab/",
    },
    Namespace {
        prefix: "nbg",
        url: "http://neurobagel.org/graph/",
    },
    Namespace {
        prefix: "ncit",
        url: "http://ncicb.nci.nih.gov/xml/owl/EVS/Thesaurus.owl#",
    },
    Namespace {
        prefix: "nidm",
        url: "http://purl.org/nidash/nidm#",
    },
    Namespace {
        prefix: "snomed",
        url: "http://purl.bioontology.org/ontology/SNOMEDCT/",
    },
];

/// Subject group marking healthy controls.
pub const HEALTHY_CONTROL: &str = "http://ncicb.nci.nih.gov/xml/owl/EVS/Thesaurus.owl#C94342";

/// Looks up the namespace registered for `prefix`.
#[must_use]
pub fn namespace(prefix: &str) -> Option<&'static Namespace> {
    CONTEXT.iter().find(|ns| ns.prefix == prefix)
}

/// Abbreviates `iri` with the longest matching namespace.
///
/// Returns `None` when the IRI does not belong to a known vocabulary.
#[must_use]
pub fn compact_iri(iri: &str) -> Option<String> {
    CONTEXT
        .iter()
        .filter(|ns| iri.starts_with(ns.url) && iri.len() > ns.url.len())
        .max_by_key(|ns| ns.url.len())
        .map(|ns| format!("{}:{}", ns.prefix, &iri[ns.url.len()..]))
}

/// `PREFIX` declarations for every namespace in [`CONTEXT`], one per line.
#[must_use]
pub fn sparql_prefixes() -> String {
    CONTEXT
        .iter()
        .map(|ns| format!("PREFIX {}: <{}>", ns.prefix, ns.url))
        .collect::<Vec<_>>()
        .join("\n")
}
