//! Term-label lookup tables embedded in the binary.

use std::collections::BTreeMap;

use include_dir::{include_dir, Dir};
use serde::Serialize;
use thiserror::Error;

use super::namespace;

static VOCAB_DIR: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/vocab");

/// A controlled vocabulary that ships a term-label lookup table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Vocabulary {
    #[serde(rename = "vocabulary_name")]
    pub name: String,
    pub namespace_url: String,
    pub namespace_prefix: String,
    /// Term identifier (the part after the namespace) to label.
    pub term_labels: BTreeMap<String, String>,
}

#[derive(Debug, Error)]
pub enum VocabularyError {
    #[error("vocabulary lookup file `{0}` is not embedded")]
    MissingFile(String),
    #[error("vocabulary lookup file `{file}` is invalid: {source}")]
    Parse {
        file: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("vocabulary prefix `{0}` is not a known namespace")]
    UnknownNamespace(String),
}

/// Vocabularies keyed by the compact attribute IRI they describe
/// (`nb:Assessment`, `nb:Diagnosis`).
#[derive(Clone, Debug, Default)]
pub struct VocabularyRegistry {
    by_attribute: BTreeMap<String, Vocabulary>,
}

// (attribute, vocabulary name, namespace prefix, lookup file)
const EMBEDDED: &[(&str, &str, &str, &str)] = &[
    (
        "nb:Assessment",
        "Cognitive Atlas Tasks",
        "cogatlas",
        "cogatlas_task_terms.json",
    ),
    (
        "nb:Diagnosis",
        "SNOMED CT",
        "snomed",
        "snomedct_disorder_terms.json",
    ),
];

impl VocabularyRegistry {
    #[must_use]
    pub fn new(by_attribute: BTreeMap<String, Vocabulary>) -> Self {
        Self { by_attribute }
    }

    /// Loads the lookup tables compiled into the binary.
    ///
    /// # Errors
    ///
    /// Fails when a lookup file is missing or not a JSON object of strings.
    pub fn embedded() -> Result<Self, VocabularyError> {
        let mut by_attribute = BTreeMap::new();
        for (attribute, name, prefix, file) in EMBEDDED {
            let ns =
                namespace(prefix).ok_or_else(|| VocabularyError::UnknownNamespace((*prefix).into()))?;
            let contents = VOCAB_DIR
                .get_file(file)
                .ok_or_else(|| VocabularyError::MissingFile((*file).into()))?
                .contents();
            let term_labels: BTreeMap<String, String> =
                serde_json::from_slice(contents).map_err(|source| VocabularyError::Parse {
                    file: (*file).into(),
                    source,
                })?;
            by_attribute.insert(
                (*attribute).to_string(),
                Vocabulary {
                    name: (*name).to_string(),
                    namespace_url: ns.url.to_string(),
                    namespace_prefix: ns.prefix.to_string(),
                    term_labels,
                },
            );
        }
        Ok(Self { by_attribute })
    }

    #[must_use]
    pub fn for_attribute(&self, attribute: &str) -> Option<&Vocabulary> {
        self.by_attribute.get(attribute)
    }

    /// Label of `prefix:local`, if a vocabulary with that prefix has one.
    #[must_use]
    pub fn label_for(&self, prefix: &str, local: &str) -> Option<&str> {
        self.by_attribute
            .values()
            .filter(|vocab| vocab.namespace_prefix == prefix)
            .find_map(|vocab| vocab.term_labels.get(local))
            .map(String::as_str)
    }
}
