use std::fmt::{self, Display, Formatter};
use std::str::FromStr;
use std::sync::LazyLock;

use oxrdf::NamedNode;
use regex::Regex;
use thiserror::Error;

use super::namespace;

/// `<letters>:<anything but whitespace>`
pub static CONTROLLED_TERM_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z]+:\S+$").expect("controlled term pattern compiles"));

/// Value object ensuring that supplied text represents a valid IRI.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Iri {
    value: String,
}

impl Iri {
    /// Validates and constructs a new [`Iri`] value object.
    ///
    /// Anything `oxrdf` refuses as a named node is rejected, which keeps
    /// characters such as `>` or whitespace out of generated queries.
    pub fn new(value: impl Into<String>) -> Result<Self, IriError> {
        let value = value.into();
        NamedNode::new(value.as_str()).map_err(|_| IriError::Invalid {
            value: value.clone(),
        })?;
        Ok(Self { value })
    }

    /// Returns the underlying textual representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Renders the IRI as a SPARQL IRI reference (`<...>`).
    #[must_use]
    pub fn to_sparql(&self) -> String {
        format!("<{}>", self.value)
    }
}

impl Display for Iri {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl FromStr for Iri {
    type Err = IriError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_owned())
    }
}

/// Errors produced when validating an [`Iri`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum IriError {
    /// The provided text could not be parsed as an IRI.
    #[error("invalid IRI: {value}")]
    Invalid { value: String },
}

/// A prefixed controlled-vocabulary term such as `snomed:248152002`, resolved
/// against the known namespaces.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ControlledTerm {
    prefix: String,
    local: String,
    iri: Iri,
}

impl ControlledTerm {
    /// Parses and resolves a prefixed term.
    ///
    /// # Errors
    ///
    /// Fails when the text is not of the form `prefix:identifier`, when the
    /// prefix is not a known vocabulary, or when the expanded IRI is invalid.
    pub fn parse(value: &str) -> Result<Self, TermError> {
        if !CONTROLLED_TERM_PATTERN.is_match(value) {
            return Err(TermError::Malformed {
                value: value.to_string(),
            });
        }
        let (prefix, local) = value.split_once(':').ok_or_else(|| TermError::Malformed {
            value: value.to_string(),
        })?;
        let ns = namespace(prefix).ok_or_else(|| TermError::UnknownPrefix {
            prefix: prefix.to_string(),
        })?;
        let iri = Iri::new(format!("{}{local}", ns.url))?;
        Ok(Self {
            prefix: prefix.to_string(),
            local: local.to_string(),
            iri,
        })
    }

    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    #[must_use]
    pub fn local(&self) -> &str {
        &self.local
    }

    #[must_use]
    pub fn iri(&self) -> &Iri {
        &self.iri
    }
}

impl Display for ControlledTerm {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.prefix, self.local)
    }
}

impl FromStr for ControlledTerm {
    type Err = TermError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Errors produced when resolving a [`ControlledTerm`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TermError {
    #[error("`{value}` is not a prefixed controlled term (expected `prefix:identifier`)")]
    Malformed { value: String },
    #[error("`{prefix}` is not a recognized vocabulary prefix")]
    UnknownPrefix { prefix: String },
    #[error(transparent)]
    Iri(#[from] IriError),
}
