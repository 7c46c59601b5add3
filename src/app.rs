//! Shared application state handed to every handler.

use std::sync::Arc;

use crate::{
    config::Config, environment::Environment, graph::GraphStore, query::ResultMode,
    vocab::VocabularyRegistry,
};

/// Everything a request needs, built once at startup.
///
/// Cloning is cheap: the graph client and the vocabulary tables sit behind
/// `Arc`s and nothing in here is mutated after boot.
#[derive(Clone)]
pub struct AppContext {
    /// The environment the application is running in.
    pub environment: Environment,
    /// Configuration settings for the application.
    pub config: Config,
    /// Client for the SPARQL graph store.
    pub graph: Arc<dyn GraphStore>,
    /// Term-label lookup tables.
    pub vocabularies: Arc<VocabularyRegistry>,
}

impl AppContext {
    /// Whether `/query` answers with aggregates or per-session records.
    #[must_use]
    pub fn result_mode(&self) -> ResultMode {
        ResultMode::from_return_agg(self.config.query.return_agg)
    }
}
