use std::sync::Arc;

use crate::{
    app::AppContext,
    environment::Environment,
    graph::GraphStore,
    tests_cfg::{config::test_config, graph::FakeGraph},
    vocab::VocabularyRegistry,
};

/// Context backed by an empty [`FakeGraph`].
pub async fn get_app_context() -> AppContext {
    get_app_context_with_graph(FakeGraph::new()).await
}

/// Context backed by the given graph store.
///
/// # Panics
///
/// When the embedded vocabularies cannot be loaded.
pub async fn get_app_context_with_graph(graph: impl GraphStore + 'static) -> AppContext {
    AppContext {
        environment: Environment::Test,
        config: test_config(),
        graph: Arc::new(graph),
        vocabularies: Arc::new(VocabularyRegistry::embedded().expect("embedded vocabularies")),
    }
}
