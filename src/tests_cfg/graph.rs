//! In-memory stand-in for the graph store.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::graph::{GraphError, GraphStore, QuerySolutions};

type Answer = Result<QuerySolutions, GraphError>;

/// Answers queries from canned responses.
///
/// Each response is registered with a needle; the first one whose needle
/// occurs in the query text wins. Queries matching nothing get an empty
/// result. Every query is recorded, and clones share both the responses and
/// the record.
#[derive(Clone, Default)]
pub struct FakeGraph {
    answers: Arc<Vec<(String, Answer)>>,
    fallback: Option<Arc<GraphError>>,
    queries: Arc<Mutex<Vec<String>>>,
}

/// Needle matching the cohort query.
pub const COHORT: &str = "?sub_id";
/// Needle matching the dataset-size query.
pub const DATASET_SIZES: &str = "?total_subjects";
/// Needle matching the attributes query.
pub const ATTRIBUTES: &str = "?attribute";
/// Needle matching the attribute-terms query.
pub const ATTRIBUTE_TERMS: &str = "?termURL";

impl FakeGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers queries containing `needle` with `solutions`.
    #[must_use]
    pub fn respond(self, needle: &str, solutions: QuerySolutions) -> Self {
        self.push(needle, Ok(solutions))
    }

    /// Fails queries containing `needle` with `error`.
    #[must_use]
    pub fn fail(self, needle: &str, error: GraphError) -> Self {
        self.push(needle, Err(error))
    }

    /// Fails every query not matched by an earlier response.
    #[must_use]
    pub fn fail_all(mut self, error: GraphError) -> Self {
        self.fallback = Some(Arc::new(error));
        self
    }

    fn push(mut self, needle: &str, answer: Answer) -> Self {
        let mut answers = self.answers.as_ref().clone();
        answers.push((needle.to_string(), answer));
        self.answers = Arc::new(answers);
        self
    }

    /// Queries received so far, oldest first.
    ///
    /// # Panics
    ///
    /// When the record lock is poisoned.
    #[must_use]
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().expect("query log").clone()
    }
}

#[async_trait]
impl GraphStore for FakeGraph {
    async fn select(&self, query: &str) -> Result<QuerySolutions, GraphError> {
        self.queries.lock().expect("query log").push(query.to_string());
        if let Some((_, answer)) = self
            .answers
            .iter()
            .find(|(needle, _)| query.contains(needle.as_str()))
        {
            return answer.clone();
        }
        match &self.fallback {
            Some(error) => Err(error.as_ref().clone()),
            None => Ok(QuerySolutions::default()),
        }
    }
}
