//! # neurobagel-api
//!
//! REST API that turns cohort search criteria (sex, diagnosis, age range,
//! imaging modality, ...) into SPARQL queries against a Neurobagel graph store
//! and reshapes the returned bindings into dataset summaries.
//!
//! The request pipeline is linear:
//!
//! 1. [`query::params`] validates query parameters and resolves controlled
//!    vocabulary terms.
//! 2. [`query::template`] renders the SPARQL query.
//! 3. [`graph`] sends it to the configured endpoint.
//! 4. [`query::shaper`] groups bindings into the public response schema.
pub use self::errors::Error;

pub mod app;
pub mod boot;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod controller;
pub mod environment;
pub mod errors;
pub mod graph;
pub mod logger;
pub mod query;
#[cfg(feature = "testing")]
pub mod testing;
#[cfg(any(test, feature = "testing"))]
pub mod tests_cfg;
pub mod vocab;

#[cfg(feature = "testing")]
pub use axum_test::TestServer;

/// Application results options list
pub type Result<T, E = Error> = std::result::Result<T, E>;
