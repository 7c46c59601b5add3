//! Fixtures shared by unit and integration tests.

pub mod app;
pub mod config;
pub mod graph;
