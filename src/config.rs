//! # Configuration Management
//!
//! Configuration lives in `config/<environment>.yaml`. Files are rendered
//! through `tera` before being parsed, so values can be pulled from the
//! process environment with the `get_env` function:
//!
//! ```yaml
//! graph:
//!   username: {{ get_env(name="NB_GRAPH_USERNAME") }}
//!   timeout_secs: {{ get_env(name="NB_GRAPH_TIMEOUT_SECS", default="30") }}
//! ```
//!
//! Calling `get_env` without a default makes the variable mandatory: loading
//! fails when it is not set. A `<environment>.local.yaml` next to the main file
//! takes precedence when present.

use std::{
    fmt,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::{environment::Environment, logger, Error, Result};

/// Overrides the folder configuration files are read from.
pub const CONFIG_FOLDER_ENV: &str = "NB_API_CONFIG_FOLDER";
const DEFAULT_FOLDER: &str = "config";

/// Main application configuration structure.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub logger: Logger,
    pub server: Server,
    pub graph: Graph,
    #[serde(default)]
    pub query: Query,
}

/// Logger configuration
///
/// ```yaml
/// logger:
///   enable: true
///   level: info
///   format: compact
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Logger {
    pub enable: bool,

    /// Set the logger level.
    ///
    /// * options: `trace` | `debug` | `info` | `warn` | `error`
    pub level: logger::LogLevel,

    /// Set the logger format.
    ///
    /// * options: `compact` | `pretty` | `json`
    pub format: logger::Format,

    /// Override our custom tracing filter.
    ///
    /// Set this to your own filter if you want to see traces from internal
    /// libraries. See more [here](https://docs.rs/tracing-subscriber/latest/tracing_subscriber/filter/struct.EnvFilter.html#directives)
    pub override_filter: Option<String>,
}

/// Server configuration structure.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Server {
    /// The address on which the server should listen on for incoming
    /// connections.
    #[serde(default = "default_binding")]
    pub binding: String,
    /// The port on which the server should listen for incoming connections.
    pub port: u16,
    /// Space separated list of origins allowed by CORS. `*` allows any
    /// origin, an empty value disables CORS headers.
    #[serde(default)]
    pub allowed_origins: String,
}

fn default_binding() -> String {
    "localhost".to_string()
}

impl Server {
    #[must_use]
    pub fn full_url(&self) -> String {
        format!("http://{}:{}", self.binding, self.port)
    }

    /// Returns the configured CORS origins, one entry per origin.
    #[must_use]
    pub fn allowed_origins(&self) -> Vec<String> {
        self.allowed_origins
            .split_whitespace()
            .map(ToString::to_string)
            .collect()
    }
}

/// Graph store connection settings.
#[derive(Clone, Deserialize, Serialize)]
pub struct Graph {
    /// Full URL of the SPARQL query endpoint.
    pub url: String,
    pub username: String,
    pub password: String,
    /// Upper bound for a single upstream query. Unset means the request waits
    /// for as long as the graph store takes.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl fmt::Debug for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Graph")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"******")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Cohort query behavior.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Query {
    /// When set, only dataset-level aggregates are returned and subject data
    /// is reported as protected.
    #[serde(default = "default_return_agg")]
    pub return_agg: bool,
}

impl Default for Query {
    fn default() -> Self {
        Self {
            return_agg: default_return_agg(),
        }
    }
}

fn default_return_agg() -> bool {
    true
}

impl Config {
    /// Creates a new configuration instance based on the specified
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns an error when the configuration file cannot be found, rendered
    /// or parsed.
    pub fn new(env: &Environment) -> Result<Self> {
        let folder = std::env::var(CONFIG_FOLDER_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_FOLDER));
        Self::from_folder(env, &folder)
    }

    /// Loads configuration settings from a folder for the specified
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns an error when no configuration file exists for the environment
    /// or when it cannot be rendered or parsed.
    pub fn from_folder(env: &Environment, path: &Path) -> Result<Self> {
        let files = [
            path.join(format!("{env}.local.yaml")),
            path.join(format!("{env}.yaml")),
        ];

        let selected_path = files.iter().find(|p| p.exists()).ok_or_else(|| {
            Error::Message(format!(
                "no configuration file found in folder: {}",
                path.display()
            ))
        })?;
        info!(selected_path =? selected_path, "loading environment from");

        let content = std::fs::read_to_string(selected_path)?;
        let rendered = render_string(&content, &json!({}))?;

        serde_yaml::from_str(&rendered)
            .map_err(|err| Error::YAMLFile(err, selected_path.to_string_lossy().to_string()))
    }
}

fn render_string(tera_template: &str, locals: &serde_json::Value) -> Result<String> {
    let text = tera::Tera::one_off(
        tera_template,
        &tera::Context::from_serialize(locals)?,
        false,
    )?;
    Ok(text)
}
