//! # Application Environment
//!
//! Selects which `config/<environment>.yaml` file is loaded. The environment
//! is taken from the `--environment` flag, then `NB_API_ENV`, and defaults to
//! `development`.

use std::{fmt, path::Path, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{config::Config, Result};

pub const DEFAULT_ENVIRONMENT: &str = "development";
pub const ENV_VAR: &str = "NB_API_ENV";

#[must_use]
pub fn resolve_from_env() -> String {
    std::env::var(ENV_VAR).unwrap_or_else(|_| DEFAULT_ENVIRONMENT.to_string())
}

/// Application environment
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub enum Environment {
    #[serde(rename = "production")]
    Production,
    #[serde(rename = "development")]
    Development,
    #[serde(rename = "test")]
    Test,
    Any(String),
}

impl Environment {
    /// Load environment variables from local configuration
    ///
    /// # Errors
    ///
    /// Returns an error when the configuration file is missing or invalid.
    pub fn load(&self) -> Result<Config> {
        Config::new(self)
    }

    /// Load environment variables from the given folder
    ///
    /// # Errors
    ///
    /// Returns an error when the configuration file is missing or invalid.
    pub fn load_from_folder(&self, path: &Path) -> Result<Config> {
        Config::from_folder(self, path)
    }
}

impl From<String> for Environment {
    fn from(env: String) -> Self {
        Self::from_str(&env).unwrap_or(Self::Any(env))
    }
}

impl FromStr for Environment {
    type Err = &'static str;

    fn from_str(input: &str) -> std::result::Result<Self, Self::Err> {
        match input {
            "production" => Ok(Self::Production),
            "development" => Ok(Self::Development),
            "test" => Ok(Self::Test),
            s => Ok(Self::Any(s.to_string())),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Production => "production".fmt(f),
            Self::Development => "development".fmt(f),
            Self::Test => "test".fmt(f),
            Self::Any(s) => s.fmt(f),
        }
    }
}
