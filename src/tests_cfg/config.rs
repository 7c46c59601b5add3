use crate::{
    config::{self, Config},
    logger,
};

/// A configuration that needs neither files nor environment variables.
#[must_use]
pub fn test_config() -> Config {
    Config {
        logger: config::Logger {
            enable: false,
            level: logger::LogLevel::Off,
            format: logger::Format::Json,
            override_filter: None,
        },
        server: config::Server {
            binding: "localhost".to_string(),
            port: 8000,
            allowed_origins: String::new(),
        },
        graph: config::Graph {
            url: "http://localhost:7200/repositories/test_db".to_string(),
            username: "test_user".to_string(),
            password: "test_password".to_string(),
            timeout_secs: None,
        },
        query: config::Query { return_agg: true },
    }
}
