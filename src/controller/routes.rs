use std::{fmt, sync::LazyLock};

use axum::{http::Method, routing::MethodRouter};
use regex::Regex;

use crate::app::AppContext;

static DESCRIBE_METHOD_ACTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\w+):\s*BoxedHandler\b").expect("valid method regex"));

/// A group of handlers sharing an optional path prefix.
#[derive(Clone, Default, Debug)]
pub struct Routes {
    pub prefix: Option<String>,
    pub handlers: Vec<Handler>,
}

#[derive(Clone, Default)]
pub struct Handler {
    pub uri: String,
    pub method: MethodRouter<AppContext>,
    pub actions: Vec<Method>,
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("uri", &self.uri)
            .field("actions", &self.actions)
            .finish_non_exhaustive()
    }
}

impl Routes {
    /// Creates a new [`Routes`] instance with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a handler. Registered methods are read off the method router so
    /// they can be listed later.
    ///
    /// # Example
    ///
    /// ```rust
    /// use axum::routing::get;
    /// use neurobagel_api::controller::Routes;
    ///
    /// async fn ping() -> &'static str { "pong" }
    ///
    /// let routes = Routes::new().add("/_ping", get(ping));
    /// assert_eq!(routes.handlers[0].actions, vec![axum::http::Method::GET]);
    /// ```
    #[must_use]
    pub fn add(mut self, uri: &str, method: MethodRouter<AppContext>) -> Self {
        let actions = method_actions(&method);
        self.handlers.push(Handler {
            uri: uri.to_owned(),
            method,
            actions,
        });
        self
    }

    /// Sets a prefix for every handler in this group.
    #[must_use]
    pub fn prefix(mut self, uri: &str) -> Self {
        self.prefix = Some(uri.to_owned());
        self
    }
}

fn method_actions(method: &MethodRouter<AppContext>) -> Vec<Method> {
    let debug = format!("{method:?}");
    DESCRIBE_METHOD_ACTION
        .captures_iter(&debug)
        .filter_map(|cap| cap.get(1))
        .filter_map(|m| Method::from_bytes(m.as_str().to_uppercase().as_bytes()).ok())
        .collect()
}
