//! Collects every controller's routes and turns them into an `axum` router
//! with the middleware stack applied.

use std::fmt;

use axum::{
    http::{HeaderValue, Method},
    Router as AXRouter,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use super::{attributes, docs, monitoring, query, routes::Routes};
use crate::{app::AppContext, config, Error, Result};

#[derive(Clone)]
pub struct AppRoutes {
    prefix: Option<String>,
    routes: Vec<Routes>,
}

#[derive(Debug, Clone)]
pub struct ListRoutes {
    pub uri: String,
    pub actions: Vec<Method>,
}

impl fmt::Display for ListRoutes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let actions = self
            .actions
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        write!(f, "[{actions}] {}", self.uri)
    }
}

impl AppRoutes {
    /// Monitoring routes only.
    #[must_use]
    pub fn with_default_routes() -> Self {
        Self::empty().add_route(monitoring::routes())
    }

    /// Every route the API serves.
    #[must_use]
    pub fn api() -> Self {
        Self::with_default_routes()
            .add_route(query::routes())
            .add_route(attributes::routes())
            .add_route(docs::routes())
    }

    #[must_use]
    pub fn empty() -> Self {
        Self {
            prefix: None,
            routes: vec![],
        }
    }

    #[must_use]
    pub fn get_prefix(&self) -> Option<&String> {
        self.prefix.as_ref()
    }

    #[must_use]
    pub fn get_routes(&self) -> &[Routes] {
        self.routes.as_ref()
    }

    /// Lists every registered path with its methods, sorted by path.
    #[must_use]
    pub fn collect(&self) -> Vec<ListRoutes> {
        let base_url_prefix = self.get_prefix().map_or("/", |url| url.as_str());

        let mut routes: Vec<ListRoutes> = self
            .get_routes()
            .iter()
            .flat_map(|controller| {
                controller.handlers.iter().map(|handler| {
                    let mut uri_parts = vec![base_url_prefix];
                    if let Some(prefix) = controller.prefix.as_ref() {
                        uri_parts.push(prefix);
                    }
                    uri_parts.push(handler.uri.as_str());
                    ListRoutes {
                        uri: normalize_url(&uri_parts),
                        actions: handler.actions.clone(),
                    }
                })
            })
            .collect();
        routes.sort_by(|a, b| a.uri.cmp(&b.uri));
        routes
    }

    #[must_use]
    pub fn prefix(mut self, prefix: &str) -> Self {
        self.prefix = Some(prefix.to_string());
        self
    }

    #[must_use]
    pub fn add_route(mut self, route: Routes) -> Self {
        self.routes.push(route);
        self
    }

    #[must_use]
    pub fn add_routes(mut self, mut routes: Vec<Routes>) -> Self {
        self.routes.append(&mut routes);
        self
    }

    /// Builds the `axum` router: every collected route plus request tracing,
    /// panic recovery and CORS.
    ///
    /// # Errors
    ///
    /// Fails when a configured CORS origin is not a valid header value.
    pub fn to_router(&self, ctx: AppContext, mut app: AXRouter<AppContext>) -> Result<AXRouter> {
        let base_url_prefix = self.get_prefix().map_or("/", |url| url.as_str());
        for controller in self.get_routes() {
            for handler in &controller.handlers {
                let mut uri_parts = vec![base_url_prefix];
                if let Some(prefix) = controller.prefix.as_ref() {
                    uri_parts.push(prefix);
                }
                uri_parts.push(handler.uri.as_str());
                app = app.route(&normalize_url(&uri_parts), handler.method.clone());
            }
        }

        let app = app
            .layer(CatchPanicLayer::new())
            .layer(cors_layer(&ctx.config.server)?)
            .layer(TraceLayer::new_for_http());

        Ok(app.with_state(ctx))
    }
}

fn cors_layer(server: &config::Server) -> Result<CorsLayer> {
    let origins = server.allowed_origins();
    let layer = CorsLayer::new()
        .allow_methods([Method::GET])
        .allow_headers(Any);
    if origins.iter().any(|origin| origin == "*") {
        return Ok(layer.allow_origin(Any));
    }
    let origins = origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin)
                .map_err(|_| Error::Message(format!("invalid CORS origin: {origin}")))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(layer.allow_origin(AllowOrigin::list(origins)))
}

fn normalize_url(parts: &[&str]) -> String {
    let joined = parts
        .iter()
        .flat_map(|part| part.split('/'))
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/");
    let trailing = parts.last().is_some_and(|last| last.len() > 1 && last.ends_with('/'));
    if trailing {
        format!("/{joined}/")
    } else {
        format!("/{joined}")
    }
}
