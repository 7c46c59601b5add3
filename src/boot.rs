//! Application startup: context creation, router assembly and serving.

use std::sync::Arc;

use axum::Router;
use colored::Colorize;
use tokio::net::TcpListener;
use tracing::info;

use crate::{
    app::AppContext,
    config::Config,
    controller::{AppRoutes, ListRoutes},
    environment::Environment,
    graph::HttpGraphStore,
    vocab::VocabularyRegistry,
    Error, Result,
};

/// Builds the shared context: the HTTP graph client and the embedded
/// vocabulary tables.
///
/// # Errors
///
/// Fails when the graph client cannot be built or a vocabulary table is
/// invalid.
pub fn create_context(environment: &Environment, config: Config) -> Result<AppContext> {
    let graph = HttpGraphStore::from_config(&config.graph)?;
    let vocabularies = VocabularyRegistry::embedded().map_err(Error::wrap)?;
    Ok(AppContext {
        environment: environment.clone(),
        config,
        graph: Arc::new(graph),
        vocabularies: Arc::new(vocabularies),
    })
}

/// Builds the router serving every API route.
///
/// # Errors
///
/// Fails when the CORS configuration is invalid.
pub fn create_router(ctx: &AppContext) -> Result<Router> {
    AppRoutes::api().to_router(ctx.clone(), Router::new())
}

/// Every route the API serves.
#[must_use]
pub fn list_endpoints() -> Vec<ListRoutes> {
    AppRoutes::api().collect()
}

/// Serves the API until `ctrl-c`.
///
/// # Errors
///
/// Fails when the listener cannot bind or the server stops with an error.
pub async fn start(ctx: AppContext) -> Result<()> {
    let router = create_router(&ctx)?;
    let address = format!("{}:{}", ctx.config.server.binding, ctx.config.server.port);
    let listener = TcpListener::bind(&address).await?;

    print_banner(&ctx);
    info!(
        environment = %ctx.environment,
        graph = %ctx.config.graph.url,
        return_agg = ctx.config.query.return_agg,
        "listening on {}",
        ctx.config.server.full_url()
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

fn print_banner(ctx: &AppContext) {
    println!(
        "{} {}",
        "neurobagel-api".bold(),
        env!("CARGO_PKG_VERSION").dimmed()
    );
    println!("  environment: {}", ctx.environment.to_string().green());
    println!("  graph:       {}", ctx.config.graph.url.green());
    println!(
        "  listening:   {}",
        ctx.config.server.full_url().green()
    );
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(err.msg = %err, err.detail = ?err, "failed to install ctrl-c handler");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
