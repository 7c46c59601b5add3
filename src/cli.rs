//! Command line entry point.
//!
//! ```sh
//! neurobagel-api start
//! neurobagel-api --environment production start
//! neurobagel-api routes
//! neurobagel-api default-query --output docs/default_neurobagel_query.rq
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use colored::Colorize;

use crate::{
    boot,
    environment::{resolve_from_env, Environment, DEFAULT_ENVIRONMENT},
    logger,
    query::template,
    Result,
};

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, global = true, help = &format!("Specify the environment [default: {DEFAULT_ENVIRONMENT}]"))]
    environment: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Start {
        /// Override the configured port
        #[arg(short, long)]
        port: Option<u16>,
        /// Override the configured binding address
        #[arg(short, long)]
        binding: Option<String>,
    },
    /// List every route the API serves
    Routes {},
    /// Print the reference per-subject SPARQL query
    DefaultQuery {
        /// Write the query to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Parses the command line and runs the selected command.
///
/// # Errors
///
/// Fails when configuration cannot be loaded or the command itself fails.
pub async fn main() -> Result<()> {
    let cli = Cli::parse();
    let environment: Environment = cli.environment.unwrap_or_else(resolve_from_env).into();

    match cli.command {
        Commands::Start { port, binding } => {
            let mut config = environment.load()?;
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(binding) = binding {
                config.server.binding = binding;
            }
            logger::init(&config.logger)?;
            let ctx = boot::create_context(&environment, config)?;
            boot::start(ctx).await?;
        }
        Commands::Routes {} => {
            for route in boot::list_endpoints() {
                let actions = route
                    .actions
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(",");
                println!("[{}] {}", actions.green(), route.uri);
            }
        }
        Commands::DefaultQuery { output } => {
            let query = template::default_query()?;
            match output {
                Some(path) => {
                    std::fs::write(&path, format!("{}\n", query.trim_end()))?;
                    println!("wrote {}", path.display().to_string().green());
                }
                None => println!("{}", query.trim_end()),
            }
        }
    }
    Ok(())
}
