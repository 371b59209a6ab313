//! Synex Server: application entry point.
//!
//! Loads configuration, installs the tracing subscriber, connects to
//! SurrealDB, applies pending migrations and seeds the permission catalog.
//! The `check` subcommand evaluates one permission for a user against the
//! live store.

mod config;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use synex_auth::{CatalogService, DirectoryService, PermissionResolver};
use synex_core::error::SynexError;
use synex_core::evaluation::PermissionQuery;
use synex_db::{DbError, DbManager};
use thiserror::Error;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::config::{ConfigError, ConfigLoader, LogConfig, ServerConfig};

#[derive(Parser, Debug)]
#[command(name = "synex-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Config file (defaults to ./synex.toml when present)
    #[arg(short, long, env = "SYNEX_CONFIG")]
    config: Option<PathBuf>,

    /// Skip seeding the predefined permission catalog
    #[arg(long)]
    no_seed: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate one permission for a user and print the decision
    Check {
        #[arg(long)]
        username: String,
        #[arg(long)]
        module: String,
        #[arg(long)]
        action: String,
        #[arg(long)]
        resource: Option<String>,
    },
}

#[derive(Debug, Error)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Database(#[from] DbError),

    #[error(transparent)]
    Service(#[from] SynexError),
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let args = Args::parse();

    let mut loader = ConfigLoader::new();
    if let Some(path) = &args.config {
        loader = loader.with_file(path);
    }
    let config = match loader.load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("synex-server: {e}");
            return std::process::ExitCode::FAILURE;
        }
    };

    init_tracing(&config.log);

    match run(args, config).await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Synex server failed");
            std::process::ExitCode::FAILURE
        }
    }
}

fn init_tracing(log: &LogConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&log.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if log.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run(args: Args, config: ServerConfig) -> Result<(), StartupError> {
    info!("Starting Synex server...");

    let db = DbManager::connect(&config.db).await.map_err(DbError::from)?;
    let applied = db.migrate().await?;
    info!(applied, "Schema up to date");

    let store = db.store();

    if !args.no_seed {
        let report = CatalogService::new(store.clone()).seed_catalog().await?;
        info!(
            permissions_created = report.permissions_created,
            groups_created = report.groups_created,
            "Catalog ready"
        );
    }

    if let Some(Command::Check {
        username,
        module,
        action,
        resource,
    }) = args.command
    {
        let user = DirectoryService::new(store.clone())
            .get_user_by_username(&username)
            .await?;
        let mut query = PermissionQuery::new(module, action);
        if let Some(resource) = resource {
            query = query.with_resource(resource);
        }

        let resolver = PermissionResolver::new(store, config.permissions);
        let evaluation = resolver.evaluate(user.id, &query).await?;
        info!(
            username = %user.username,
            permission = %query.canonical_name(),
            role_granted = evaluation.role_granted,
            direct_grant = evaluation.direct_grant,
            direct_deny = evaluation.direct_deny,
            allowed = evaluation.allows(),
            "Permission check"
        );
        println!(
            "{} {}",
            query.canonical_name(),
            if evaluation.allows() { "ALLOWED" } else { "DENIED" }
        );
    }

    info!("Synex server stopped.");
    Ok(())
}
