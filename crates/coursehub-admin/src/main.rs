//! Operator CLI for the CourseHub persistence layer.
//!
//! # Commands
//!
//! - `migrate` -- apply pending schema migrations
//! - `roles` -- print the role registry
//! - `user <email>` -- print a user as JSON
//! - `audit-terms` -- list stored term names that need migrating
//!
//! # Startup Sequence
//!
//! 1. Parse arguments
//! 2. Load configuration from `coursehub.yaml` (or `--config`)
//! 3. Initialize structured logging (tracing)
//! 4. Connect to `PostgreSQL` and run the command

mod commands;
mod config;
mod error;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use coursehub_db::{PostgresPool, ReadContext, SerializableFactory, load_roles};
use coursehub_types::RoleRegistry;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::commands::TermNameStatus;
use crate::config::{AdminConfig, LoggingConfig};
use crate::error::AdminError;

#[derive(Debug, Parser)]
#[command(name = "coursehub-admin", version)]
#[command(about = "Administer the CourseHub database")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "coursehub.yaml", env = "COURSEHUB_CONFIG")]
    config: PathBuf,

    /// Emit logs as JSON lines (overrides config file)
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Apply pending schema migrations
    Migrate,
    /// Print every role in the registry
    Roles,
    /// Print the user with this e-mail address as JSON
    User {
        /// E-mail address (case and surrounding whitespace are ignored)
        email: String,
    },
    /// Report term names that are legacy or unparsable
    AuditTerms {
        /// Print every row, not only the ones that need attention
        #[arg(long)]
        all: bool,
    },
}

/// Application entry point for the admin CLI.
///
/// # Errors
///
/// Returns an error if configuration, the database or the command fails.
#[tokio::main]
async fn main() -> Result<(), AdminError> {
    let cli = Cli::parse();

    let (mut config, from_file) = load_config(&cli.config)?;
    if cli.json_logs {
        config.logging.json = true;
    }
    init_logging(&config.logging);

    if from_file {
        info!(path = %cli.config.display(), "Configuration loaded");
    } else {
        info!(path = %cli.config.display(), "Config file not found, using defaults");
    }

    let pool = PostgresPool::connect(&config.database.postgres()).await?;
    let result = run(cli.command, &pool).await;
    pool.close().await;
    result
}

async fn run(command: Command, pool: &PostgresPool) -> Result<(), AdminError> {
    if matches!(command, Command::Migrate) {
        pool.run_migrations().await?;
        return Ok(());
    }

    let factory = SerializableFactory::new();
    let roles = RoleRegistry::new();
    load_roles(&roles, pool).await?;
    let context = ReadContext::new(pool, &factory, &roles);

    match command {
        Command::Migrate => {}
        Command::Roles => {
            for role in commands::list_roles(context) {
                println!("{}\t{}", role.id(), role.key());
            }
        }
        Command::User { email } => match commands::find_user(context, &email).await? {
            Some(user) => println!("{}", serde_json::to_string_pretty(&user)?),
            None => println!("no user with e-mail address {email:?}"),
        },
        Command::AuditTerms { all } => {
            let entries = commands::audit_terms(pool).await?;
            let flagged = entries
                .iter()
                .filter(|e| !matches!(e.status, TermNameStatus::Canonical))
                .count();
            for entry in entries
                .iter()
                .filter(|e| all || !matches!(e.status, TermNameStatus::Canonical))
            {
                println!("{}", serde_json::to_string(entry)?);
            }
            info!(total = entries.len(), flagged, "Audit finished");
        }
    }
    Ok(())
}

/// Load configuration from `path`, falling back to defaults when the file
/// does not exist. Returns whether the file was read.
fn load_config(path: &Path) -> Result<(AdminConfig, bool), AdminError> {
    if path.exists() {
        Ok((AdminConfig::from_file(path)?, true))
    } else {
        let mut config = AdminConfig::default();
        config.apply_env_overrides();
        Ok((config, false))
    }
}

fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.filter));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}
