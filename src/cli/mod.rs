//! # Command Line Interface
//!
//! `serve` runs the account API; `database` inspects and applies the embedded
//! migrations.

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::api::start_api_server;
use crate::config::{AppConfig, DatabaseConfig};
use crate::observability::{init_observability, log_config_info, shutdown_tracing};
use crate::startup::build_api_state;
use crate::storage::{create_pool, migration_status, run_migrations, MigrationInfo};
use crate::{APP_NAME, VERSION};

#[derive(Parser)]
#[command(name = "servicehub")]
#[command(about = "ServiceHub account management API")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Database URL override
    #[arg(long, global = true)]
    pub database_url: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the account API server
    Serve {
        /// Port to bind to (overrides SERVICEHUB_PORT)
        #[arg(short, long)]
        port: Option<u16>,

        /// Address to bind to (overrides SERVICEHUB_HOST)
        #[arg(short, long)]
        addr: Option<String>,
    },

    /// Database management commands
    Database {
        #[command(subcommand)]
        command: DatabaseCommands,
    },
}

#[derive(Subcommand)]
pub enum DatabaseCommands {
    /// Run pending migrations
    Migrate,

    /// Show applied and pending migrations
    Status,
}

/// Run CLI commands
pub async fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::from_env()?;
    if let Some(url) = cli.database_url {
        config.database.url = url;
    }

    match cli.command {
        Commands::Serve { port, addr } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(addr) = addr {
                config.server.host = addr;
            }
            if cli.verbose {
                config.observability.log_level = "debug".to_string();
            }
            serve(config).await
        }
        Commands::Database { command } => {
            initialise_logging(cli.verbose);
            handle_database_command(command, config.database).await
        }
    }
}

async fn serve(config: AppConfig) -> anyhow::Result<()> {
    config.validate()?;

    let tracer_provider = init_observability(&config.observability).await?;
    info!(app_name = APP_NAME, version = VERSION, "Starting ServiceHub account service");
    log_config_info(&config);

    let pool = create_pool(&config.database).await?;
    let state = build_api_state(&config, pool)?;

    let result = start_api_server(&config.server, state).await;
    if let Err(e) = &result {
        error!(error = %e, "API server terminated with error");
    }

    // Flushing blocks on the exporter, so keep it off the async workers.
    if tracer_provider.is_some() {
        info!("Flushing OpenTelemetry traces before shutdown");
        if let Err(e) = tokio::task::spawn_blocking(move || shutdown_tracing(tracer_provider)).await
        {
            error!("Error shutting down OpenTelemetry tracer provider: {}", e);
        }
    }

    result?;
    info!("ServiceHub shutdown completed");
    Ok(())
}

fn initialise_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // A subscriber may already be installed (e.g. by integration tests).
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Handle database management commands
async fn handle_database_command(
    command: DatabaseCommands,
    mut config: DatabaseConfig,
) -> anyhow::Result<()> {
    config.auto_migrate = false;
    let pool = create_pool(&config).await?;

    match command {
        DatabaseCommands::Migrate => {
            println!("Running database migrations...");
            run_migrations(&pool).await?;
            println!("Migrations completed successfully!");
        }

        DatabaseCommands::Status => {
            let status = migration_status(&pool).await?;
            if status.applied.is_empty() {
                println!("No migrations have been applied");
            } else {
                println!("Applied migrations:");
                print_migrations_table(&status.applied);
            }

            if status.is_current() {
                println!("Database schema is up to date");
            } else {
                println!("Pending migrations: {:?}", status.pending);
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

/// Print migrations in a formatted table
fn print_migrations_table(migrations: &[MigrationInfo]) {
    println!();
    println!("{:<15} {:<50} {:<25} {:<10}", "Version", "Description", "Applied On", "Time (ns)");
    println!("{}", "-".repeat(100));

    for migration in migrations {
        println!(
            "{:<15} {:<50} {:<25} {:<10}",
            migration.version,
            truncate_string(&migration.description, 48),
            migration.installed_on,
            migration.execution_time
        );
    }
}

/// Truncate a string to a maximum number of characters
fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
