//! servicenow-connect - CLI for the ServiceNow table API adapter
//!
//! # Usage
//!
//! ```bash
//! # Health check (default): probe the instance and report ONLINE/OFFLINE
//! servicenow-connect -c servicenow.yaml
//!
//! # Read a single record from the configured table
//! servicenow-connect -c servicenow.yaml get
//!
//! # Create a record, optionally with a JSON payload
//! servicenow-connect -c servicenow.yaml create --data '{"short_description":"test"}'
//!
//! # Validate configuration without issuing requests
//! servicenow-connect -c servicenow.yaml validate
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use validator::Validate;

use servicenow_connect::{AdapterStatus, ServiceNowAdapter, ServiceNowConfig, TableOutcome};

#[derive(Parser)]
#[command(name = "servicenow-connect")]
#[command(version, about = "Connector and adapter for the ServiceNow table API")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "servicenow.yaml")]
    config: PathBuf,

    /// Adapter instance id, carried on emitted status events
    #[arg(long, default_value = "servicenow")]
    id: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single health check and report ONLINE/OFFLINE (default)
    Connect,
    /// Read a single record from the configured table
    Get,
    /// Create a record in the configured table
    Create {
        /// JSON payload for the new record
        #[arg(long)]
        data: Option<String>,
    },
    /// Validate configuration file
    Validate,
    /// Show the JSON schema of the configuration
    Schema,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Schema doesn't need config
    if matches!(cli.command, Some(Commands::Schema)) {
        return show_schema();
    }

    let config = ServiceNowConfig::from_file(&cli.config)
        .with_context(|| format!("Failed to load config from {}", cli.config.display()))?;

    match cli.command.unwrap_or(Commands::Connect) {
        Commands::Connect => connect(&cli.id, &config).await,
        Commands::Get => get(&cli.id, &config).await,
        Commands::Create { data } => create(&cli.id, &config, data.as_deref()).await,
        Commands::Validate => validate(&config),
        Commands::Schema => unreachable!(), // handled above
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

async fn connect(id: &str, config: &ServiceNowConfig) -> Result<()> {
    let adapter = ServiceNowAdapter::new(id, config)?;
    adapter.subscribe(|event| {
        println!("{} {{\"id\": \"{}\"}}", event.kind, event.adapter_id);
    });

    adapter.connect().await;

    if adapter.status() == AdapterStatus::Offline {
        anyhow::bail!("adapter '{}' is offline", id);
    }
    Ok(())
}

async fn get(id: &str, config: &ServiceNowConfig) -> Result<()> {
    let adapter = ServiceNowAdapter::new(id, config)?;
    let outcome = adapter
        .get_record()
        .await
        .context("GET request failed")?;

    print_outcome(&outcome);
    Ok(())
}

async fn create(id: &str, config: &ServiceNowConfig, data: Option<&str>) -> Result<()> {
    let payload = data
        .map(serde_json::from_str)
        .transpose()
        .context("Invalid JSON payload")?;

    let adapter = ServiceNowAdapter::new(id, config)?;
    let outcome = adapter
        .create_record(payload)
        .await
        .context("POST request failed")?;

    print_outcome(&outcome);
    Ok(())
}

fn print_outcome(outcome: &TableOutcome) {
    match outcome {
        TableOutcome::Records(response) => {
            // Pretty-print when the body is JSON, pass it through otherwise
            match serde_json::from_str::<serde_json::Value>(&response.body) {
                Ok(value) => println!(
                    "{}",
                    serde_json::to_string_pretty(&value).unwrap_or(response.body.clone())
                ),
                Err(_) => println!("{}", response.body),
            }
        }
        TableOutcome::Hibernating => println!("{}", outcome),
    }
}

fn validate(config: &ServiceNowConfig) -> Result<()> {
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;

    println!("✓ Configuration is valid");
    Ok(())
}

fn show_schema() -> Result<()> {
    let schema = schemars::schema_for!(ServiceNowConfig);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}
