//! # Command Line Interface
//!
//! Migrates SMTP authentication records and browses the configured
//! credential store.

pub mod output;

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::config::AppConfig;
use crate::domain::CredentialsId;
use crate::observability::{init_logging, log_config_info};
use crate::secrets::{open_store, CallerContext, CredentialSelector, ProviderSelector};
use crate::services::{unavailable_loader, MigrationOutcome, SmtpAuthenticationLoader};
use output::{print_credential, print_json, print_options_table, RecordSummary};

#[derive(Parser)]
#[command(name = "smtp-credentials")]
#[command(about = "Move inline SMTP authentication details into a credential store")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// TOML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load a record and migrate its inline credentials
    Migrate {
        /// Path to the SMTP authentication record
        record: PathBuf,

        /// Dry run - report what would be migrated
        #[arg(long)]
        dry_run: bool,
    },

    /// Show a record's state without migrating it
    Inspect {
        /// Path to the SMTP authentication record
        record: PathBuf,
    },

    /// Credential store commands
    Credentials {
        #[command(subcommand)]
        command: CredentialsCommands,
    },
}

#[derive(Subcommand)]
pub enum CredentialsCommands {
    /// List selectable username/password credentials
    List,

    /// Show one credential
    Show {
        /// Credential id
        id: String,
    },
}

/// Run CLI commands
pub async fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if cli.verbose {
        config.observability.log_level = "debug".to_string();
    }
    init_logging(&config.observability)?;
    log_config_info(&config);

    match cli.command {
        Commands::Migrate { record, dry_run } => handle_migrate(&config, &record, dry_run).await?,
        Commands::Inspect { record } => handle_inspect(&config, &record).await?,
        Commands::Credentials { command } => handle_credentials_command(&config, command).await?,
    }

    Ok(())
}

/// Loader over the configured store; a store that cannot be opened only
/// fails records that still need migrating.
async fn loader_for(config: &AppConfig) -> SmtpAuthenticationLoader {
    match open_store(&config.store).await {
        Ok(handle) => SmtpAuthenticationLoader::from_config(handle.store, &config.migration),
        Err(e) => {
            tracing::warn!(
                store = %config.store.backend,
                error = %e,
                "Credential store could not be opened"
            );
            unavailable_loader(config.store.backend.as_str(), e.to_string(), &config.migration)
        }
    }
}

async fn handle_migrate(config: &AppConfig, record: &Path, dry_run: bool) -> anyhow::Result<()> {
    let loader = loader_for(config).await;

    if dry_run {
        let current = loader.inspect(record).await?;
        if current.requires_migration() {
            println!(
                "Dry run mode - {} holds inline credentials and would be migrated to {}",
                record.display(),
                config.store.backend
            );
        } else {
            println!("Dry run mode - {} already references a stored credential", record.display());
        }
        return Ok(());
    }

    let loaded = loader
        .load(record)
        .await
        .with_context(|| format!("Failed to load {}", record.display()))?;

    match &loaded.outcome {
        MigrationOutcome::Migrated { credentials_id, attempts } => {
            println!(
                "Migrated {} to credential {} after {} attempt(s)",
                record.display(),
                credentials_id,
                attempts
            );
            if !loaded.persisted {
                println!("Record file left unchanged (persistence disabled)");
            }
        }
        MigrationOutcome::AlreadyMigrated => {
            println!("{} already references a stored credential", record.display());
        }
    }

    Ok(())
}

async fn handle_inspect(config: &AppConfig, record: &Path) -> anyhow::Result<()> {
    let current = loader_for(config)
        .await
        .inspect(record)
        .await
        .with_context(|| format!("Failed to read {}", record.display()))?;
    print_json(&RecordSummary::new(record, &current))
}

async fn handle_credentials_command(
    config: &AppConfig,
    command: CredentialsCommands,
) -> anyhow::Result<()> {
    let handle = open_store(&config.store)
        .await
        .with_context(|| format!("Failed to open the {} credential store", config.store.backend))?;
    let selector = ProviderSelector::new(handle.provider);
    let caller = CallerContext::system();

    match command {
        CredentialsCommands::List => {
            let options = selector.list_available(&caller).await?;
            if options.is_empty() {
                println!("No credentials found");
            } else {
                print_options_table(&options);
            }
        }
        CredentialsCommands::Show { id } => {
            let credential = selector.resolve(&caller, &CredentialsId::from(id)).await?;
            print_credential(&credential);
        }
    }

    Ok(())
}
