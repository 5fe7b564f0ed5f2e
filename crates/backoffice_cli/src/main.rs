mod commands;
mod output;

use std::path::PathBuf;

use backoffice_core::config::{self, BackofficeConfig};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use miette::Result;
use tracing::info;

use crate::commands::{Context, parse_assignment};

#[derive(Parser)]
#[command(name = "backoffice")]
#[command(about = "POS back-office master data management")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Backend API base URL (overrides config)
    #[arg(long)]
    base_url: Option<String>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List entity types, or the fields of one
    Schemas {
        /// Entity to describe
        entity: Option<String>,
    },
    /// Show all records of an entity
    List { entity: String },
    /// Show the version of each code applicable on a date
    Applicable {
        entity: String,

        /// Reference date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },
    /// Find records where any field contains the query
    Search { entity: String, query: String },
    /// Add a record
    Add {
        entity: String,

        /// Field values as name=value
        #[arg(value_parser = parse_assignment, required = true)]
        fields: Vec<(String, String)>,
    },
    /// Edit the record at an index from `list`
    Edit {
        entity: String,
        index: usize,

        /// Field values as name=value
        #[arg(value_parser = parse_assignment)]
        fields: Vec<(String, String)>,
    },
    /// Delete the record at an index from `list`
    Delete {
        entity: String,
        index: usize,

        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Save current configuration to file
    Save {
        /// Path to save configuration
        #[arg(default_value = "backoffice.toml")]
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .rgb_colors(miette::RgbColors::Preferred)
                .with_cause_chain()
                .color(true)
                .context_lines(5)
                .tab_width(2)
                .break_words(true)
                .build(),
        )
    }))?;
    miette::set_panic_hook();
    let cli = Cli::parse();

    // Initialize tracing
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.debug {
            EnvFilter::new("backoffice_core=debug,backoffice_api=debug,backoffice=debug,warn")
        } else {
            EnvFilter::new("backoffice_core=info,backoffice_api=info,backoffice=info,warn")
        }
    });

    fmt()
        .with_env_filter(filter)
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_timer(tracing_subscriber::fmt::time::LocalTime::rfc_3339())
        .with_writer(std::io::stderr)
        .compact()
        .init();

    // Load configuration
    let mut config = if let Some(config_path) = &cli.config {
        info!("Loading config from: {:?}", config_path);
        config::load_config(config_path).await?
    } else {
        info!("Loading config from standard locations");
        BackofficeConfig::load().await?
    };

    // Apply CLI overrides
    if let Some(base_url) = &cli.base_url {
        info!("Overriding API base URL with: {}", base_url);
        config.api.base_url = base_url.clone();
    }

    tracing::debug!(base_url = %config.api.base_url, timeout_secs = config.api.timeout_secs, "api config");

    if let Commands::Config { cmd } = &cli.command {
        return match cmd {
            ConfigCommands::Show => commands::config::show(&config),
            ConfigCommands::Save { path } => commands::config::save(&config, path).await,
        };
    }

    let ctx = Context::new(config)?;
    match cli.command {
        Commands::Schemas { entity } => commands::schemas::show(&ctx, entity.as_deref())?,
        Commands::List { entity } => commands::records::list(&ctx, &entity).await?,
        Commands::Applicable { entity, as_of } => {
            commands::records::applicable(&ctx, &entity, as_of).await?
        }
        Commands::Search { entity, query } => {
            commands::records::search(&ctx, &entity, &query).await?
        }
        Commands::Add { entity, fields } => commands::form::add(&ctx, &entity, &fields).await?,
        Commands::Edit {
            entity,
            index,
            fields,
        } => commands::form::edit(&ctx, &entity, index, &fields).await?,
        Commands::Delete { entity, index, yes } => {
            commands::form::delete(&ctx, &entity, index, yes).await?
        }
        // Handled before the API client is built
        Commands::Config { .. } => {}
    }

    Ok(())
}
