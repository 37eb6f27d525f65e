use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, EnvFilter};

use crate::app::App;
use crate::config::{ConfigLoader, CONFIG_ENV, DATA_ENV};
use crate::storage;

pub mod commands;

use self::commands::{CatalogArgs, ConfirmArgs, ExportArgs, IdArgs, ImportArgs, ListArgs};

#[derive(Parser, Debug)]
#[command(
    name = "dreamshelf",
    version,
    about = "Browse and curate your collected dreams from the terminal"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Override the config file location (takes precedence over DREAMSHELF_CONFIG)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override the data directory (takes precedence over DREAMSHELF_DATA)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Minimum log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Launch the interactive TUI (default)
    Tui,
    /// Print collected dreams, filtered and sorted
    List(ListArgs),
    /// Print one dream in full
    Show(IdArgs),
    /// Mark a dream as collected
    Collect(ConfirmArgs),
    /// Remove a dream from the collection
    Uncollect(ConfirmArgs),
    /// Delete a dream from history
    Delete(ConfirmArgs),
    /// Copy a dream's content to the clipboard
    Share(IdArgs),
    /// Merge dreams from a JSON file into history
    Import(ImportArgs),
    /// Write the stored history as JSON
    Export(ExportArgs),
    /// Print the items of a category page
    Catalog(CatalogArgs),
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.config {
        env::set_var(CONFIG_ENV, path);
    }
    if let Some(path) = &cli.data_dir {
        env::set_var(DATA_ENV, path);
    }

    let loader = ConfigLoader::discover()?;
    loader.paths().ensure_directories()?;
    init_tracing(&cli.log_level)
        .with_context(|| format!("initialising logging at level {}", cli.log_level))?;
    let config = loader.load_or_init()?;
    let storage = storage::init(&config.storage)?;

    let config = Arc::new(config);
    let command = cli.command.unwrap_or(Commands::Tui);
    match command {
        Commands::Tui => {
            let mut app = App::new(config.clone(), storage.history());
            commands::run_tui(&mut app)
        }
        Commands::List(args) => commands::list(&config, storage, args),
        Commands::Show(args) => commands::show(storage, args),
        Commands::Collect(args) => commands::collect(storage, args, true),
        Commands::Uncollect(args) => commands::collect(storage, args, false),
        Commands::Delete(args) => commands::delete(storage, args),
        Commands::Share(args) => commands::share(storage, args),
        Commands::Import(args) => commands::import(storage, args),
        Commands::Export(args) => commands::export(storage, args),
        Commands::Catalog(args) => commands::catalog(args),
    }
}

fn init_tracing(level: &str) -> Result<()> {
    static INIT: OnceCell<()> = OnceCell::new();
    INIT.get_or_try_init(|| {
        let env_filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
        fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(|err| anyhow::anyhow!(err))
    })
    .map(|_| ())
}
