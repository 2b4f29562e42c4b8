//! NeDB CLI
//!
//! Moves collections between the NeDB store and plain JSON files.
//!
//! # Commands
//!
//! - `nedb:import` - Copy a JSON file collection into the store
//! - `nedb:export` - Copy a store collection into a JSON file

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// NeDB storage import/export tools.
#[derive(Parser)]
#[command(name = "nedb")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory holding the NeDB datafiles
    #[arg(global = true, long, default_value = nedb_core::DEFAULT_STORAGE_ROOT)]
    storage_root: PathBuf,

    /// Directory holding the JSON file collections
    #[arg(global = true, long, default_value = nedb_core::DEFAULT_FS_ROOT)]
    fs_root: PathBuf,

    /// Datafile load attempts before giving up (0 retries forever)
    #[arg(global = true, long, default_value_t = nedb_core::LoadRetry::DEFAULT_MAX_ATTEMPTS)]
    load_attempts: u32,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import from FS to NeDB
    #[command(name = "nedb:import")]
    Import {
        /// Storage name
        name: String,

        /// Import path
        import_path: Option<PathBuf>,
    },

    /// Export from NeDB to FS
    #[command(name = "nedb:export")]
    Export {
        /// Storage name
        name: String,

        /// Export path
        export_path: Option<PathBuf>,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let storage = commands::StorageArgs {
        storage_root: cli.storage_root,
        fs_root: cli.fs_root,
        load_attempts: cli.load_attempts,
    };

    match cli.command {
        Commands::Import { name, import_path } => {
            commands::import::run(&storage, &name, import_path.as_deref())?;
        }
        Commands::Export { name, export_path } => {
            commands::export::run(&storage, &name, export_path.as_deref())?;
        }
        Commands::Version => {
            println!("NeDB CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("NeDB Core v{}", nedb_core::VERSION);
        }
    }

    Ok(())
}
