//! artindex: load newline-delimited JSON articles into an OpenSearch index

mod commands;

use anyhow::Result;
use artindex::config::Config;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

#[derive(Parser)]
#[command(name = "artindex")]
#[command(about = "Batch-index newline-delimited JSON articles into OpenSearch")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "artindex.toml")]
    config: PathBuf,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index every article file under the data directory
    Index {
        /// Directory containing article files
        #[arg(short, long)]
        data_dir: Option<PathBuf>,

        /// Destination index
        #[arg(short, long)]
        index: Option<String>,

        /// Articles per bulk request
        #[arg(short, long)]
        batch_size: Option<usize>,

        /// OpenSearch base URL
        #[arg(long)]
        url: Option<String>,

        /// Use article ids as document ids
        #[arg(long)]
        record_ids: bool,

        /// Print the run result as JSON
        #[arg(long)]
        json: bool,

        /// Suppress the progress bar and summary
        #[arg(short, long)]
        quiet: bool,
    },

    /// Write a default configuration file
    Init {
        /// Output path
        #[arg(default_value = "artindex.toml")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = if cli.config.exists() {
        Config::load(&cli.config)?
    } else {
        Config::default()
    };

    config.logging.init(cli.verbose)?;
    debug!("Using configuration {:?}", cli.config);

    match cli.command {
        Commands::Index {
            data_dir,
            index,
            batch_size,
            url,
            record_ids,
            json,
            quiet,
        } => {
            if let Some(data_dir) = data_dir {
                config.indexing.data_dir = data_dir;
            }
            if let Some(index) = index {
                config.indexing.index_name = index;
            }
            if let Some(batch_size) = batch_size {
                config.indexing.batch_size = batch_size;
            }
            if let Some(url) = url {
                config.opensearch.url = url;
            }
            config.indexing.use_record_ids |= record_ids;
            config.opensearch.resolve_password();
            config.validate()?;

            commands::index_articles(config, quiet || json, json)
        }
        Commands::Init { path, force } => commands::init_config(path, force),
    }
}
