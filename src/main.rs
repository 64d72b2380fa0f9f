//! # DevKB CLI (`devkb`)
//!
//! Indexes a codebase's file names, keeps a flat-file knowledge directory,
//! and starts the REST API.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `devkb init` | Write `.devkb.json` and create the data directories |
//! | `devkb index` | Walk the index paths and write `files.json` |
//! | `devkb search <query>` | Search indexed file names |
//! | `devkb ask <question>` | Templated answer over the knowledge directory |
//! | `devkb add <type>` | Add a knowledge entry |
//! | `devkb list` | List knowledge entries |
//! | `devkb stats` | Show index and knowledge counts |
//! | `devkb serve` | Start the REST API |
//!
//! ## Examples
//!
//! ```bash
//! devkb index --paths ./src,./docs --force
//! devkb search config --type rs --limit 5
//! devkb add decision -t "Use JWT" -c "We chose JWT for stateless auth" --tags auth,jwt
//! devkb list --type decision
//! devkb serve --bind 0.0.0.0:3001
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use devkb::{config, indexer, knowledge, server, stats};
use devkb_core::models::EntryType;

/// DevKB: a developer knowledge base.
#[derive(Parser)]
#[command(
    name = "devkb",
    about = "Developer Knowledge Base - CLI tool for indexing and querying your codebase",
    version
)]
struct Cli {
    /// Path to the configuration file (JSON).
    ///
    /// Missing or malformed files fall back to built-in defaults.
    #[arg(long, global = true, default_value = ".devkb.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize DevKB in the current directory.
    ///
    /// Writes the config file and creates `<dataDir>/knowledge/` and
    /// `<dataDir>/index/`. Overwrites an existing config.
    Init,

    /// Index codebase files for searching.
    Index {
        /// Comma-separated paths to index (overrides `indexPaths`).
        #[arg(short, long)]
        paths: Option<String>,

        /// Rebuild even if an index already exists.
        #[arg(short, long)]
        force: bool,
    },

    /// Search indexed file names.
    Search {
        query: String,

        /// Only files with this extension (`rs` or `.rs`).
        #[arg(short = 't', long = "type")]
        file_type: Option<String>,

        /// Maximum number of results.
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },

    /// Ask a question about your knowledge entries.
    Ask { question: String },

    /// Add a knowledge entry (code|doc|decision|conversation|architecture|process).
    Add {
        entry_type: EntryType,

        #[arg(short, long)]
        title: Option<String>,

        #[arg(short, long)]
        content: Option<String>,

        /// Comma-separated tags.
        #[arg(long)]
        tags: Option<String>,
    },

    /// List all knowledge entries.
    List {
        /// Only entries of this type.
        #[arg(short = 't', long = "type")]
        entry_type: Option<EntryType>,
    },

    /// Show DevKB statistics.
    Stats,

    /// Start the REST API server.
    ///
    /// Entries created through the API live in memory only and are not
    /// visible to the other commands.
    Serve {
        /// Address to bind (overrides `server.bind` and `PORT`).
        #[arg(long)]
        bind: Option<String>,
    },
}

fn init_tracing(default_directive: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_directive = match cli.command {
        Commands::Serve { .. } => "info",
        _ => "warn",
    };
    init_tracing(default_directive);

    let load = || config::load_config(&cli.config);

    match cli.command {
        Commands::Init => {
            config::run_init(&cli.config)?;
        }
        Commands::Index { paths, force } => {
            indexer::run_index(&load(), paths.as_deref(), force)?;
        }
        Commands::Search {
            query,
            file_type,
            limit,
        } => {
            indexer::run_search(&load(), &query, file_type.as_deref(), limit)?;
        }
        Commands::Ask { question } => {
            knowledge::run_ask(&load(), &question)?;
        }
        Commands::Add {
            entry_type,
            title,
            content,
            tags,
        } => {
            knowledge::run_add(
                &load(),
                entry_type,
                title.as_deref(),
                content.as_deref(),
                tags.as_deref(),
            )?;
        }
        Commands::List { entry_type } => {
            knowledge::run_list(&load(), entry_type)?;
        }
        Commands::Stats => {
            stats::run_stats(&load())?;
        }
        Commands::Serve { bind } => {
            let mut cfg = load();
            cfg.server.bind = config::resolve_bind(&cfg, bind.as_deref());
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
