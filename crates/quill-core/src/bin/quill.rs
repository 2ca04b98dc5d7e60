//! quill command-line client
//!
//! Syncs a bibliography from the server and inspects it.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use quill_core::quill_domain::{BibEntryStore, StoreHandle};
use quill_core::{
    BibCache, BibSyncClient, FileCache, HttpBibliographyService, QuillConfig, UsedBibliography,
};

#[derive(Parser, Debug)]
#[command(name = "quill")]
#[command(about = "Bibliography sync client for the quill editor", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (.toml or .json); defaults to <config dir>/quill/config.toml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Bibliography owner, 0 for the shared default owner
    #[arg(short, long, global = true, default_value_t = 0)]
    owner: i64,

    /// Ignore the local cache and download the full bibliography
    #[arg(long, global = true)]
    no_cache: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Sync and list entries and categories
    Sync,

    /// Sync, then print the bibliography used by the given citation ids
    Used {
        /// Comma separated citation ids, e.g. 3,5,3
        #[arg(long, value_delimiter = ',', required = true)]
        ids: Vec<String>,
    },
}

fn load_config(path: Option<PathBuf>) -> Result<QuillConfig, Box<dyn std::error::Error>> {
    let path = path.or_else(|| dirs::config_dir().map(|d| d.join("quill").join("config.toml")));
    match path {
        Some(path) if path.exists() => Ok(QuillConfig::load(&path)?),
        _ => Ok(QuillConfig::default()),
    }
}

fn build_client(
    config: &QuillConfig,
    owner: i64,
    no_cache: bool,
) -> Result<BibSyncClient, Box<dyn std::error::Error>> {
    let history_capacity = config.citations.history_capacity;
    let store =
        StoreHandle::new(BibEntryStore::new(owner).with_history_capacity(history_capacity));
    let service = Arc::new(HttpBibliographyService::new(&config.server)?);
    let mut client = BibSyncClient::new(service, store);

    if config.cache.enabled && !no_cache {
        if let Some(dir) = config.cache.resolved_dir() {
            let dir = dir.join(format!("owner-{owner}"));
            tracing::debug!(dir = %dir.display(), "Using bibliography cache");
            client = client.with_cache(BibCache::new(Arc::new(FileCache::new(dir))));
        }
    }
    Ok(client)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config)?;
    let client = build_client(&config, cli.owner, cli.no_cache)?;
    let outcome = client.sync().await?;

    match cli.command {
        Commands::Sync => {
            let store = client.store();
            println!(
                "{} entries, {} categories{}",
                store.len(),
                store.categories().len(),
                if outcome.from_cache { " (from cache)" } else { "" }
            );
            store.read(|s| {
                for entry in s.entries() {
                    let title = entry.field_str("title").unwrap_or("");
                    println!(
                        "{:>6}  {:<24} {:<14} {}",
                        entry.id, entry.entry_key, entry.bib_type, title
                    );
                }
            });
            for category in store.categories() {
                println!("[{}] {}", category.id, category.title);
            }
        }
        Commands::Used { ids } => {
            let used = UsedBibliography::from_ids(ids.iter().map(String::as_str), client.store());
            println!("{}", used.to_json()?);
            if !used.missing.is_empty() {
                eprintln!("Not found: {}", used.missing.join(", "));
            }
        }
    }

    Ok(())
}
