//! Interval Atlas CLI — entry point.

use std::path::Path;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use interval_atlas::catalog::{build, build_all, Collection};
use interval_atlas::flatten::{generate_collection, write_collection, StatsTable};
use interval_atlas::layout::{layout, relation_matrix};
use interval_atlas::lookup::LookupIndex;
use interval_atlas::types::RelationMap;
use interval_atlas_cli::config::{resolve_collection_path, resolve_lookup_path};

#[derive(Parser)]
#[command(
    name = "interval-atlas",
    about = "Decode, inspect, and generate temporal interval pattern catalogs",
    version
)]
struct Cli {
    /// Path to the compact collection JSON.
    #[arg(short, long)]
    collection: Option<String>,

    /// Path to the bin/cutoff lookup table.
    #[arg(short, long)]
    lookup: Option<String>,

    /// Clinical event name shown on every pattern.
    #[arg(short, long, default_value = "AKI")]
    event: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode every pattern and print the catalog as JSON.
    Catalog {
        /// Decode at most this many patterns.
        #[arg(long)]
        max: Option<usize>,
    },

    /// Decode one pattern and print it as JSON.
    Show {
        /// Pattern id.
        id: u64,

        /// Include diagram geometry and the relation matrix.
        #[arg(long)]
        layout: bool,
    },

    /// Check that the collection and lookup table load cleanly.
    Validate,

    /// Flatten a directory of mined model files into a compact collection.
    BuildCollection {
        /// Directory of model files.
        #[arg(long)]
        models: String,

        /// Output collection path.
        #[arg(long)]
        out: String,

        /// Statistics table to join by pattern name.
        #[arg(long)]
        stats: Option<String>,
    },

    /// Generate shell completion scripts.
    ///
    /// Examples:
    ///   interval-atlas completions bash > ~/.local/share/bash-completion/completions/interval-atlas
    ///   interval-atlas completions zsh > ~/.zfunc/_interval-atlas
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let relation_map = RelationMap::standard();

    match cli.command {
        Commands::Catalog { max } => {
            let collection = resolve_collection_path(cli.collection.as_deref());
            let lookup = resolve_lookup_path(cli.lookup.as_deref());
            let catalog = build_all(
                Path::new(&collection),
                Path::new(&lookup),
                &cli.event,
                &relation_map,
                max,
            )?;
            if catalog.skipped > 0 {
                tracing::warn!("Skipped {} unusable collection entries", catalog.skipped);
            }
            println!("{}", serde_json::to_string_pretty(&catalog.patterns)?);
        }

        Commands::Show { id, layout: with_layout } => {
            let collection = resolve_collection_path(cli.collection.as_deref());
            let lookup = resolve_lookup_path(cli.lookup.as_deref());
            let pattern = build(
                Path::new(&collection),
                Path::new(&lookup),
                id,
                &cli.event,
                &relation_map,
            )?;

            if with_layout {
                let geometry = layout(&pattern);
                let matrix = relation_matrix(&pattern);
                let view = serde_json::json!({
                    "pattern": pattern,
                    "layout": geometry,
                    "matrix": matrix,
                });
                println!("{}", serde_json::to_string_pretty(&view)?);
            } else {
                println!("{}", serde_json::to_string_pretty(&pattern)?);
            }
        }

        Commands::Validate => {
            let collection_path = resolve_collection_path(cli.collection.as_deref());
            let lookup_path = resolve_lookup_path(cli.lookup.as_deref());

            let collection = match Collection::read_from_file(Path::new(&collection_path)) {
                Ok(collection) => collection,
                Err(e) => {
                    eprintln!("Invalid collection: {e}");
                    std::process::exit(1);
                }
            };
            let lookup = match LookupIndex::read_from_file(Path::new(&lookup_path)) {
                Ok(lookup) => lookup,
                Err(e) => {
                    eprintln!("Invalid lookup table: {e}");
                    std::process::exit(1);
                }
            };

            println!("Valid collection: {collection_path}");
            println!("  Patterns: {}", collection.len());
            println!("  Dropped keys: {}", collection.skipped_keys());
            println!("Valid lookup table: {lookup_path}");
            println!("  Rows: {}", lookup.row_count());
            println!("  States: {}", lookup.state_count());
            println!("  Skipped rows: {}", lookup.skipped_rows());
        }

        Commands::BuildCollection { models, out, stats } => {
            let lookup_path = resolve_lookup_path(cli.lookup.as_deref());
            let lookup = LookupIndex::read_from_file(Path::new(&lookup_path))?;
            let stats = stats
                .map(|path| StatsTable::read_from_file(Path::new(&path)))
                .transpose()?;

            let entries = generate_collection(Path::new(&models), &lookup, stats.as_ref())?;
            write_collection(&entries, Path::new(&out))?;
            println!("Wrote {out} ({} patterns)", entries.len());
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "interval-atlas", &mut std::io::stdout());
        }
    }

    Ok(())
}
