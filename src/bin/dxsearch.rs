// Command-line access to Doxygen search data
//
// Usage:
//   dxsearch query doc/html/search make_dev
//   dxsearch query doc/html/search/all_a.js max --prefix --json
//   dxsearch check doc/html/search --strict
//   dxsearch roundtrip doc/html/search/all_a.js

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use doxy_search_index::{
    CatalogHit, SearchCatalog, SearchEntry, SearchIndex, parse_search_data, write_search_data,
};

#[derive(Parser)]
#[command(name = "dxsearch", about = "Query and validate Doxygen search indexes")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Find entries whose key contains (or starts with) a term
    Query {
        /// Shard file (`all_a.js`) or search directory
        path: PathBuf,
        term: String,
        /// Only match key prefixes
        #[arg(long)]
        prefix: bool,
        /// Section to search when PATH is a directory
        #[arg(long)]
        section: Option<String>,
        #[arg(long, default_value_t = 50)]
        limit: usize,
        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Validate table invariants
    Check {
        path: PathBuf,
        /// Also require every key to equal its label's search id
        #[arg(long)]
        strict: bool,
    },
    /// Verify that parse + write reproduces a shard byte for byte
    Roundtrip { file: PathBuf },
}

fn print_entries<'a>(hits: impl IntoIterator<Item = (Option<&'a str>, &'a SearchEntry)>, json: bool) -> Result<()> {
    let hits: Vec<(Option<&str>, &SearchEntry)> = hits.into_iter().collect();

    if json {
        let data: Vec<serde_json::Value> = hits
            .iter()
            .map(|(section, entry)| {
                serde_json::json!({
                    "section": section,
                    "key": entry.key,
                    "label": entry.display_label(),
                    "locations": entry.locations,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&data)?);
        return Ok(());
    }

    for (_, entry) in &hits {
        println!("{}", entry.display_label());
        for location in &entry.locations {
            let scope = location.display_scope();
            if scope.is_empty() {
                println!("    {}", location.url);
            } else {
                println!("    {:<40} {}", scope, location.url);
            }
        }
    }
    eprintln!("{} result(s)", hits.len());
    Ok(())
}

fn query(path: &Path, term: &str, prefix: bool, section: Option<&str>, limit: usize, json: bool) -> Result<()> {
    if path.is_dir() {
        let catalog = SearchCatalog::load(path)?;
        let hits: Vec<CatalogHit<'_>> = if prefix {
            catalog.search_prefix(section, term, limit)
        } else {
            catalog.search(section, term, limit)
        };
        print_entries(hits.iter().map(|h| (Some(h.section), h.entry)), json)
    } else {
        let index = SearchIndex::load(path)?;
        let hits = if prefix {
            index.search_prefix(term, limit)
        } else {
            index.search(term).into_iter().take(limit).collect()
        };
        print_entries(hits.into_iter().map(|e| (None, e)), json)
    }
}

fn check(path: &Path, strict: bool) -> Result<()> {
    let mut mismatches: Vec<String> = Vec::new();

    if path.is_dir() {
        let catalog = SearchCatalog::load(path)?;
        for info in catalog.sections() {
            println!(
                "{:<12} {:>3} shard(s) {:>6} entries",
                info.name, info.shard_count, info.entry_count
            );
            for shard in catalog.shards(&info.name) {
                mismatches.extend(
                    shard
                        .index
                        .check_search_ids()
                        .into_iter()
                        .map(|key| format!("{}: {}", shard.file_name, key)),
                );
            }
        }
    } else {
        let index = SearchIndex::load(path)?;
        let stats = index.stats();
        println!(
            "{} entries, {} locations, {} pages",
            stats.entry_count, stats.location_count, stats.page_count
        );
        mismatches.extend(index.check_search_ids().into_iter().map(str::to_string));
    }

    if strict && !mismatches.is_empty() {
        for key in &mismatches {
            eprintln!("key does not match label: {}", key);
        }
        bail!("{} key(s) do not match their labels", mismatches.len());
    }

    println!("OK");
    Ok(())
}

fn roundtrip(file: &Path) -> Result<()> {
    let original = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let entries = parse_search_data(&original)
        .with_context(|| format!("Failed to parse {}", file.display()))?;
    let rewritten = write_search_data(&entries);

    if rewritten == original {
        println!("{}: identical ({} entries)", file.display(), entries.len());
        return Ok(());
    }

    let offset = original
        .bytes()
        .zip(rewritten.bytes())
        .position(|(a, b)| a != b)
        .unwrap_or_else(|| original.len().min(rewritten.len()));
    bail!("{}: output differs from input at byte {}", file.display(), offset);
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "doxy_search_index=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        Command::Query { path, term, prefix, section, limit, json } => {
            query(&path, &term, prefix, section.as_deref(), limit, json)
        }
        Command::Check { path, strict } => check(&path, strict),
        Command::Roundtrip { file } => roundtrip(&file),
    }
}
