//! ouilookup: CLI for querying, updating and inspecting the local OUI
//! vendor dataset. Output is JSON on stdout for easy chaining with other
//! toolchains.

use clap::{ArgGroup, Parser};
use ouilookup::{OuiLookup, Result};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ouilookup")]
#[command(version)]
#[command(
    about = "Query the IEEE OUI registry for hardware address vendors",
    long_about = "A CLI for the ouilookup library providing the query(), update() and \
                  status() operations. Output is JSON formatted for easy chaining with \
                  other toolchains. update() fetches directly from standards-oui.ieee.org."
)]
#[command(group(ArgGroup::new("action").args(["query", "status", "update", "update_local"])))]
struct Cli {
    /// Query one or more hardware addresses from the local data file.
    /// Addresses may be written with or without ":" or "-" separators;
    /// separate multiple addresses with spaces or commas
    #[arg(short = 'q', long, value_name = "hwaddr", num_args = 1..)]
    query: Option<Vec<String>>,

    /// Report status metadata about the local data file
    #[arg(short = 's', long)]
    status: bool,

    /// Download the latest registry from standards-oui.ieee.org, then
    /// parse and save it as the local data file
    #[arg(short = 'u', long)]
    update: bool,

    /// Parse a locally supplied oui.txt and save it as the local data file
    #[arg(long, visible_alias = "ul", value_name = "filename")]
    update_local: Option<PathBuf>,

    /// Enable debug logging to stderr
    #[arg(short = 'd', long)]
    debug: bool,

    /// Use a data file outside the default search paths
    #[arg(long, visible_alias = "df", value_name = "data-file")]
    data_file: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();

    init_logging(cli.debug);

    if cli.query.is_none() && !cli.status && !cli.update && cli.update_local.is_none() {
        use clap::CommandFactory;
        let _ = Cli::command().print_help();
        std::process::exit(1);
    }

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut lookup = match cli.data_file {
        Some(ref path) => OuiLookup::with_data_file(path),
        None => OuiLookup::new(),
    };

    if cli.update {
        print_json(&lookup.update()?)
    } else if let Some(ref source) = cli.update_local {
        print_json(&lookup.update_from_file(source)?)
    } else if cli.status {
        print_json(&lookup.status()?)
    } else if let Some(ref expression) = cli.query {
        print_json(&lookup.query(expression)?)
    } else {
        Ok(())
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    // Serializing our own output types cannot fail.
    let rendered = serde_json::to_string_pretty(value).unwrap_or_default();
    println!("{}", rendered);
    Ok(())
}

/// `OUILOOKUP_DEBUG` (values starting with true/yes/enable) or `-d` raise
/// the default filter to debug; `RUST_LOG` still overrides everything.
fn init_logging(debug_flag: bool) {
    let default_filter = if debug_flag || env_debug_enabled() {
        "debug"
    } else {
        "warn"
    };
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(default_filter),
    )
    .init();
}

fn env_debug_enabled() -> bool {
    std::env::var("OUILOOKUP_DEBUG")
        .map(|v| {
            let v = v.to_lowercase();
            v.starts_with("true") || v.starts_with("yes") || v.starts_with("enable")
        })
        .unwrap_or(false)
}
