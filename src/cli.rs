//! Command-line interface definitions for romsearch.
//!
//! This module defines all CLI arguments, subcommands, and options using the clap derive API.
//! Global options (verbosity, config file, error format) apply to every subcommand.
//! Flags given here override values from the config file and environment.
//!
//! # Example
//!
//! ```bash
//! # Search the SNES folders of the default sources
//! romsearch search /roms "super mario world" SNES
//!
//! # Custom sources, JSON output for scripting
//! romsearch search /roms "zelda" SNES \
//!     --source Official:Official:100 --source Hacks:/mnt/hacks:300 --output json
//!
//! # List systems available across sources
//! romsearch systems /roms
//!
//! # Drop the cached inventory for one system
//! romsearch clear-cache /roms SNES
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::{Config, SourceSpec};

/// Fuzzy ROM title search across prioritized source folders.
///
/// romsearch indexes `<source>/<system>/` folders, caches the inventory per
/// system, and ranks files against a free-text query by source priority and
/// title similarity.
#[derive(Debug, Parser)]
#[command(name = "romsearch")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Configuration file (TOML)
    ///
    /// Defaults to config.toml in the platform configuration directory.
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Print errors as JSON objects on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands for romsearch.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Search a system's sources for a title
    Search(SearchArgs),
    /// List system folders found across all sources
    Systems(SystemsArgs),
    /// Show cache contents and effective settings
    Stats(StatsArgs),
    /// Remove cached inventories
    ClearCache(ClearCacheArgs),
}

/// Source overrides shared by commands that read sources.
#[derive(Debug, Clone, Default, Args)]
pub struct SourceArgs {
    /// Source descriptor NAME:PATH:PRIORITY (repeatable, replaces configured sources)
    ///
    /// Relative paths are resolved against BASE_DIR. Higher priorities rank first.
    #[arg(long = "source", value_name = "NAME:PATH:PRIORITY", value_parser = parse_source)]
    pub sources: Vec<SourceSpec>,
}

impl SourceArgs {
    /// Replace the configured sources when any were given.
    pub fn apply_to(&self, config: &mut Config) {
        if !self.sources.is_empty() {
            config.sources = self.sources.clone();
        }
    }
}

/// Arguments for the search subcommand.
#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Directory holding the source folders
    #[arg(value_name = "BASE_DIR")]
    pub base_dir: PathBuf,

    /// Free-text title query
    #[arg(value_name = "QUERY")]
    pub query: String,

    /// System folder name (e.g. SNES)
    #[arg(value_name = "SYSTEM")]
    pub system: String,

    /// Maximum number of results
    #[arg(short = 'n', long, value_name = "N")]
    pub max_results: Option<usize>,

    /// Minimum similarity score, 0-100
    #[arg(short, long, value_name = "SCORE")]
    pub threshold: Option<f64>,

    /// Cache directory (default: BASE_DIR/.rom_cache)
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    #[command(flatten)]
    pub sources: SourceArgs,

    /// Candidate file extension (repeatable, replaces configured extensions)
    #[arg(short, long = "extension", value_name = "EXT")]
    pub extensions: Vec<String>,

    /// Neither read nor write the inventory cache
    #[arg(long)]
    pub no_cache: bool,

    /// Clear this system's cache before searching
    #[arg(long, conflicts_with = "no_cache")]
    pub clear_cache: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

impl SearchArgs {
    /// Apply flag overrides on top of the loaded configuration.
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(max_results) = self.max_results {
            config.max_results = max_results;
        }
        if let Some(threshold) = self.threshold {
            config.threshold = threshold;
        }
        if let Some(cache_dir) = &self.cache_dir {
            config.cache_dir = Some(cache_dir.clone());
        }
        if !self.extensions.is_empty() {
            config.extensions = self.extensions.clone();
        }
        if self.no_cache {
            config.use_cache = false;
        }
        self.sources.apply_to(config);
    }
}

/// Arguments for the systems subcommand.
#[derive(Debug, Args)]
pub struct SystemsArgs {
    /// Directory holding the source folders
    #[arg(value_name = "BASE_DIR")]
    pub base_dir: PathBuf,

    #[command(flatten)]
    pub sources: SourceArgs,
}

/// Arguments for the stats subcommand.
#[derive(Debug, Args)]
pub struct StatsArgs {
    /// Directory holding the source folders
    #[arg(value_name = "BASE_DIR")]
    pub base_dir: PathBuf,

    /// Cache directory (default: BASE_DIR/.rom_cache)
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,
}

/// Arguments for the clear-cache subcommand.
#[derive(Debug, Args)]
pub struct ClearCacheArgs {
    /// Directory holding the source folders
    #[arg(value_name = "BASE_DIR")]
    pub base_dir: PathBuf,

    /// System to clear; all systems when omitted
    #[arg(value_name = "SYSTEM")]
    pub system: Option<String>,

    /// Cache directory (default: BASE_DIR/.rom_cache)
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,
}

/// Output format for search results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// `display_name|full_path` lines for shell callers
    Text,
    /// JSON with results and statistics
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Parse a `NAME:PATH:PRIORITY` source descriptor.
///
/// # Examples
///
/// ```
/// use romsearch::cli::parse_source;
///
/// let spec = parse_source("Translations:Translations:200").unwrap();
/// assert_eq!(spec.name, "Translations");
/// assert_eq!(spec.priority, 200);
/// ```
///
/// # Errors
///
/// Returns the validation message if the descriptor is malformed or the
/// priority is not an integer.
pub fn parse_source(s: &str) -> Result<SourceSpec, String> {
    s.parse::<SourceSpec>().map_err(|e| e.to_string())
}
