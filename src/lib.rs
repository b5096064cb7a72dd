//! romsearch - fuzzy ROM title search
//!
//! A Rust CLI and library that matches free-text game titles against files
//! spread over several prioritized source folders, with a per-system
//! inventory cache keyed by folder fingerprints.
//!
//! # Modules
//!
//! - [`scanner`]: title normalization, folder walking and fingerprints
//! - [`cache`]: per-system cache records and their on-disk store
//! - [`matcher`]: similarity scoring and ranking
//! - [`search`]: the orchestrator tying the above together
//! - [`config`], [`cli`], [`output`], [`error`], [`logging`], [`progress`]:
//!   the command-line surface

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod matcher;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod search;

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use bytesize::ByteSize;

use crate::cache::CacheStore;
use crate::cli::{ClearCacheArgs, Cli, Commands, OutputFormat, SearchArgs, StatsArgs, SystemsArgs};
use crate::config::{validate_system_name, Config};
use crate::error::ExitCode;
use crate::output::{JsonOutput, TextOutput};
use crate::progress::Progress;
use crate::search::{SearchEngine, SearchRequest};

/// Run the application for parsed command-line arguments.
///
/// Initializes logging, loads the layered configuration and dispatches the
/// subcommand.
///
/// # Errors
///
/// Returns an error for invalid configuration or requests, and for I/O
/// failures of the commands that manage the cache. Unreadable sources and
/// cache problems during a search are not errors.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);

    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Search(args) => run_search(config, &args, cli.quiet),
        Commands::Systems(args) => run_systems(config, &args),
        Commands::Stats(args) => run_stats(config, &args),
        Commands::ClearCache(args) => run_clear_cache(config, &args),
    }
}

fn run_search(mut config: Config, args: &SearchArgs, quiet: bool) -> Result<ExitCode> {
    args.apply_to(&mut config);
    let engine = SearchEngine::from_config(&config, &args.base_dir)?
        .with_progress(Arc::new(Progress::new(quiet)));

    if args.clear_cache {
        validate_system_name(&args.system)?;
        engine
            .clear_cache(Some(args.system.trim()))
            .context("Failed to clear cache")?;
    }

    let report = engine.search_with_stats(&SearchRequest::new(&args.query, &args.system))?;
    let exit_code = ExitCode::from_search(report.outcome.has_matches(), &report.stats);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match args.output {
        OutputFormat::Text => TextOutput::new(&report.outcome)
            .write_to(&mut out)
            .context("Failed to write results")?,
        OutputFormat::Json => JsonOutput::new(&report.outcome, &report.stats, exit_code)
            .write_to(&mut out, true)
            .context("Failed to write results")?,
    }

    Ok(exit_code)
}

fn run_systems(mut config: Config, args: &SystemsArgs) -> Result<ExitCode> {
    args.sources.apply_to(&mut config);
    let engine = SearchEngine::from_config(&config, &args.base_dir)?;
    let systems = engine.list_systems();
    if systems.is_empty() {
        log::warn!("No system folders found under any source");
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for system in &systems {
        writeln!(out, "{system}")?;
    }
    Ok(ExitCode::Success)
}

fn run_stats(mut config: Config, args: &StatsArgs) -> Result<ExitCode> {
    if let Some(cache_dir) = &args.cache_dir {
        config.cache_dir = Some(cache_dir.clone());
    }
    let store = CacheStore::new(config.cache_dir_for(&args.base_dir));
    let summaries = store
        .summaries()
        .with_context(|| format!("Failed to read cache directory {}", store.dir().display()))?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "Cache directory: {}", store.dir().display())?;
    writeln!(out, "Caching: {}", if config.use_cache { "enabled" } else { "disabled" })?;
    writeln!(out, "Threshold: {}", config.threshold)?;
    writeln!(out, "Max results: {}", config.max_results)?;
    writeln!(out, "Sources: {}", config.sources.len())?;
    writeln!(out, "Log level: {}", logging::current_level_name())?;
    writeln!(out, "Cached systems: {}", summaries.len())?;
    for summary in &summaries {
        writeln!(
            out,
            "  {}: {} entries from {} sources, {}, updated {}",
            summary.system,
            summary.entries,
            summary.sources,
            ByteSize::b(summary.total_size),
            summary.updated_at.format("%Y-%m-%d %H:%M:%S UTC")
        )?;
    }
    Ok(ExitCode::Success)
}

fn run_clear_cache(mut config: Config, args: &ClearCacheArgs) -> Result<ExitCode> {
    if let Some(cache_dir) = &args.cache_dir {
        config.cache_dir = Some(cache_dir.clone());
    }
    let system = args.system.as_deref().map(str::trim);
    if let Some(system) = system {
        validate_system_name(system)?;
    }

    let store = CacheStore::new(config.cache_dir_for(&args.base_dir));
    let removed = store.clear(system).context("Failed to clear cache")?;

    let mut out = io::stdout().lock();
    match system {
        Some(system) if removed == 0 => writeln!(out, "No cache for {system}")?,
        Some(system) => writeln!(out, "Cleared cache for {system}")?,
        None => writeln!(out, "Removed {removed} cache files")?,
    }
    Ok(ExitCode::Success)
}
