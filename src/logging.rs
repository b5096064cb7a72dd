//! Logging setup for the `romsearch` binary.
//!
//! The library only uses the `log` macros. The binary installs an
//! `env_logger` backend writing to stderr, so stdout carries nothing but
//! search results.
//!
//! Level selection, highest priority first:
//!
//! 1. `RUST_LOG`, when set
//! 2. `--quiet` (errors only)
//! 3. `-v` info, `-vv` debug, `-vvv` trace
//! 4. warn, so degraded sources and discarded caches are always reported
//!
//! From `-vv` up each record carries a timestamp and its module, which is
//! what you want when following a rescan across sources.
//!
//! # Example
//!
//! ```rust,no_run
//! use romsearch::logging::init_logging;
//!
//! init_logging(2, false);
//! log::debug!("cache hit for SNES");
//! ```

use std::env;
use std::io::Write;

use env_logger::{Builder, Target};
use log::LevelFilter;

/// Environment variable that overrides the CLI flags.
const ENV_FILTER: &str = "RUST_LOG";

/// Map the CLI flags to a level filter.
fn level_for(verbose: u8, quiet: bool) -> LevelFilter {
    match (quiet, verbose) {
        (true, _) => LevelFilter::Error,
        (false, 0) => LevelFilter::Warn,
        (false, 1) => LevelFilter::Info,
        (false, 2) => LevelFilter::Debug,
        (false, _) => LevelFilter::Trace,
    }
}

/// Install the stderr logger.
///
/// Safe to call more than once: later calls leave the first logger in
/// place, which keeps tests that drive [`crate::run_app`] repeatedly from
/// panicking.
///
/// # Arguments
///
/// * `verbose` - Number of `-v` flags
/// * `quiet` - Whether `--quiet` was given
pub fn init_logging(verbose: u8, quiet: bool) {
    let mut builder = Builder::new();
    builder.target(Target::Stderr);

    let from_env = env::var(ENV_FILTER).ok();
    match &from_env {
        Some(filter) => {
            builder.parse_filters(filter);
        }
        None => {
            builder.filter_level(level_for(verbose, quiet));
        }
    }

    let detailed = !quiet && verbose >= 2;
    builder.format(move |buf, record| {
        let level = record.level();
        let style = buf.default_level_style(level);
        if detailed {
            writeln!(
                buf,
                "{} {style}{:<5}{style:#} {}: {}",
                buf.timestamp_millis(),
                level,
                record.target(),
                record.args()
            )
        } else {
            writeln!(buf, "{style}{}{style:#}: {}", level.as_str().to_lowercase(), record.args())
        }
    });

    if builder.try_init().is_err() {
        return;
    }

    match from_env {
        Some(filter) => log::debug!("log filter taken from {}={}", ENV_FILTER, filter),
        None => log::debug!("log level {}", current_level_name()),
    }
}

/// Name of the active maximum log level, as shown by `romsearch stats`.
#[must_use]
pub fn current_level_name() -> &'static str {
    match log::max_level() {
        LevelFilter::Off => "off",
        LevelFilter::Error => "error",
        LevelFilter::Warn => "warn",
        LevelFilter::Info => "info",
        LevelFilter::Debug => "debug",
        LevelFilter::Trace => "trace",
    }
}
