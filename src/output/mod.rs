//! Output formatters for search results.
//!
//! This module provides the formats a caller can consume:
//! - Text: one `display_name|full_path` line per result, for shell callers
//! - JSON: results plus search statistics, for automation
//!
//! Both formats write only to the supplied writer. Logs and progress go to
//! stderr, so stdout can be parsed directly.
//!
//! # Example
//!
//! ```no_run
//! use romsearch::config::Config;
//! use romsearch::output::TextOutput;
//! use romsearch::search::{SearchEngine, SearchRequest};
//! use std::path::Path;
//!
//! let engine = SearchEngine::from_config(&Config::default(), Path::new("/roms")).unwrap();
//! let report = engine.search_with_stats(&SearchRequest::new("zelda", "SNES")).unwrap();
//!
//! TextOutput::new(&report.outcome)
//!     .write_to(&mut std::io::stdout())
//!     .unwrap();
//! ```

pub mod json;
pub mod text;

// Re-export main types
pub use json::{JsonOutput, JsonOutputError};
pub use text::TextOutput;
