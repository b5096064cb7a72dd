//! Structured error handling and exit codes.

use serde::Serialize;

use crate::search::SearchStats;

/// Exit codes for the romsearch binary.
///
/// - 0: Success (matches found)
/// - 1: General error (unexpected failure)
/// - 2: No matches (search completed, nothing reached the threshold)
/// - 3: Partial success (matches found, but at least one source was unreadable)
/// - 4: Invalid configuration (request rejected before scanning)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Success: matches were found.
    Success = 0,
    /// General error: an unexpected error occurred.
    GeneralError = 1,
    /// No matches: the search completed without results.
    NoMatches = 2,
    /// Partial success: matches were found but some sources were degraded.
    PartialSuccess = 3,
    /// Invalid configuration: sources, threshold or system name were rejected.
    InvalidConfig = 4,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "RS000",
            Self::GeneralError => "RS001",
            Self::NoMatches => "RS002",
            Self::PartialSuccess => "RS003",
            Self::InvalidConfig => "RS004",
        }
    }

    /// Exit code for a completed search.
    ///
    /// No matches wins over degradation: a degraded search with no results
    /// reports [`ExitCode::NoMatches`].
    #[must_use]
    pub fn from_search(has_matches: bool, stats: &SearchStats) -> Self {
        match (has_matches, stats.is_degraded()) {
            (false, _) => Self::NoMatches,
            (true, true) => Self::PartialSuccess,
            (true, false) => Self::Success,
        }
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "RS001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message
    pub message: String,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{err:#}"),
        }
    }
}

/// Pick the exit code for an error returned by the application.
///
/// Configuration and search-rejection errors anywhere in the chain map to
/// [`ExitCode::InvalidConfig`]; everything else is a general error.
#[must_use]
pub fn exit_code_for(err: &anyhow::Error) -> ExitCode {
    let is_config = err.chain().any(|cause| {
        cause.is::<crate::config::ConfigError>() || cause.is::<crate::search::SearchError>()
    });
    if is_config {
        ExitCode::InvalidConfig
    } else {
        ExitCode::GeneralError
    }
}
