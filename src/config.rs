//! Source descriptors and layered application configuration.
//!
//! Configuration is merged with `figment` in the following order, later
//! layers winning:
//!
//! 1. Built-in defaults ([`Config::default`])
//! 2. TOML file (`--config PATH`, or `config.toml` in the platform config dir)
//! 3. Environment variables prefixed with `ROMSEARCH_` (`__` for nesting)
//! 4. CLI flags, applied by the binary after extraction
//!
//! Source descriptors are validated once into a [`SourceSet`] before any
//! scanning happens. Invalid sources reject the whole request.
//!
//! # Example
//!
//! ```
//! use romsearch::config::{SourceSet, SourceSpec};
//! use std::path::Path;
//!
//! let specs: Vec<SourceSpec> = vec![
//!     "Official:Official:100".parse().unwrap(),
//!     "Translations:Translations:200".parse().unwrap(),
//! ];
//! let sources = SourceSet::resolve(Path::new("/roms"), &specs).unwrap();
//! assert_eq!(sources.len(), 2);
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::matcher::MatchConfig;
use crate::scanner::ScanConfig;

/// Default minimum similarity score (0-100).
pub const DEFAULT_THRESHOLD: f64 = 40.0;

/// Default cap on returned results.
pub const DEFAULT_MAX_RESULTS: usize = 50;

/// Cache directory created under the base directory when none is configured.
pub const DEFAULT_CACHE_DIR_NAME: &str = ".rom_cache";

/// Environment variable prefix for configuration overrides.
pub const ENV_PREFIX: &str = "ROMSEARCH_";

/// Errors that reject a request before any scanning occurs.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// No sources were configured.
    #[error("No sources configured")]
    NoSources,

    /// A source has an empty name.
    #[error("Source name cannot be empty")]
    EmptySourceName,

    /// A source has no path.
    #[error("Source '{0}' has an empty path")]
    EmptySourcePath(String),

    /// Two sources share a name (case-insensitive).
    #[error("Duplicate source name: {0}")]
    DuplicateSourceName(String),

    /// Two sources resolve to the same path (case-insensitive).
    #[error("Duplicate source path: {0}")]
    DuplicateSourcePath(PathBuf),

    /// A priority is negative or not a number.
    #[error("Invalid priority for source '{name}': {value}")]
    InvalidPriority {
        /// Source name
        name: String,
        /// Offending value
        value: String,
    },

    /// A `name:path:priority` descriptor could not be parsed.
    #[error("Invalid source descriptor '{0}', expected NAME:PATH:PRIORITY")]
    InvalidSourceDescriptor(String),

    /// Threshold outside 0..=100.
    #[error("Threshold must be between 0 and 100, got {0}")]
    InvalidThreshold(f64),

    /// Result cap of zero.
    #[error("Maximum results must be at least 1")]
    InvalidMaxResults,

    /// System names are used as directory and cache file names.
    #[error("Invalid system name: '{0}'")]
    InvalidSystem(String),

    /// The candidate extension set is empty.
    #[error("At least one file extension must be configured")]
    NoExtensions,

    /// An explicitly requested config file does not exist.
    #[error("Config file not found: {0}")]
    ConfigFileNotFound(PathBuf),

    /// Figment failed to extract the merged configuration.
    #[error("Failed to load configuration: {0}")]
    Load(String),
}

/// Unvalidated source descriptor as it appears in config files or on the CLI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpec {
    /// Unique name, compared case-insensitively.
    pub name: String,
    /// Absolute path, or relative to the base directory.
    pub path: PathBuf,
    /// Higher wins ties. Must be non-negative.
    pub priority: i64,
}

impl SourceSpec {
    /// Create a descriptor.
    #[must_use]
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, priority: i64) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            priority,
        }
    }
}

impl FromStr for SourceSpec {
    type Err = ConfigError;

    /// Parse `NAME:PATH:PRIORITY`.
    ///
    /// The name ends at the first colon and the priority starts after the
    /// last, so paths such as `C:\roms` keep their drive letter.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidSourceDescriptor(s.to_string());

        let (name, rest) = s.split_once(':').ok_or_else(invalid)?;
        let (path, priority) = rest.rsplit_once(':').ok_or_else(invalid)?;
        let name = name.trim();
        let path = path.trim();
        if path.is_empty() {
            return Err(invalid());
        }

        let priority = priority
            .trim()
            .parse::<i64>()
            .map_err(|_| ConfigError::InvalidPriority {
                name: name.to_string(),
                value: priority.trim().to_string(),
            })?;

        Ok(Self::new(name, path, priority))
    }
}

/// A validated, immutable source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    name: String,
    root: PathBuf,
    priority: u32,
}

impl Source {
    /// Source name as configured.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolved root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Tie-break priority, higher preferred.
    #[must_use]
    pub fn priority(&self) -> u32 {
        self.priority
    }

    /// Folder holding this source's files for `system`.
    #[must_use]
    pub fn system_dir(&self, system: &str) -> PathBuf {
        self.root.join(system)
    }
}

/// Ordered, validated list of sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSet {
    sources: Vec<Source>,
}

impl SourceSet {
    /// Validate descriptors and resolve relative paths against `base_dir`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the list is empty, a name is empty or
    /// duplicated, two paths collide, or a priority is negative or too large.
    pub fn resolve(base_dir: &Path, specs: &[SourceSpec]) -> Result<Self, ConfigError> {
        if specs.is_empty() {
            return Err(ConfigError::NoSources);
        }

        let base_dir = std::path::absolute(base_dir).unwrap_or_else(|_| base_dir.to_path_buf());
        let mut names = HashSet::new();
        let mut paths = HashSet::new();
        let mut sources = Vec::with_capacity(specs.len());

        for spec in specs {
            let name = spec.name.trim();
            if name.is_empty() {
                return Err(ConfigError::EmptySourceName);
            }
            if !names.insert(name.to_lowercase()) {
                return Err(ConfigError::DuplicateSourceName(name.to_string()));
            }

            let priority =
                u32::try_from(spec.priority).map_err(|_| ConfigError::InvalidPriority {
                    name: name.to_string(),
                    value: spec.priority.to_string(),
                })?;

            if spec.path.as_os_str().to_string_lossy().trim().is_empty() {
                return Err(ConfigError::EmptySourcePath(name.to_string()));
            }
            let root = if spec.path.is_absolute() {
                spec.path.clone()
            } else {
                base_dir.join(&spec.path)
            };
            if !paths.insert(path_key(&root)) {
                return Err(ConfigError::DuplicateSourcePath(root));
            }

            sources.push(Source {
                name: name.to_string(),
                root,
                priority,
            });
        }

        Ok(Self { sources })
    }

    /// Iterate sources in configured order.
    pub fn iter(&self) -> impl Iterator<Item = &Source> {
        self.sources.iter()
    }

    /// Sources as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[Source] {
        &self.sources
    }

    /// Look up a source by name, case-insensitively.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Source> {
        self.sources
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
    }

    /// Number of sources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Whether the set is empty. Never true for a resolved set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

/// Case-insensitive comparison key, ignoring trailing separators.
fn path_key(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().to_lowercase())
        .collect::<Vec<_>>()
        .join("/")
}

/// Reject system names that could escape the source or cache directories.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidSystem`] for empty names, `.`/`..`, or names
/// containing path separators.
pub fn validate_system_name(system: &str) -> Result<(), ConfigError> {
    let trimmed = system.trim();
    if trimmed.is_empty()
        || trimmed == "."
        || trimmed == ".."
        || trimmed.contains(['/', '\\'])
        || trimmed.contains('\0')
    {
        return Err(ConfigError::InvalidSystem(system.to_string()));
    }
    Ok(())
}

/// Candidate file extensions recognized by default.
pub const DEFAULT_EXTENSIONS: &[&str] = &[
    "zip", "7z", "rar", "sfc", "smc", "smd", "gen", "nes", "gb", "gbc", "gba", "n64", "z64", "v64",
    "iso", "cue", "bin", "img", "rom", "sms", "gg", "pce", "ws", "wsc", "ngp", "ngc", "lynx",
    "jag", "32x", "sat", "cdi", "chd", "nds", "fds", "nsf", "spc", "psf", "minipsf", "psf2", "ssf",
    "dsf", "gsf", "usf", "rsn", "sap", "sid", "gym", "vgm", "vgz",
];

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Minimum similarity score (0-100) a result must reach.
    pub threshold: f64,
    /// Maximum number of results returned.
    pub max_results: usize,
    /// Cache directory. Defaults to `<base_dir>/.rom_cache`.
    pub cache_dir: Option<PathBuf>,
    /// Whether to read and write the inventory cache.
    pub use_cache: bool,
    /// Candidate file extensions, without the dot.
    pub extensions: Vec<String>,
    /// Skip hidden files and directories while scanning.
    pub skip_hidden: bool,
    /// Follow symbolic links while scanning.
    pub follow_symlinks: bool,
    /// Sources in priority-agnostic configured order.
    pub sources: Vec<SourceSpec>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            max_results: DEFAULT_MAX_RESULTS,
            cache_dir: None,
            use_cache: true,
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| (*e).to_string()).collect(),
            skip_hidden: true,
            follow_symlinks: false,
            sources: vec![
                SourceSpec::new("Official", "Official", 100),
                SourceSpec::new("Translations", "Translations", 200),
            ],
        }
    }
}

impl Config {
    /// Build the layered figment: defaults, TOML file, then environment.
    ///
    /// When `config_file` is `None` the platform config path is used if it
    /// exists.
    #[must_use]
    pub fn figment(config_file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));

        let file = config_file
            .map(Path::to_path_buf)
            .or_else(Self::default_config_path);
        if let Some(path) = file {
            figment = figment.merge(Toml::file(path));
        }

        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load and validate the merged configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ConfigFileNotFound`] if an explicit file is
    /// missing, [`ConfigError::Load`] if extraction fails, or any validation
    /// error from [`Config::validate`].
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_file {
            if !path.is_file() {
                return Err(ConfigError::ConfigFileNotFound(path.to_path_buf()));
            }
        }

        let config: Config = Self::figment(config_file)
            .extract()
            .map_err(|e| ConfigError::Load(e.to_string()))?;
        log::debug!("Loaded configuration: {:?}", config);
        Ok(config)
    }

    /// Check value ranges. Sources are validated separately by [`SourceSet::resolve`].
    ///
    /// # Errors
    ///
    /// Returns the first invalid setting found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=100.0).contains(&self.threshold) {
            return Err(ConfigError::InvalidThreshold(self.threshold));
        }
        if self.max_results == 0 {
            return Err(ConfigError::InvalidMaxResults);
        }
        if self.extensions.iter().all(|e| e.trim().is_empty()) {
            return Err(ConfigError::NoExtensions);
        }
        Ok(())
    }

    /// Resolve configured sources against `base_dir`.
    ///
    /// # Errors
    ///
    /// See [`SourceSet::resolve`].
    pub fn source_set(&self, base_dir: &Path) -> Result<SourceSet, ConfigError> {
        SourceSet::resolve(base_dir, &self.sources)
    }

    /// Cache directory for a given base directory.
    #[must_use]
    pub fn cache_dir_for(&self, base_dir: &Path) -> PathBuf {
        self.cache_dir
            .clone()
            .unwrap_or_else(|| base_dir.join(DEFAULT_CACHE_DIR_NAME))
    }

    /// Scanner settings derived from this configuration.
    #[must_use]
    pub fn scan_config(&self) -> ScanConfig {
        ScanConfig::new(self.extensions.as_slice())
            .with_skip_hidden(self.skip_hidden)
            .with_follow_symlinks(self.follow_symlinks)
    }

    /// Matcher settings derived from this configuration.
    #[must_use]
    pub fn match_config(&self) -> MatchConfig {
        MatchConfig::new(self.threshold, self.max_results)
    }

    /// Platform-specific config file path, if it exists.
    #[must_use]
    pub fn default_config_path() -> Option<PathBuf> {
        let path = ProjectDirs::from("com", "romsearch", "romsearch")?
            .config_dir()
            .join("config.toml");
        path.is_file().then_some(path)
    }
}
