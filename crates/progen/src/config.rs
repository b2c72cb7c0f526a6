//! Configuration for progen
//!
//! Settings come from built-in defaults, then a TOML file
//! (`$PROGEN_HOME/config.toml` or `--config <file>`), then command line flags.

use crate::args::{Occurrence, Options};
use crate::classify::{ClassifyRules, DEFAULT_HEADER_PATTERNS, DEFAULT_SOURCE_PATTERNS};
use crate::error::{ProgenError, Result};
use crate::scanner::{ScanConfig, ScanMode};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name of the configuration inside the progen home directory
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Main configuration for progen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgenConfig {
    /// Reaction to unreadable directories and symlink loops
    #[serde(default)]
    pub scan_mode: ScanMode,

    /// Descend into symlinked directories
    #[serde(default = "default_follow_symlinks")]
    pub follow_symlinks: bool,

    /// Include entries whose name starts with `.`
    #[serde(default)]
    pub include_hidden: bool,

    /// File name patterns per project variable
    #[serde(default)]
    pub patterns: PatternConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Header and source glob patterns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternConfig {
    #[serde(default = "default_header_patterns")]
    pub headers: Vec<String>,

    #[serde(default = "default_source_patterns")]
    pub sources: Vec<String>,
}

/// Logging settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Directory for the rolling log file; no file logging when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,

    /// `EnvFilter` directive, e.g. `progen=debug`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,

    /// Debug-level console output
    #[serde(default)]
    pub verbose: bool,
}

fn default_follow_symlinks() -> bool {
    true
}

fn default_header_patterns() -> Vec<String> {
    DEFAULT_HEADER_PATTERNS.iter().map(|s| s.to_string()).collect()
}

fn default_source_patterns() -> Vec<String> {
    DEFAULT_SOURCE_PATTERNS.iter().map(|s| s.to_string()).collect()
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            headers: default_header_patterns(),
            sources: default_source_patterns(),
        }
    }
}

impl Default for ProgenConfig {
    fn default() -> Self {
        Self {
            scan_mode: ScanMode::default(),
            follow_symlinks: default_follow_symlinks(),
            include_hidden: false,
            patterns: PatternConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl ProgenConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ProgenError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        toml::from_str(&content)
            .map_err(|e| ProgenError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ProgenError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Resolve the file configuration.
    ///
    /// An explicit path must exist. Otherwise `<home>/config.toml` is used
    /// when present, and defaults when not.
    pub fn resolve(explicit: Option<&Path>, home: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            debug!(path = %path.display(), "Loading configuration");
            return Self::load(path);
        }

        let discovered = home.join(CONFIG_FILE_NAME);
        if discovered.is_file() {
            debug!(path = %discovered.display(), "Loading configuration");
            return Self::load(&discovered);
        }

        Ok(Self::default())
    }

    /// Apply command line flags on top of the file configuration.
    pub fn apply_options(&mut self, options: &Options) {
        if options.present("strict") {
            self.scan_mode = ScanMode::Strict;
        }
        if options.present("include-hidden") {
            self.include_hidden = true;
        }
        if options.present("no-follow-symlinks") {
            self.follow_symlinks = false;
        }
        if options.present("verbose") {
            self.logging.verbose = true;
        }
        if let Some(dir) = options.value("log-dir", Occurrence::Last) {
            self.logging.directory = Some(PathBuf::from(dir));
        }
    }

    /// Compile the configured patterns.
    pub fn rules(&self) -> Result<ClassifyRules> {
        ClassifyRules::from_patterns(&self.patterns.headers, &self.patterns.sources)
    }

    /// Build the scanner configuration.
    pub fn scan_config(&self) -> Result<ScanConfig> {
        Ok(ScanConfig {
            rules: self.rules()?,
            mode: self.scan_mode,
            follow_symlinks: self.follow_symlinks,
            include_hidden: self.include_hidden,
        })
    }
}
