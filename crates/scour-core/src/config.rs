//! Configuration handling for scour.
//!
//! Settings live in `.scour/config.toml` at the project root:
//!
//! ```toml
//! [scour]
//! parallel = true
//! max_fix_rounds = 8
//! indent_unit = "    "
//! exclude_paths = ["**/obj/**"]
//!
//! [scour.rules.SC012]
//! enabled = false
//!
//! [scour.rules.SC003]
//! severity = "error"
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::Severity;

/// Directory that marks a project root.
pub const CONFIG_DIR: &str = ".scour";

/// Configuration file inside [`CONFIG_DIR`].
pub const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {message}")]
    Read { path: String, message: String },

    #[error("failed to parse config file: {0}")]
    Parse(String),

    #[error("invalid path pattern '{pattern}': {message}")]
    Pattern { pattern: String, message: String },

    #[error("no .scour directory found above {start}")]
    NotInitialized { start: String },
}

/// Top-level configuration document.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub scour: ScourSettings,
}

/// Engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScourSettings {
    /// Run rule invocations on the rayon pool.
    #[serde(default = "default_parallel")]
    pub parallel: bool,

    /// Upper bound on fix-all analysis rounds.
    #[serde(default = "default_max_fix_rounds")]
    pub max_fix_rounds: usize,

    /// One level of indentation for reformatted fixes.
    #[serde(default = "default_indent_unit")]
    pub indent_unit: String,

    /// Glob patterns for unit paths that are never analyzed.
    #[serde(default)]
    pub exclude_paths: Vec<String>,

    /// Per-rule overrides keyed by rule id.
    #[serde(default)]
    pub rules: BTreeMap<String, RuleSettings>,
}

/// Overrides for one rule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RuleSettings {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default)]
    pub severity: Option<Severity>,
}

fn default_parallel() -> bool {
    true
}

fn default_max_fix_rounds() -> usize {
    8
}

fn default_indent_unit() -> String {
    "    ".to_string()
}

fn default_enabled() -> bool {
    true
}

impl Default for ScourSettings {
    fn default() -> Self {
        Self {
            parallel: default_parallel(),
            max_fix_rounds: default_max_fix_rounds(),
            indent_unit: default_indent_unit(),
            exclude_paths: Vec::new(),
            rules: BTreeMap::new(),
        }
    }
}

impl Default for RuleSettings {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            severity: None,
        }
    }
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load `.scour/config.toml` under `project_root`, or the defaults if
    /// the file does not exist.
    pub fn load_from_project(project_root: &Path) -> Result<Self, ConfigError> {
        let config_path = project_root.join(CONFIG_DIR).join(CONFIG_FILE);
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Config::default())
        }
    }
}

impl ScourSettings {
    /// Compiled `exclude_paths`.
    pub fn path_filter(&self) -> Result<GlobSet, ConfigError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.exclude_paths {
            let glob = Glob::new(pattern).map_err(|e| ConfigError::Pattern {
                pattern: pattern.clone(),
                message: e.to_string(),
            })?;
            builder.add(glob);
        }
        builder.build().map_err(|e| ConfigError::Pattern {
            pattern: self.exclude_paths.join(", "),
            message: e.to_string(),
        })
    }
}

/// Find the project root by searching upward from the current directory.
pub fn find_project_root() -> Result<PathBuf, ConfigError> {
    let cwd = std::env::current_dir().map_err(|e| ConfigError::Read {
        path: ".".to_string(),
        message: e.to_string(),
    })?;
    find_project_root_from(cwd)
}

/// Find the project root starting from a specific directory.
pub fn find_project_root_from(start: PathBuf) -> Result<PathBuf, ConfigError> {
    let mut current = start.clone();
    loop {
        if current.join(CONFIG_DIR).is_dir() {
            return Ok(current);
        }
        match current.parent() {
            Some(parent) => current = parent.to_path_buf(),
            None => {
                return Err(ConfigError::NotInitialized {
                    start: start.display().to_string(),
                })
            }
        }
    }
}
