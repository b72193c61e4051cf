//! Configuration Management
//!
//! Loads run settings from TOML files.
//! Configuration includes:
//! - Discovery globs (targets, JSON files) and the staging directory
//! - Environment variable name translation
//! - Detection of semantically typed string leaves
//! - Output formatting and log redaction
//!
//! Precedence: command-line flags, then `JSON_STAMP_*` environment
//! variables, then the configuration file, then built-in defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

use crate::errors::StampError;
use crate::substitution::TypeDetection;
use crate::variables::DEFAULT_ENV_SEPARATOR;

/// File name looked up in the current directory.
pub const CONFIG_FILE_NAME: &str = "json-stamp.toml";

pub const ENV_TARGETS: &str = "JSON_STAMP_TARGETS";
pub const ENV_JSON_FILES: &str = "JSON_STAMP_JSON_FILES";
pub const ENV_TEMP_DIR: &str = "JSON_STAMP_TEMP_DIR";
pub const ENV_SEPARATOR: &str = "JSON_STAMP_SEPARATOR";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub discovery: DiscoveryConfig,

    #[serde(default)]
    pub variables: VariablesConfig,

    #[serde(default)]
    pub detection: TypeDetection,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Glob for zip files or directories, relative to the working directory
    #[serde(default = "default_targets")]
    pub targets: String,
    /// Glob for JSON files inside each target
    #[serde(default = "default_json_files")]
    pub json_files: String,
    /// Staging root for extracted archives (system temp dir when unset)
    #[serde(default)]
    pub temp_dir: Option<PathBuf>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            targets: default_targets(),
            json_files: default_json_files(),
            temp_dir: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariablesConfig {
    /// Replaced by `.` in environment variable names
    #[serde(default = "default_separator")]
    pub separator: String,
}

impl Default for VariablesConfig {
    fn default() -> Self {
        Self {
            separator: default_separator(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Indented output; compact single-line JSON otherwise
    #[serde(default = "default_true")]
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { pretty: true }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Mask values of secret-looking keys in substitution logs
    #[serde(default = "default_true")]
    pub redact_secrets: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            redact_secrets: true,
        }
    }
}

fn default_targets() -> String {
    "**/*.zip".to_string()
}
fn default_json_files() -> String {
    "**/*.json".to_string()
}
fn default_separator() -> String {
    DEFAULT_ENV_SEPARATOR.to_string()
}
fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from `path`, or from the default locations when no
    /// path is given, then apply environment overrides.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut config = match path {
            Some(p) => {
                let content = std::fs::read_to_string(p)
                    .with_context(|| format!("Failed to read config from {}", p))?;
                Self::parse(&content, p)?
            }
            None => {
                let mut default_paths = vec![PathBuf::from(CONFIG_FILE_NAME)];
                if let Some(home) = dirs::home_dir() {
                    default_paths.push(home.join(".config/json-stamp/config.toml"));
                }

                let mut loaded = None;
                for p in &default_paths {
                    if let Ok(content) = std::fs::read_to_string(p) {
                        debug!("Loaded configuration from {}", p.display());
                        loaded = Some(Self::parse(&content, &p.display().to_string())?);
                        break;
                    }
                }
                loaded.unwrap_or_else(|| {
                    debug!("No config file found, using defaults");
                    Self::default()
                })
            }
        };

        config.apply_env_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    fn parse(content: &str, origin: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| StampError::Config(format!("Failed to parse {}: {}", origin, e)).into())
    }

    /// Override settings from `JSON_STAMP_*` variables resolved by `lookup`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(targets) = lookup(ENV_TARGETS) {
            self.discovery.targets = targets;
        }
        if let Some(json_files) = lookup(ENV_JSON_FILES) {
            self.discovery.json_files = json_files;
        }
        if let Some(temp_dir) = lookup(ENV_TEMP_DIR) {
            self.discovery.temp_dir = Some(PathBuf::from(temp_dir));
        }
        if let Some(separator) = lookup(ENV_SEPARATOR) {
            self.variables.separator = separator;
        }
    }

    /// Directory under which archive staging directories are created.
    pub fn temp_root(&self) -> PathBuf {
        self.discovery
            .temp_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }
}
