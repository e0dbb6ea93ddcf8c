//! Configuration for `op-merge` runs.
//!
//! Loaded from a YAML file and overridden by command-line flags.
//!
//! # Example YAML
//!
//! ```yaml
//! version: "1.0"
//! atomic: false
//! log_level: warn
//! registry:
//!   ref_prefix: "#/components/schemas/"
//! output:
//!   format: json
//!   pretty: true
//! ```

use std::io::{BufReader, BufWriter};
use std::path::Path;

use operation_merge_core::DEFAULT_REF_PREFIX;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while reading or writing configuration and input files.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing or serialization failure.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// Semantically invalid configuration.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Convenience alias for results with [`ConfigError`].
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Serialization format for merge output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

/// Schema registry settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Prefix for component references, e.g. `#/components/schemas/`.
    pub ref_prefix: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            ref_prefix: DEFAULT_REF_PREFIX.to_string(),
        }
    }
}

/// Output settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
    /// Pretty-print JSON output.
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Json,
            pretty: true,
        }
    }
}

/// Top-level `op-merge` configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Configuration format version (e.g., `"1.0"`).
    pub version: String,
    /// Validate the whole descriptor before merging anything.
    pub atomic: bool,
    /// Fallback log filter when `RUST_LOG` is unset.
    pub log_level: String,
    pub registry: RegistryConfig,
    pub output: OutputConfig,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            atomic: false,
            log_level: "warn".to_string(),
            registry: RegistryConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl MergeConfig {
    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::IoError`] if the file cannot be read,
    /// [`ConfigError::YamlError`] if parsing fails, or
    /// [`ConfigError::Invalid`] if a required value is empty.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config: Self = serde_yaml::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    /// Saves the configuration as YAML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.registry.ref_prefix.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "registry.ref_prefix cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Reads a JSON or YAML document, chosen by file extension.
///
/// Files ending in `.yaml` or `.yml` are parsed as YAML; everything else as
/// JSON.
pub fn read_document<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)?;
    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));
    if is_yaml {
        Ok(serde_yaml::from_str(&raw)?)
    } else {
        Ok(serde_json::from_str(&raw)?)
    }
}
