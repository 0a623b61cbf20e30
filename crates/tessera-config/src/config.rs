//! Synthesis configuration.
//!
//! [`SynthConfig`] is assembled from three layers, lowest priority first:
//! built-in defaults, an optional `tessera.toml` in the working directory,
//! and `TESSERA_*` environment variables (`TESSERA_OUTPUT_DIR`, ...).

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name of the optional config file.
pub const CONFIG_FILE: &str = "tessera.toml";

/// Prefix of environment variables that override config values.
pub const ENV_PREFIX: &str = "TESSERA_";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A provider failed or a value had the wrong type.
    #[error("failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    /// A configuration value was invalid.
    #[error("invalid configuration value for key '{key}': {reason}")]
    InvalidValue {
        /// The configuration key that had an invalid value.
        key: String,
        /// A description of why the value is invalid.
        reason: String,
    },
}

impl ConfigError {
    fn invalid(key: &str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<figment::Error> for ConfigError {
    fn from(e: figment::Error) -> Self {
        Self::Load(Box::new(e))
    }
}

/// A specialized `Result` type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

// ---------------------------------------------------------------------------
// SynthConfig
// ---------------------------------------------------------------------------

fn default_workflow_file() -> String {
    "workflow-manifest.json".to_string()
}

fn default_agent_file() -> String {
    "agent-manifest.json".to_string()
}

fn default_pretty() -> bool {
    true
}

/// Where and how manifests are written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthConfig {
    /// Output directory. Unset means dry run: convert but write nothing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,

    /// File name of the workflow manifest inside `output_dir`.
    #[serde(default = "default_workflow_file")]
    pub workflow_file: String,

    /// File name of the agent manifest inside `output_dir`.
    #[serde(default = "default_agent_file")]
    pub agent_file: String,

    /// Indent manifest JSON.
    #[serde(default = "default_pretty")]
    pub pretty: bool,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            workflow_file: default_workflow_file(),
            agent_file: default_agent_file(),
            pretty: default_pretty(),
        }
    }
}

impl SynthConfig {
    /// The provider stack rooted at `dir`.
    pub fn figment(dir: &Path) -> Figment {
        Figment::from(Serialized::defaults(SynthConfig::default()))
            .merge(Toml::file(dir.join(CONFIG_FILE)))
            .merge(Env::prefixed(ENV_PREFIX))
    }

    /// Load from the current working directory and the environment.
    ///
    /// # Errors
    ///
    /// See [`SynthConfig::load_from`].
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("."))
    }

    /// Load using `dir` to locate `tessera.toml`. A missing file is not an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Load`] if the file is malformed or a value has
    /// the wrong type, or [`ConfigError::InvalidValue`] if validation fails.
    pub fn load_from(dir: &Path) -> Result<Self> {
        Self::from_figment(Self::figment(dir))
    }

    /// Extract and validate from an arbitrary provider stack.
    ///
    /// # Errors
    ///
    /// Same as [`SynthConfig::load_from`].
    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: SynthConfig = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Override the output directory.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.output_dir.is_none()
    }

    pub fn workflow_path(&self) -> Option<PathBuf> {
        self.output_dir.as_ref().map(|d| d.join(&self.workflow_file))
    }

    pub fn agent_path(&self) -> Option<PathBuf> {
        self.output_dir.as_ref().map(|d| d.join(&self.agent_file))
    }

    fn validate(&self) -> Result<()> {
        for (key, name) in [
            ("workflow_file", &self.workflow_file),
            ("agent_file", &self.agent_file),
        ] {
            if name.is_empty() {
                return Err(ConfigError::invalid(key, "must not be empty"));
            }
            if name.contains(['/', '\\']) {
                return Err(ConfigError::invalid(key, "must be a file name, not a path"));
            }
        }
        if self.workflow_file == self.agent_file {
            return Err(ConfigError::invalid(
                "agent_file",
                "must differ from workflow_file",
            ));
        }
        if self.output_dir.as_ref().is_some_and(|d| d.as_os_str().is_empty()) {
            return Err(ConfigError::invalid("output_dir", "must not be empty"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
