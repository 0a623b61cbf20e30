//! Configuration for tessera synthesis.
//!
//! Decides where manifests go (or that nothing is written at all) from
//! defaults, `tessera.toml` and `TESSERA_*` environment variables.

pub mod config;

pub use config::{CONFIG_FILE, ConfigError, ENV_PREFIX, Result, SynthConfig};
