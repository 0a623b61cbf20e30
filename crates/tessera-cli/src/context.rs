//! Runtime context for command execution.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use tessera_config::SynthConfig;

use crate::cli::GlobalArgs;

/// State every command handler needs, built once in `main`.
#[derive(Debug)]
pub struct RuntimeContext {
    /// Directory configuration is loaded from.
    pub work_dir: PathBuf,

    /// Whether to produce JSON output.
    pub json: bool,

    pub verbose: bool,
}

impl RuntimeContext {
    pub fn from_global_args(global: &GlobalArgs) -> Result<Self> {
        let work_dir = match &global.dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir().context("cannot determine current directory")?,
        };
        Ok(Self {
            work_dir,
            json: global.json,
            verbose: global.verbose,
        })
    }

    /// Load the layered synthesis config for [`RuntimeContext::work_dir`].
    pub fn load_config(&self) -> Result<SynthConfig> {
        SynthConfig::load_from(&self.work_dir).with_context(|| {
            format!("failed to load configuration from {}", self.work_dir.display())
        })
    }
}
