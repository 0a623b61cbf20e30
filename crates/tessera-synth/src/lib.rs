//! Synthesis of tessera blueprints into manifests.
//!
//! A [`Context`] collects named values and registers workflows and agents
//! into a [`Registry`]. [`Context::synthesize`] resolves task references,
//! converts every task into its wire record, and writes one manifest per
//! resource category into the configured output directory.

pub mod context;
pub mod convert;
pub mod error;
pub mod manifest;
pub mod registry;
pub mod resolve;
pub mod run;
pub mod synthesizer;
pub mod writer;

pub use context::Context;
pub use error::{Result, SynthError};
pub use manifest::{
    AgentManifest, Manifests, SdkMetadata, TaskRecord, WorkflowBlueprint, WorkflowManifest,
};
pub use registry::Registry;
pub use resolve::INIT_TASK_NAME;
pub use run::{BuildError, RunError, run, run_with};
pub use synthesizer::{SynthesisOutcome, Synthesizer};
pub use writer::ManifestWriter;
