//! Synthesis error types.

use std::path::PathBuf;

/// Errors that abort a synthesis run. The first failure wins; nothing is
/// written once one of these is raised.
#[derive(Debug, thiserror::Error)]
pub enum SynthError {
    /// A task's config does not match its declared kind.
    #[error("workflow {workflow}: task #{index} '{task}': {reason}")]
    InvalidTaskConfig {
        /// Qualified workflow name (`namespace/name`).
        workflow: String,
        /// Position of the task within its enclosing list.
        index: usize,
        /// Task name.
        task: String,
        /// What is wrong with the config.
        reason: String,
    },

    /// The task kind has no converter.
    #[error("workflow {workflow}: task '{task}' has unknown kind '{kind}'")]
    UnknownTaskKind {
        workflow: String,
        task: String,
        kind: String,
    },

    /// A config value cannot be represented in the manifest.
    #[error("workflow {workflow}: task '{task}': cannot encode '{path}': {reason}")]
    UnencodableConfig {
        workflow: String,
        task: String,
        /// Dotted path of the offending value inside the task config.
        path: String,
        reason: String,
    },

    /// Two tasks in the same list share a name.
    #[error("workflow {workflow}: duplicate task name '{task}'")]
    DuplicateTaskName { workflow: String, task: String },

    /// A task reads the output of a task it cannot see.
    #[error("workflow {workflow}: task '{task}' references unknown task '{referenced}'")]
    UnresolvedTaskReference {
        workflow: String,
        task: String,
        referenced: String,
    },

    /// `synthesize` was already called on this context.
    #[error("context has already been synthesized")]
    AlreadySynthesized,

    /// Creating the output directory or writing a manifest failed.
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Serializing a manifest failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience alias used throughout the synth crate.
pub type Result<T> = std::result::Result<T, SynthError>;

impl SynthError {
    // -- Constructors --------------------------------------------------------

    /// Creates a [`SynthError::Io`] for the given path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a [`SynthError::InvalidTaskConfig`].
    pub fn invalid_config(
        workflow: impl Into<String>,
        index: usize,
        task: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidTaskConfig {
            workflow: workflow.into(),
            index,
            task: task.into(),
            reason: reason.into(),
        }
    }

    // -- Predicates ----------------------------------------------------------

    /// Returns `true` if this is a [`SynthError::AlreadySynthesized`].
    pub fn is_already_synthesized(&self) -> bool {
        matches!(self, Self::AlreadySynthesized)
    }

    /// Returns `true` if the error came from the filesystem rather than from
    /// the blueprints themselves.
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }
}
