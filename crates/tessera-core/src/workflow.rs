//! Workflow blueprints.

use crate::env::EnvVar;
use crate::task::Task;

/// Version given to workflows that do not set one.
pub const DEFAULT_VERSION: &str = "0.1.0";

/// An ordered list of tasks plus the metadata the deployment tool needs.
#[derive(Debug, Clone, PartialEq)]
pub struct Workflow {
    pub namespace: String,
    pub name: String,
    /// Semantic version of the blueprint.
    pub version: String,
    pub description: String,
    pub tasks: Vec<Task>,
    pub env: Vec<EnvVar>,
}

impl Workflow {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            version: DEFAULT_VERSION.to_string(),
            description: String::new(),
            tasks: Vec::new(),
            env: Vec::new(),
        }
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn task(mut self, task: Task) -> Self {
        self.tasks.push(task);
        self
    }

    pub fn tasks(mut self, tasks: impl IntoIterator<Item = Task>) -> Self {
        self.tasks.extend(tasks);
        self
    }

    pub fn env(mut self, var: EnvVar) -> Self {
        self.env.push(var);
        self
    }

    /// `namespace/name`, used in logs and errors.
    pub fn qualified_name(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }

    pub fn has_env(&self, name: &str) -> bool {
        self.env.iter().any(|v| v.name == name)
    }

    /// Add a requirement unless one with the same name exists.
    pub fn require_env(&mut self, var: EnvVar) {
        if !self.has_env(&var.name) {
            self.env.push(var);
        }
    }
}
