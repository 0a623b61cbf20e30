//! [`Registry`] -- the collection of blueprints a run has constructed.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tessera_core::{Agent, Workflow};
use tracing::debug;

#[derive(Debug, Default)]
struct Entries {
    workflows: Vec<Workflow>,
    agents: Vec<Agent>,
}

/// Append-only store of workflows and agents, safe to share across threads.
///
/// One mutex guards both lists; readers get copies. A registry is created
/// by the caller and handed to a [`Context`](crate::Context), so separate
/// runs (and tests) never share state.
#[derive(Debug, Default)]
pub struct Registry {
    entries: Mutex<Entries>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries are only ever appended, so a panic in another holder cannot
    /// leave them half-updated.
    fn lock(&self) -> MutexGuard<'_, Entries> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_workflow(&self, workflow: Workflow) {
        debug!(workflow = %workflow.qualified_name(), "registering workflow");
        self.lock().workflows.push(workflow);
    }

    pub fn add_agent(&self, agent: Agent) {
        debug!(agent = %agent.name, "registering agent");
        self.lock().agents.push(agent);
    }

    /// Copies of the registered workflows, in registration order.
    pub fn workflows(&self) -> Vec<Workflow> {
        self.lock().workflows.clone()
    }

    /// Copies of the registered agents, in registration order.
    pub fn agents(&self) -> Vec<Agent> {
        self.lock().agents.clone()
    }

    /// Copies of both lists taken under a single lock acquisition.
    pub fn snapshot(&self) -> (Vec<Workflow>, Vec<Agent>) {
        let entries = self.lock();
        (entries.workflows.clone(), entries.agents.clone())
    }

    pub fn is_empty(&self) -> bool {
        let entries = self.lock();
        entries.workflows.is_empty() && entries.agents.is_empty()
    }

    /// Drop everything registered so far.
    pub fn clear(&self) {
        let mut entries = self.lock();
        entries.workflows.clear();
        entries.agents.clear();
    }
}
