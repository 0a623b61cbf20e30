//! [`Context`] -- the per-run container for named values and blueprints.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde_json::Value;
use tessera_config::SynthConfig;
use tessera_core::{
    Agent, BoolRef, IntRef, ObjectRef, Ref, RefError, RuntimeSource, StringRef, Workflow,
};
use tracing::{debug, info};

use crate::error::{Result, SynthError};
use crate::registry::Registry;
use crate::synthesizer::{SynthesisOutcome, Synthesizer};

/// Named refs plus the registry of everything built during one run.
///
/// Setting a name again replaces the earlier ref. [`Context::synthesize`]
/// runs at most once.
#[derive(Debug)]
pub struct Context {
    config: SynthConfig,
    registry: Arc<Registry>,
    refs: HashMap<String, Ref>,
    generated_at: Option<DateTime<Utc>>,
    synthesized: Mutex<bool>,
}

impl Context {
    /// A context with a fresh registry.
    pub fn new(config: SynthConfig) -> Self {
        Self::with_registry(config, Arc::new(Registry::new()))
    }

    /// A context that registers into `registry`.
    pub fn with_registry(config: SynthConfig, registry: Arc<Registry>) -> Self {
        Self {
            config,
            registry,
            refs: HashMap::new(),
            generated_at: None,
            synthesized: Mutex::new(false),
        }
    }

    /// Pin the manifest timestamp instead of using the time of synthesis.
    pub fn with_timestamp(mut self, at: DateTime<Utc>) -> Self {
        self.generated_at = Some(at);
        self
    }

    pub fn config(&self) -> &SynthConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    // -- setters -------------------------------------------------------------

    fn store(&mut self, r: Ref) {
        debug!(name = r.name(), secret = r.core().is_secret(), "set context value");
        self.refs.insert(r.name().to_string(), r);
    }

    pub fn set_string(&mut self, name: &str, value: impl Into<String>) -> StringRef {
        let r = StringRef::literal(name, value);
        self.store(Ref::String(r.clone()));
        r
    }

    /// Like [`Context::set_string`], but the value is kept out of logs.
    pub fn set_secret(&mut self, name: &str, value: impl Into<String>) -> StringRef {
        let r = StringRef::secret(name, value);
        self.store(Ref::String(r.clone()));
        r
    }

    pub fn set_int(&mut self, name: &str, value: i64) -> IntRef {
        let r = IntRef::literal(name, value);
        self.store(Ref::Int(r.clone()));
        r
    }

    pub fn set_bool(&mut self, name: &str, value: bool) -> BoolRef {
        let r = BoolRef::literal(name, value);
        self.store(Ref::Bool(r.clone()));
        r
    }

    /// # Errors
    ///
    /// [`RefError::NotAnObject`] if `value` is not a JSON object.
    pub fn set_object(&mut self, name: &str, value: Value) -> std::result::Result<ObjectRef, RefError> {
        let r = ObjectRef::literal(name, value)?;
        self.store(Ref::Object(r.clone()));
        Ok(r)
    }

    /// Declare a string only known once the workflow starts.
    pub fn runtime_string(&mut self, name: &str, source: RuntimeSource) -> StringRef {
        let r = StringRef::runtime(name, source);
        self.store(Ref::String(r.clone()));
        r
    }

    pub fn runtime_int(&mut self, name: &str, source: RuntimeSource) -> IntRef {
        let r = IntRef::runtime(name, source);
        self.store(Ref::Int(r.clone()));
        r
    }

    pub fn runtime_bool(&mut self, name: &str, source: RuntimeSource) -> BoolRef {
        let r = BoolRef::runtime(name, source);
        self.store(Ref::Bool(r.clone()));
        r
    }

    // -- getters -------------------------------------------------------------

    pub fn get(&self, name: &str) -> Option<&Ref> {
        self.refs.get(name)
    }

    /// The named ref if it exists and is a string.
    pub fn get_string(&self, name: &str) -> Option<StringRef> {
        match self.refs.get(name)? {
            Ref::String(r) => Some(r.clone()),
            _ => None,
        }
    }

    pub fn get_int(&self, name: &str) -> Option<IntRef> {
        match self.refs.get(name)? {
            Ref::Int(r) => Some(r.clone()),
            _ => None,
        }
    }

    pub fn get_bool(&self, name: &str) -> Option<BoolRef> {
        match self.refs.get(name)? {
            Ref::Bool(r) => Some(r.clone()),
            _ => None,
        }
    }

    pub fn get_object(&self, name: &str) -> Option<ObjectRef> {
        match self.refs.get(name)? {
            Ref::Object(r) => Some(r.clone()),
            _ => None,
        }
    }

    // -- resources -----------------------------------------------------------

    pub fn register_workflow(&self, workflow: Workflow) {
        self.registry.add_workflow(workflow);
    }

    pub fn register_agent(&self, agent: Agent) {
        self.registry.add_agent(agent);
    }

    /// Convert everything registered and write the manifests.
    ///
    /// The latch is taken before any work and held until the run is over,
    /// so a concurrent or repeated call never writes.
    ///
    /// # Errors
    ///
    /// [`SynthError::AlreadySynthesized`] on every call after the first, or
    /// any error from the run itself.
    pub fn synthesize(&self) -> Result<SynthesisOutcome> {
        let mut done = self
            .synthesized
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if *done {
            return Err(SynthError::AlreadySynthesized);
        }
        *done = true;

        let (workflows, agents) = self.registry.snapshot();
        info!(
            workflows = workflows.len(),
            agents = agents.len(),
            dry_run = self.config.is_dry_run(),
            "synthesizing"
        );
        let at = self.generated_at.unwrap_or_else(Utc::now);
        Synthesizer::new(&self.config, at).synthesize(&workflows, &agents)
    }
}
