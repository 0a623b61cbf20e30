//! Tasks: the nodes of a workflow's task graph.

use std::collections::BTreeSet;

use crate::config::{
    CallActivityConfig, ForConfig, ForkConfig, GrpcCallConfig, HttpCallConfig, ListenConfig,
    RaiseConfig, RunConfig, SetConfig, SwitchConfig, TaskConfig, TryConfig, WaitConfig,
};
use crate::enums::TaskKind;
use crate::error::TaskError;
use crate::refs::{BoolRef, IntRef, ObjectRef, RefCore, StringRef};

/// Export directive that exposes the whole task output.
pub const EXPORT_ALL: &str = "${.}";

/// Explicit flow control after a task completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flow {
    /// Jump to the named task.
    Then(String),
    /// Terminate the workflow.
    End,
}

impl Flow {
    /// The directive as written into the manifest.
    pub fn as_str(&self) -> &str {
        match self {
            Flow::Then(name) => name,
            Flow::End => "end",
        }
    }
}

/// One step of a workflow.
///
/// The export directive and dependency set are filled in by synthesis when
/// other tasks read this task's output; authors only set them explicitly.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    name: String,
    kind: TaskKind,
    config: TaskConfig,
    export: Option<String>,
    flow: Option<Flow>,
    depends_on: BTreeSet<String>,
}

macro_rules! typed_accessor {
    ($($fn_name:ident => $variant:ident($ty:ty)),+ $(,)?) => {
        $(
            /// # Errors
            ///
            /// [`TaskError::InvalidTaskConfig`] if the kind tag or the config
            /// variant is not the one asked for.
            pub fn $fn_name(&self) -> Result<&$ty, TaskError> {
                match &self.config {
                    TaskConfig::$variant(c) if self.kind == TaskKind::$variant => Ok(c),
                    _ => Err(self.mismatch(TaskKind::$variant)),
                }
            }
        )+
    };
}

impl Task {
    /// Create a task whose kind follows from its config.
    pub fn new(name: impl Into<String>, config: impl Into<TaskConfig>) -> Self {
        let config = config.into();
        Self {
            name: name.into(),
            kind: config.kind(),
            config,
            export: None,
            flow: None,
            depends_on: BTreeSet::new(),
        }
    }

    /// Assemble a task from separately sourced parts. The kind is not
    /// checked against the config here; see [`Task::validate`].
    pub fn from_parts(name: impl Into<String>, kind: TaskKind, config: TaskConfig) -> Self {
        Self {
            kind,
            ..Self::new(name, config)
        }
    }

    // -- builders ----------------------------------------------------------

    /// Continue with the named task.
    pub fn then(mut self, next: impl Into<String>) -> Self {
        self.flow = Some(Flow::Then(next.into()));
        self
    }

    /// Continue with `next`.
    pub fn then_task(self, next: &Task) -> Self {
        let name = next.name.clone();
        self.then(name)
    }

    /// End the workflow after this task.
    pub fn end(mut self) -> Self {
        self.flow = Some(Flow::End);
        self
    }

    pub fn export_all(mut self) -> Self {
        self.export = Some(EXPORT_ALL.to_string());
        self
    }

    /// Export only `field` of the output.
    pub fn export_field(mut self, field: &str) -> Self {
        let mut expr = String::from("${");
        crate::expr::push_segment(&mut expr, field);
        expr.push('}');
        self.export = Some(expr);
        self
    }

    // -- output references -------------------------------------------------

    /// A string field of this task's output. Always unknown at build time.
    pub fn field(&self, name: &str) -> StringRef {
        StringRef::from_core(self.output_core(name))
    }

    pub fn field_int(&self, name: &str) -> IntRef {
        IntRef::from_core(self.output_core(name))
    }

    pub fn field_bool(&self, name: &str) -> BoolRef {
        BoolRef::from_core(self.output_core(name))
    }

    pub fn field_object(&self, name: &str) -> ObjectRef {
        ObjectRef::from_core(self.output_core(name))
    }

    /// The whole output of this task.
    pub fn output(&self) -> ObjectRef {
        ObjectRef::from_core(RefCore::task_output(&self.name, Vec::new()))
    }

    fn output_core(&self, name: &str) -> RefCore {
        RefCore::task_output(&self.name, vec![name.to_string()])
    }

    // -- accessors ---------------------------------------------------------

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &TaskKind {
        &self.kind
    }

    pub fn config(&self) -> &TaskConfig {
        &self.config
    }

    pub fn export(&self) -> Option<&str> {
        self.export.as_deref()
    }

    pub fn flow(&self) -> Option<&Flow> {
        self.flow.as_ref()
    }

    pub fn depends_on(&self) -> &BTreeSet<String> {
        &self.depends_on
    }

    /// Nested task lists; see [`TaskConfig::nested`].
    pub fn nested(&self) -> Vec<&[Task]> {
        self.config.nested()
    }

    pub fn nested_mut(&mut self) -> Vec<&mut Vec<Task>> {
        self.config.nested_mut()
    }

    /// Check that the kind tag matches the config variant.
    ///
    /// # Errors
    ///
    /// [`TaskError::InvalidTaskConfig`] on a mismatch. A custom kind is not
    /// a mismatch here; it is rejected when converted.
    pub fn validate(&self) -> Result<(), TaskError> {
        if self.kind.is_builtin() && self.kind != self.config.kind() {
            return Err(self.mismatch(self.kind.clone()));
        }
        Ok(())
    }

    typed_accessor!(
        as_set => Set(SetConfig),
        as_http_call => HttpCall(HttpCallConfig),
        as_grpc_call => GrpcCall(GrpcCallConfig),
        as_switch => Switch(SwitchConfig),
        as_for => For(ForConfig),
        as_fork => Fork(ForkConfig),
        as_try => Try(TryConfig),
        as_listen => Listen(ListenConfig),
        as_wait => Wait(WaitConfig),
        as_call_activity => CallActivity(CallActivityConfig),
        as_raise => Raise(RaiseConfig),
        as_run => Run(RunConfig),
    );

    fn mismatch(&self, expected: TaskKind) -> TaskError {
        let config_kind = self.config.kind();
        let actual = if config_kind == expected {
            self.kind.clone()
        } else {
            config_kind
        };
        TaskError::InvalidTaskConfig {
            task: self.name.clone(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    // -- resolution hooks --------------------------------------------------

    /// Export the whole output unless an export is already set. Returns
    /// whether the directive changed.
    pub fn apply_implicit_export(&mut self) -> bool {
        if self.export.is_some() {
            return false;
        }
        self.export = Some(EXPORT_ALL.to_string());
        true
    }

    /// Record that this task reads the output of `source`.
    pub fn add_dependency(&mut self, source: impl Into<String>) {
        self.depends_on.insert(source.into());
    }
}
