//! Per-kind task configs.
//!
//! [`TaskConfig`] is a closed sum type: every task kind has its own struct
//! with typed fields. Open-ended payloads (bodies, inputs) use
//! [`ConfigValue`].

use std::collections::BTreeMap;

use crate::enums::{HttpMethod, TaskKind};
use crate::refs::{BoolRef, IntRef, ObjectRef, RefCore, StringRef};
use crate::task::Task;
use crate::value::ConfigValue;

// ---------------------------------------------------------------------------
// TaskConfig
// ---------------------------------------------------------------------------

/// Kind-specific configuration of a task.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskConfig {
    Set(SetConfig),
    HttpCall(HttpCallConfig),
    GrpcCall(GrpcCallConfig),
    Switch(SwitchConfig),
    For(ForConfig),
    Fork(ForkConfig),
    Try(TryConfig),
    Listen(ListenConfig),
    Wait(WaitConfig),
    CallActivity(CallActivityConfig),
    Raise(RaiseConfig),
    Run(RunConfig),
}

impl TaskConfig {
    /// The kind this config belongs to.
    pub fn kind(&self) -> TaskKind {
        match self {
            TaskConfig::Set(_) => TaskKind::Set,
            TaskConfig::HttpCall(_) => TaskKind::HttpCall,
            TaskConfig::GrpcCall(_) => TaskKind::GrpcCall,
            TaskConfig::Switch(_) => TaskKind::Switch,
            TaskConfig::For(_) => TaskKind::For,
            TaskConfig::Fork(_) => TaskKind::Fork,
            TaskConfig::Try(_) => TaskKind::Try,
            TaskConfig::Listen(_) => TaskKind::Listen,
            TaskConfig::Wait(_) => TaskKind::Wait,
            TaskConfig::CallActivity(_) => TaskKind::CallActivity,
            TaskConfig::Raise(_) => TaskKind::Raise,
            TaskConfig::Run(_) => TaskKind::Run,
        }
    }

    /// Call `f` for every ref in this config, excluding nested task lists.
    pub fn visit_refs<'a>(&'a self, f: &mut dyn FnMut(&'a RefCore)) {
        match self {
            TaskConfig::Set(c) => c.variables.values().for_each(|v| v.visit_refs(f)),
            TaskConfig::HttpCall(c) => {
                f(c.uri.core());
                c.headers.values().for_each(|h| f(h.core()));
                if let Some(body) = &c.body {
                    body.visit_refs(f);
                }
            }
            TaskConfig::GrpcCall(c) => {
                if let Some(body) = &c.body {
                    body.visit_refs(f);
                }
            }
            TaskConfig::Switch(c) => {
                for case in &c.cases {
                    if let Condition::Ref(r) = &case.when {
                        f(r.core());
                    }
                }
            }
            TaskConfig::For(c) => c.in_.visit_refs(f),
            TaskConfig::Fork(_) | TaskConfig::Try(_) | TaskConfig::Listen(_) => {}
            TaskConfig::Wait(c) => f(c.seconds.core()),
            TaskConfig::CallActivity(c) => c.input.visit_refs(f),
            TaskConfig::Raise(c) => {
                f(c.message.core());
                if let Some(data) = &c.data {
                    data.visit_refs(f);
                }
            }
            TaskConfig::Run(c) => c.input.visit_refs(f),
        }
    }

    /// Nested task lists in wire order: a loop body; each fork branch;
    /// the try list followed by each catch list.
    pub fn nested(&self) -> Vec<&[Task]> {
        match self {
            TaskConfig::For(c) => vec![c.tasks.as_slice()],
            TaskConfig::Fork(c) => c.branches.iter().map(|b| b.tasks.as_slice()).collect(),
            TaskConfig::Try(c) => std::iter::once(c.tasks.as_slice())
                .chain(c.catches.iter().map(|b| b.tasks.as_slice()))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Mutable counterpart of [`TaskConfig::nested`], same order.
    pub fn nested_mut(&mut self) -> Vec<&mut Vec<Task>> {
        match self {
            TaskConfig::For(c) => vec![&mut c.tasks],
            TaskConfig::Fork(c) => c.branches.iter_mut().map(|b| &mut b.tasks).collect(),
            TaskConfig::Try(c) => std::iter::once(&mut c.tasks)
                .chain(c.catches.iter_mut().map(|b| &mut b.tasks))
                .collect(),
            _ => Vec::new(),
        }
    }
}

macro_rules! config_from {
    ($($variant:ident($ty:ty)),+ $(,)?) => {
        $(
            impl From<$ty> for TaskConfig {
                fn from(c: $ty) -> Self {
                    TaskConfig::$variant(c)
                }
            }
        )+
    };
}

config_from!(
    Set(SetConfig),
    HttpCall(HttpCallConfig),
    GrpcCall(GrpcCallConfig),
    Switch(SwitchConfig),
    For(ForConfig),
    Fork(ForkConfig),
    Try(TryConfig),
    Listen(ListenConfig),
    Wait(WaitConfig),
    CallActivity(CallActivityConfig),
    Raise(RaiseConfig),
    Run(RunConfig),
);

// ---------------------------------------------------------------------------
// SET
// ---------------------------------------------------------------------------

/// Assigns values into the workflow context.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SetConfig {
    pub variables: BTreeMap<String, ConfigValue>,
}

impl SetConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn var(mut self, name: impl Into<String>, value: impl Into<ConfigValue>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }
}

// ---------------------------------------------------------------------------
// HTTP_CALL / GRPC_CALL
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct HttpCallConfig {
    pub method: HttpMethod,
    pub uri: StringRef,
    pub headers: BTreeMap<String, StringRef>,
    pub body: Option<ConfigValue>,
    pub timeout_seconds: Option<u64>,
}

impl HttpCallConfig {
    pub fn new(method: HttpMethod, uri: impl Into<StringRef>) -> Self {
        Self {
            method,
            uri: uri.into(),
            headers: BTreeMap::new(),
            body: None,
            timeout_seconds: None,
        }
    }

    pub fn get(uri: impl Into<StringRef>) -> Self {
        Self::new(HttpMethod::Get, uri)
    }

    pub fn post(uri: impl Into<StringRef>) -> Self {
        Self::new(HttpMethod::Post, uri)
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<StringRef>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn body(mut self, body: impl Into<ConfigValue>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn timeout_seconds(mut self, seconds: u64) -> Self {
        self.timeout_seconds = Some(seconds);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GrpcCallConfig {
    pub service: String,
    pub method: String,
    pub body: Option<ConfigValue>,
}

impl GrpcCallConfig {
    pub fn new(service: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            method: method.into(),
            body: None,
        }
    }

    pub fn body(mut self, body: impl Into<ConfigValue>) -> Self {
        self.body = Some(body.into());
        self
    }
}

// ---------------------------------------------------------------------------
// SWITCH
// ---------------------------------------------------------------------------

/// A switch guard: raw runtime expression text or a boolean ref.
/// An empty expression matches unconditionally.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Expr(String),
    Ref(BoolRef),
}

impl Condition {
    pub fn is_empty(&self) -> bool {
        matches!(self, Condition::Expr(s) if s.is_empty())
    }

    /// The guard as written into the manifest.
    pub fn to_wire(&self) -> String {
        match self {
            Condition::Expr(s) => s.clone(),
            Condition::Ref(r) => match r.expression() {
                Some(expr) => expr,
                None => format!("${{ {} }}", r.value().unwrap_or(false)),
            },
        }
    }
}

impl From<&str> for Condition {
    fn from(s: &str) -> Self {
        Condition::Expr(s.to_string())
    }
}

impl From<String> for Condition {
    fn from(s: String) -> Self {
        Condition::Expr(s)
    }
}

impl From<BoolRef> for Condition {
    fn from(r: BoolRef) -> Self {
        Condition::Ref(r)
    }
}

impl From<&BoolRef> for Condition {
    fn from(r: &BoolRef) -> Self {
        Condition::Ref(r.clone())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchCase {
    pub when: Condition,
    /// Name of the task to jump to.
    pub then: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SwitchConfig {
    pub cases: Vec<SwitchCase>,
    pub default: Option<String>,
}

impl SwitchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn case(mut self, when: impl Into<Condition>, then: impl Into<String>) -> Self {
        self.cases.push(SwitchCase {
            when: when.into(),
            then: then.into(),
        });
        self
    }

    pub fn default_to(mut self, target: impl Into<String>) -> Self {
        self.default = Some(target.into());
        self
    }

    /// The case list with the default folded in: a trailing
    /// unconditional case is appended for the default target unless some
    /// case is already unconditional.
    pub fn normalized_cases(&self) -> Vec<SwitchCase> {
        let mut cases = self.cases.clone();
        if let Some(default) = &self.default {
            if !cases.iter().any(|c| c.when.is_empty()) {
                cases.push(SwitchCase {
                    when: Condition::Expr(String::new()),
                    then: default.clone(),
                });
            }
        }
        cases
    }
}

// ---------------------------------------------------------------------------
// FOR / FORK / TRY
// ---------------------------------------------------------------------------

/// Runs `tasks` once per element of `in_`, binding the element to `each`.
#[derive(Debug, Clone, PartialEq)]
pub struct ForConfig {
    pub each: String,
    pub in_: ConfigValue,
    pub tasks: Vec<Task>,
}

impl ForConfig {
    pub fn new(each: impl Into<String>, in_: impl Into<ConfigValue>) -> Self {
        Self {
            each: each.into(),
            in_: in_.into(),
            tasks: Vec::new(),
        }
    }

    pub fn task(mut self, task: Task) -> Self {
        self.tasks.push(task);
        self
    }

    /// The loop item, for use inside the body.
    pub fn item(&self) -> ObjectRef {
        ObjectRef::local(&self.each)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForkBranch {
    pub name: String,
    pub tasks: Vec<Task>,
}

/// Runs each branch concurrently; the next task starts after all finish.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForkConfig {
    pub branches: Vec<ForkBranch>,
}

impl ForkConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn branch(mut self, name: impl Into<String>, tasks: Vec<Task>) -> Self {
        self.branches.push(ForkBranch {
            name: name.into(),
            tasks,
        });
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatchBlock {
    /// Variable the caught error is bound to.
    pub as_: String,
    /// Error types handled by this block; empty catches everything.
    pub errors: Vec<String>,
    pub tasks: Vec<Task>,
}

impl CatchBlock {
    pub fn new(as_: impl Into<String>, tasks: Vec<Task>) -> Self {
        Self {
            as_: as_.into(),
            errors: Vec::new(),
            tasks,
        }
    }

    pub fn errors<I, S>(mut self, errors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.errors = errors.into_iter().map(Into::into).collect();
        self
    }

    /// The caught error, for use inside the block.
    pub fn error(&self) -> ObjectRef {
        ObjectRef::local(&self.as_)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TryConfig {
    pub tasks: Vec<Task>,
    pub catches: Vec<CatchBlock>,
}

impl TryConfig {
    pub fn new(tasks: Vec<Task>) -> Self {
        Self {
            tasks,
            catches: Vec::new(),
        }
    }

    pub fn catch(mut self, block: CatchBlock) -> Self {
        self.catches.push(block);
        self
    }
}

// ---------------------------------------------------------------------------
// LISTEN / WAIT
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct ListenConfig {
    pub signal: String,
    pub timeout_seconds: Option<u64>,
}

impl ListenConfig {
    pub fn new(signal: impl Into<String>) -> Self {
        Self {
            signal: signal.into(),
            timeout_seconds: None,
        }
    }

    pub fn timeout_seconds(mut self, seconds: u64) -> Self {
        self.timeout_seconds = Some(seconds);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WaitConfig {
    pub seconds: IntRef,
}

impl WaitConfig {
    pub fn new(seconds: impl Into<IntRef>) -> Self {
        Self {
            seconds: seconds.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// CALL_ACTIVITY / RAISE / RUN
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct CallActivityConfig {
    pub activity: String,
    pub input: ConfigValue,
}

impl CallActivityConfig {
    pub fn new(activity: impl Into<String>, input: impl Into<ConfigValue>) -> Self {
        Self {
            activity: activity.into(),
            input: input.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RaiseConfig {
    pub error: String,
    pub message: StringRef,
    pub data: Option<ConfigValue>,
}

impl RaiseConfig {
    pub fn new(error: impl Into<String>, message: impl Into<StringRef>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            data: None,
        }
    }

    pub fn data(mut self, data: impl Into<ConfigValue>) -> Self {
        self.data = Some(data.into());
        self
    }
}

/// Starts another workflow as a child run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub workflow: String,
    pub input: ConfigValue,
}

impl RunConfig {
    pub fn new(workflow: impl Into<String>, input: impl Into<ConfigValue>) -> Self {
        Self {
            workflow: workflow.into(),
            input: input.into(),
        }
    }
}
