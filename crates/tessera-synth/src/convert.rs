//! Task graph to wire conversion.
//!
//! Conversion is recursive: tasks inside `FOR`, `FORK` and `TRY` are
//! converted in full at their nesting position. Any error aborts the whole
//! workflow.

use serde_json::{Map, Value};
use tracing::warn;
use tessera_core::{
    ConfigValue, EncodeError, Flow, Task, TaskConfig, TaskKind, Workflow,
};

use crate::error::{Result, SynthError};
use crate::manifest::{TaskRecord, WorkflowBlueprint, tasks_digest};

/// Convert a resolved workflow.
///
/// # Errors
///
/// Returns the first [`SynthError`] raised by any task, at any depth.
pub fn convert_workflow(workflow: &Workflow) -> Result<WorkflowBlueprint> {
    let qualified = workflow.qualified_name();
    let tasks = convert_tasks(&qualified, &workflow.tasks)?;
    let digest = tasks_digest(&tasks)?;
    Ok(WorkflowBlueprint {
        namespace: workflow.namespace.clone(),
        name: workflow.name.clone(),
        version: workflow.version.clone(),
        description: workflow.description.clone(),
        env: workflow.env.clone(),
        digest,
        tasks,
    })
}

fn convert_tasks(workflow: &str, tasks: &[Task]) -> Result<Vec<TaskRecord>> {
    tasks
        .iter()
        .enumerate()
        .map(|(index, task)| convert_task(workflow, index, task))
        .collect()
}

/// Convert one task and everything nested in it.
///
/// # Errors
///
/// [`SynthError::UnknownTaskKind`] for a custom kind,
/// [`SynthError::InvalidTaskConfig`] when the config does not fit the kind,
/// [`SynthError::UnencodableConfig`] when a value has no wire form.
pub fn convert_task(workflow: &str, index: usize, task: &Task) -> Result<TaskRecord> {
    if let TaskKind::Custom(kind) = task.kind() {
        return Err(SynthError::UnknownTaskKind {
            workflow: workflow.to_string(),
            task: task.name().to_string(),
            kind: kind.clone(),
        });
    }
    task.validate()
        .map_err(|e| SynthError::invalid_config(workflow, index, task.name(), e.to_string()))?;
    for name in plaintext_secrets(task) {
        warn!(
            workflow,
            task = task.name(),
            value = name,
            "secret value is known at build time and is written to the manifest in plain text"
        );
    }

    let cx = TaskCx {
        workflow,
        index,
        task,
    };
    Ok(TaskRecord {
        name: task.name().to_string(),
        kind: task.kind().clone(),
        config: cx.config()?,
        export: task.export().map(str::to_string),
        then: task.flow().map(Flow::as_str).map(str::to_string),
        depends_on: task.depends_on().iter().cloned().collect(),
    })
}

/// Names of secret refs in `task`'s own config whose value is folded into
/// the manifest. Only runtime secrets stay out of it.
fn plaintext_secrets(task: &Task) -> Vec<&str> {
    let mut out = Vec::new();
    task.config().visit_refs(&mut |r| {
        if r.is_secret() && r.is_known() && !out.contains(&r.name()) {
            out.push(r.name());
        }
    });
    out
}

/// The task being converted, for error context.
struct TaskCx<'a> {
    workflow: &'a str,
    index: usize,
    task: &'a Task,
}

impl TaskCx<'_> {
    fn config(&self) -> Result<Value> {
        let mut out = Map::new();
        match self.task.config() {
            TaskConfig::Set(c) => {
                let mut vars = Map::new();
                for (name, value) in &c.variables {
                    vars.insert(name.clone(), self.encode(value, &format!("variables.{name}"))?);
                }
                out.insert("variables".into(), Value::Object(vars));
            }
            TaskConfig::HttpCall(c) => {
                if let Some(body) = &c.body {
                    out.insert("body".into(), self.encode(body, "body")?);
                }
                let mut endpoint = Map::new();
                endpoint.insert("uri".into(), c.uri.to_wire());
                out.insert("endpoint".into(), Value::Object(endpoint));
                if !c.headers.is_empty() {
                    let headers = c
                        .headers
                        .iter()
                        .map(|(k, v)| (k.clone(), v.to_wire()))
                        .collect();
                    out.insert("headers".into(), Value::Object(headers));
                }
                out.insert("method".into(), Value::String(c.method.to_string()));
                if let Some(t) = c.timeout_seconds {
                    out.insert("timeout_seconds".into(), Value::from(t));
                }
            }
            TaskConfig::GrpcCall(c) => {
                if let Some(body) = &c.body {
                    out.insert("body".into(), self.encode(body, "body")?);
                }
                out.insert("method".into(), Value::String(c.method.clone()));
                out.insert("service".into(), Value::String(c.service.clone()));
            }
            TaskConfig::Switch(c) => {
                if c.cases.is_empty() && c.default.is_none() {
                    return Err(self.invalid("SWITCH requires at least one case"));
                }
                let cases = c
                    .normalized_cases()
                    .iter()
                    .map(|case| {
                        let mut m = Map::new();
                        m.insert("then".into(), Value::String(case.then.clone()));
                        m.insert("when".into(), Value::String(case.when.to_wire()));
                        Value::Object(m)
                    })
                    .collect();
                out.insert("cases".into(), Value::Array(cases));
            }
            TaskConfig::For(c) => {
                out.insert("do".into(), self.nested(&c.tasks)?);
                out.insert("each".into(), Value::String(c.each.clone()));
                out.insert("in".into(), self.encode(&c.in_, "in")?);
            }
            TaskConfig::Fork(c) => {
                if c.branches.is_empty() {
                    return Err(self.invalid("FORK requires at least one branch"));
                }
                let mut branches = Vec::with_capacity(c.branches.len());
                for branch in &c.branches {
                    let mut m = Map::new();
                    m.insert("do".into(), self.nested(&branch.tasks)?);
                    m.insert("name".into(), Value::String(branch.name.clone()));
                    branches.push(Value::Object(m));
                }
                out.insert("branches".into(), Value::Array(branches));
            }
            TaskConfig::Try(c) => {
                if c.catches.is_empty() {
                    return Err(self.invalid("TRY requires at least one catch block"));
                }
                let mut catches = Vec::with_capacity(c.catches.len());
                for block in &c.catches {
                    let mut m = Map::new();
                    m.insert("as".into(), Value::String(block.as_.clone()));
                    m.insert("do".into(), self.nested(&block.tasks)?);
                    if !block.errors.is_empty() {
                        m.insert("errors".into(), Value::from(block.errors.clone()));
                    }
                    catches.push(Value::Object(m));
                }
                out.insert("catch".into(), Value::Array(catches));
                out.insert("try".into(), self.nested(&c.tasks)?);
            }
            TaskConfig::Listen(c) => {
                out.insert("signal".into(), Value::String(c.signal.clone()));
                if let Some(t) = c.timeout_seconds {
                    out.insert("timeout_seconds".into(), Value::from(t));
                }
            }
            TaskConfig::Wait(c) => {
                out.insert("seconds".into(), c.seconds.to_wire());
            }
            TaskConfig::CallActivity(c) => {
                out.insert("activity".into(), Value::String(c.activity.clone()));
                out.insert("input".into(), self.encode(&c.input, "input")?);
            }
            TaskConfig::Raise(c) => {
                if let Some(data) = &c.data {
                    out.insert("data".into(), self.encode(data, "data")?);
                }
                out.insert("error".into(), Value::String(c.error.clone()));
                out.insert("message".into(), c.message.to_wire());
            }
            TaskConfig::Run(c) => {
                out.insert("input".into(), self.encode(&c.input, "input")?);
                out.insert("workflow".into(), Value::String(c.workflow.clone()));
            }
        }
        Ok(Value::Object(out))
    }

    fn nested(&self, tasks: &[Task]) -> Result<Value> {
        let records = convert_tasks(self.workflow, tasks)?;
        Ok(serde_json::to_value(records)?)
    }

    fn encode(&self, value: &ConfigValue, field: &str) -> Result<Value> {
        value.to_json().map_err(|e: EncodeError| {
            let e = e.within(field);
            SynthError::UnencodableConfig {
                workflow: self.workflow.to_string(),
                task: self.task.name().to_string(),
                path: e.path,
                reason: e.reason,
            }
        })
    }

    fn invalid(&self, reason: &str) -> SynthError {
        SynthError::invalid_config(self.workflow, self.index, self.task.name(), reason)
    }
}
