//! Reference resolution over a finished workflow.
//!
//! Building a workflow never mutates tasks: `Task::field` only returns a ref
//! whose expression names the source task. This pass walks the finished
//! graph once and
//!
//! - resolves every task-output reference against the lexical scope of the
//!   consumer (its own list first, then each enclosing list),
//! - adds the dependency edge to the consumer and requests whole-output
//!   export on the source unless the author chose an export,
//! - warns when the source comes later in document order than the consumer,
//!   since its output only exists there if flow control jumps back,
//! - gathers the start-resolvable context variables the tasks read and, if
//!   there are any, prepends a `SET` task that initializes them.

use std::collections::{HashMap, HashSet};

use tessera_core::{
    ConfigValue, EnvVar, Leaf, RuntimeSource, SetConfig, Task, VarRef, Workflow,
};
use tracing::{debug, warn};

use crate::error::{Result, SynthError};

/// Name of the synthetic variable-initialization task.
pub const INIT_TASK_NAME: &str = "_init_context";

/// Position of a task: one `(nested list, index)` step per nesting level.
/// The list selector of the first step is always 0.
type TaskPath = Vec<(usize, usize)>;

/// A resolved task-output reference.
#[derive(Debug)]
struct Reference {
    consumer: TaskPath,
    source: TaskPath,
    source_name: String,
}

/// What the pass did, for logging.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Variables set by the init task, in first-reference order.
    pub init_vars: Vec<String>,
    /// Distinct (consumer, source) edges added.
    pub edges: usize,
    /// References to a task placed after the consumer.
    pub forward_refs: usize,
}

/// Resolve references in `workflow` in place.
///
/// # Errors
///
/// [`SynthError::DuplicateTaskName`] when a list holds two tasks with the
/// same name, [`SynthError::UnresolvedTaskReference`] when a task reads the
/// output of a task that is not in scope (or of itself).
pub fn resolve(workflow: &mut Workflow) -> Result<Resolution> {
    let qualified = workflow.qualified_name();

    let mut vars: Vec<VarRef> = Vec::new();
    collect_vars(&workflow.tasks, &mut vars);
    if !vars.is_empty() {
        prepend_init_task(workflow, &vars);
    }

    let mut walker = Walker {
        workflow: &qualified,
        scopes: Vec::new(),
        refs: Vec::new(),
        forward_refs: 0,
    };
    walker.walk(&workflow.tasks, &[], 0)?;
    let Walker {
        refs, forward_refs, ..
    } = walker;

    let mut seen = HashSet::new();
    for r in &refs {
        if !seen.insert((r.consumer.clone(), r.source.clone())) {
            continue;
        }
        if let Some(source) = task_at_mut(&mut workflow.tasks, &r.source) {
            source.apply_implicit_export();
        }
        if let Some(consumer) = task_at_mut(&mut workflow.tasks, &r.consumer) {
            consumer.add_dependency(r.source_name.clone());
        }
    }

    let resolution = Resolution {
        init_vars: vars.into_iter().map(|v| v.name).collect(),
        edges: seen.len(),
        forward_refs,
    };
    debug!(
        workflow = %qualified,
        init_vars = resolution.init_vars.len(),
        edges = resolution.edges,
        "resolved references"
    );
    Ok(resolution)
}

// ---------------------------------------------------------------------------
// Context variables
// ---------------------------------------------------------------------------

fn collect_vars(tasks: &[Task], out: &mut Vec<VarRef>) {
    for task in tasks {
        task.config().visit_refs(&mut |r| {
            let Some(expr) = r.expr() else { return };
            for leaf in expr.leaves() {
                if let Leaf::Var(var) = leaf {
                    if !out.iter().any(|v| v.name == var.name) {
                        out.push(var.clone());
                    }
                }
            }
        });
        for list in task.nested() {
            collect_vars(list, out);
        }
    }
}

fn prepend_init_task(workflow: &mut Workflow, vars: &[VarRef]) {
    let mut set = SetConfig::new();
    for var in vars {
        set = set.var(
            var.name.clone(),
            ConfigValue::String(var.source.initializer()),
        );
        match &var.source {
            RuntimeSource::Env(name) => workflow.require_env(EnvVar::new(name.clone())),
            RuntimeSource::Secret(name) => workflow.require_env(EnvVar::secret(name.clone())),
            RuntimeSource::Input(_) => {}
        }
    }
    workflow.tasks.insert(0, Task::new(INIT_TASK_NAME, set));
}

// ---------------------------------------------------------------------------
// Task-output references
// ---------------------------------------------------------------------------

struct Walker<'a> {
    workflow: &'a str,
    /// Innermost list last; each frame maps a visible name to its task.
    scopes: Vec<HashMap<&'a str, TaskPath>>,
    refs: Vec<Reference>,
    forward_refs: usize,
}

impl<'a> Walker<'a> {
    fn walk(&mut self, list: &'a [Task], parent: &[(usize, usize)], selector: usize) -> Result<()> {
        let mut frame = HashMap::with_capacity(list.len());
        for (index, task) in list.iter().enumerate() {
            let mut path = parent.to_vec();
            path.push((selector, index));
            if frame.insert(task.name(), path).is_some() {
                return Err(SynthError::DuplicateTaskName {
                    workflow: self.workflow.to_string(),
                    task: task.name().to_string(),
                });
            }
        }
        self.scopes.push(frame);

        for (index, task) in list.iter().enumerate() {
            let mut path = parent.to_vec();
            path.push((selector, index));

            for source in output_sources(task) {
                let resolved = if source == task.name() {
                    None
                } else {
                    self.lookup(&source)
                };
                let Some(source_path) = resolved else {
                    return Err(SynthError::UnresolvedTaskReference {
                        workflow: self.workflow.to_string(),
                        task: task.name().to_string(),
                        referenced: source,
                    });
                };
                if runs_after(&source_path, &path) {
                    warn!(
                        workflow = %self.workflow,
                        task = task.name(),
                        referenced = %source,
                        "task reads the output of a task placed after it"
                    );
                    self.forward_refs += 1;
                }
                self.refs.push(Reference {
                    consumer: path.clone(),
                    source: source_path,
                    source_name: source,
                });
            }

            for (k, nested) in task.nested().into_iter().enumerate() {
                self.walk(nested, &path, k)?;
            }
        }

        self.scopes.pop();
        Ok(())
    }

    fn lookup(&self, name: &str) -> Option<TaskPath> {
        self.scopes
            .iter()
            .rev()
            .find_map(|frame| frame.get(name).cloned())
    }
}

/// Whether `source`, found in one of the consumer's enclosing lists, sits
/// after the consumer (or after the consumer's ancestor in that list).
fn runs_after(source: &[(usize, usize)], consumer: &[(usize, usize)]) -> bool {
    let Some(depth) = source.len().checked_sub(1) else {
        return false;
    };
    match (source.get(depth), consumer.get(depth)) {
        (Some((_, s)), Some((_, c))) => s > c,
        _ => false,
    }
}

/// Names of tasks whose output `task`'s own config reads, in first-seen order.
fn output_sources(task: &Task) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    task.config().visit_refs(&mut |r| {
        let Some(expr) = r.expr() else { return };
        for leaf in expr.leaves() {
            if let Leaf::TaskOutput(name) = leaf {
                if !out.iter().any(|n| n == name) {
                    out.push(name.to_string());
                }
            }
        }
    });
    out
}

fn task_at_mut<'t>(tasks: &'t mut Vec<Task>, path: &[(usize, usize)]) -> Option<&'t mut Task> {
    let ((_, first), rest) = path.split_first()?;
    let mut task = tasks.get_mut(*first)?;
    for (selector, index) in rest {
        task = task.nested_mut().into_iter().nth(*selector)?.get_mut(*index)?;
    }
    Some(task)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
