//! `tessera inspect` -- summarize a workflow or agent manifest.

use anyhow::{Context, Result, bail};
use serde_json::Value;
use tessera_synth::manifest::tasks_digest;
use tessera_synth::{AgentManifest, TaskRecord, WorkflowManifest};

use crate::cli::InspectArgs;
use crate::context::RuntimeContext;
use crate::output::{output_json, output_table};

/// Execute the `tessera inspect` command.
pub fn run(ctx: &RuntimeContext, args: &InspectArgs) -> Result<()> {
    let text = std::fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let raw: Value = serde_json::from_str(&text)
        .with_context(|| format!("{} is not valid JSON", args.file.display()))?;

    let summary = if raw.get("workflows").is_some() {
        let manifest: WorkflowManifest =
            serde_json::from_value(raw).context("malformed workflow manifest")?;
        summarize_workflows(&manifest)?
    } else if raw.get("agents").is_some() {
        let manifest: AgentManifest =
            serde_json::from_value(raw).context("malformed agent manifest")?;
        summarize_agents(&manifest)
    } else {
        bail!(
            "{} is neither a workflow nor an agent manifest",
            args.file.display()
        );
    };

    if ctx.json {
        output_json(&summary.to_json());
    } else {
        summary.print();
    }
    Ok(())
}

/// What `inspect` reports about one manifest.
#[derive(Debug, PartialEq)]
struct Summary {
    kind: &'static str,
    sdk: String,
    generated_at: String,
    headers: Vec<&'static str>,
    rows: Vec<Vec<String>>,
}

impl Summary {
    fn print(&self) {
        println!(
            "{} manifest ({}) generated {}",
            self.kind, self.sdk, self.generated_at
        );
        output_table(&self.headers, &self.rows);
    }

    fn to_json(&self) -> Value {
        let entries: Vec<Value> = self
            .rows
            .iter()
            .map(|row| {
                let fields = self
                    .headers
                    .iter()
                    .zip(row)
                    .map(|(h, cell)| (h.to_lowercase(), Value::String(cell.clone())))
                    .collect();
                Value::Object(fields)
            })
            .collect();
        serde_json::json!({
            "kind": self.kind,
            "sdk": self.sdk,
            "generated_at": self.generated_at,
            "entries": entries,
        })
    }
}

fn summarize_workflows(manifest: &WorkflowManifest) -> Result<Summary> {
    let mut rows = Vec::new();
    for wf in &manifest.workflows {
        let digest = tasks_digest(&wf.tasks)
            .with_context(|| format!("cannot hash tasks of {}/{}", wf.namespace, wf.name))?;
        let check = if digest == wf.digest { "ok" } else { "MISMATCH" };
        rows.push(vec![
            format!("{}/{}", wf.namespace, wf.name),
            wf.version.clone(),
            count_tasks(&wf.tasks).to_string(),
            wf.env.len().to_string(),
            check.to_string(),
        ]);
    }
    Ok(Summary {
        kind: "workflow",
        sdk: format!("{} {}", manifest.sdk.language, manifest.sdk.version),
        generated_at: manifest.sdk.generated_at.to_rfc3339(),
        headers: vec!["NAME", "VERSION", "TASKS", "ENV", "DIGEST"],
        rows,
    })
}

fn summarize_agents(manifest: &AgentManifest) -> Summary {
    let rows = manifest
        .agents
        .iter()
        .map(|agent| {
            vec![
                agent.name.clone(),
                agent.model.clone().unwrap_or_else(|| "-".to_string()),
                agent.skills.len().to_string(),
                agent.mcp_servers.len().to_string(),
                agent.sub_agents.len().to_string(),
            ]
        })
        .collect();
    Summary {
        kind: "agent",
        sdk: format!("{} {}", manifest.sdk.language, manifest.sdk.version),
        generated_at: manifest.sdk.generated_at.to_rfc3339(),
        headers: vec!["NAME", "MODEL", "SKILLS", "MCP", "SUBAGENTS"],
        rows,
    }
}

/// Count tasks including those nested in `do`, `try`, `catch` and branch
/// lists of the config tree.
fn count_tasks(tasks: &[TaskRecord]) -> usize {
    tasks.iter().map(|t| 1 + count_nested(&t.config)).sum()
}

fn count_nested(config: &Value) -> usize {
    let list = |key: &str| -> usize {
        config
            .get(key)
            .and_then(Value::as_array)
            .map_or(0, |items| items.iter().map(count_record).sum())
    };
    let from_blocks = |key: &str| -> usize {
        config
            .get(key)
            .and_then(Value::as_array)
            .map_or(0, |blocks| {
                blocks
                    .iter()
                    .filter_map(|b| b.get("do").and_then(Value::as_array))
                    .flat_map(|items| items.iter().map(count_record))
                    .sum()
            })
    };
    list("do") + list("try") + from_blocks("catch") + from_blocks("branches")
}

fn count_record(record: &Value) -> usize {
    1 + record.get("config").map_or(0, count_nested)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(name: &str, config: Value) -> TaskRecord {
        serde_json::from_value(json!({"name": name, "kind": "SET", "config": config})).unwrap()
    }

    #[test]
    fn counts_nested_tasks() {
        let leaf = json!({"name": "leaf", "kind": "WAIT", "config": {"seconds": 1}});
        let tasks = vec![
            record("flat", json!({"variables": {}})),
            record(
                "loop",
                json!({
                    "do": [{
                        "name": "fan",
                        "kind": "FORK",
                        "config": {"branches": [{"name": "a", "do": [leaf.clone()]}]},
                    }],
                }),
            ),
            record(
                "guard",
                json!({"try": [leaf.clone()], "catch": [{"as": "e", "do": [leaf]}]}),
            ),
        ];
        // flat + loop/fan/leaf + guard/leaf/leaf
        assert_eq!(count_tasks(&tasks), 7);
    }

    #[test]
    fn tampered_digest_is_flagged() {
        let manifest: WorkflowManifest = serde_json::from_value(json!({
            "sdk": {"language": "rust", "version": "0.1.0", "generated_at": "2026-01-01T00:00:00Z"},
            "workflows": [{
                "namespace": "demo",
                "name": "wf",
                "version": "0.1.0",
                "digest": "0000",
                "tasks": [{"name": "t", "kind": "WAIT", "config": {"seconds": 1}}],
            }],
        }))
        .unwrap();
        let summary = summarize_workflows(&manifest).unwrap();
        assert_eq!(
            summary.rows,
            vec![vec!["demo/wf", "0.1.0", "1", "0", "MISMATCH"]]
        );
    }
}
