//! Manifest wire types.
//!
//! One manifest per resource category. Struct fields serialize in
//! declaration order and config trees are `serde_json` maps (sorted keys),
//! so equal input yields byte-equal output apart from `generated_at`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tessera_core::{Agent, EnvVar, TaskKind};

/// Language tag written into every manifest.
pub const SDK_LANGUAGE: &str = "rust";

/// Version of this SDK.
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Who produced a manifest, and when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SdkMetadata {
    pub language: String,
    pub version: String,
    pub generated_at: DateTime<Utc>,
}

impl SdkMetadata {
    pub fn new(generated_at: DateTime<Utc>) -> Self {
        Self {
            language: SDK_LANGUAGE.to_string(),
            version: SDK_VERSION.to_string(),
            generated_at,
        }
    }
}

/// One converted task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub name: String,

    pub kind: TaskKind,

    /// Kind-specific config as a schema-less value tree.
    pub config: Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export: Option<String>,

    /// Explicit successor task name, or `end`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub then: Option<String>,

    /// Tasks whose output this task reads, sorted.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
}

/// One converted workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowBlueprint {
    pub namespace: String,

    pub name: String,

    pub version: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<EnvVar>,

    /// SHA-256 of the canonical task list.
    pub digest: String,

    pub tasks: Vec<TaskRecord>,
}

/// Computes the digest of a task list.
pub fn tasks_digest(tasks: &[TaskRecord]) -> serde_json::Result<String> {
    let bytes = serde_json::to_vec(tasks)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowManifest {
    pub sdk: SdkMetadata,
    pub workflows: Vec<WorkflowBlueprint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentManifest {
    pub sdk: SdkMetadata,
    pub agents: Vec<Agent>,
}

/// Both manifests of a run. A category with no resources has no manifest.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Manifests {
    pub workflow: Option<WorkflowManifest>,
    pub agent: Option<AgentManifest>,
}

impl Manifests {
    pub fn is_empty(&self) -> bool {
        self.workflow.is_none() && self.agent.is_none()
    }

    pub fn workflow_count(&self) -> usize {
        self.workflow.as_ref().map_or(0, |m| m.workflows.len())
    }

    pub fn agent_count(&self) -> usize {
        self.agent.as_ref().map_or(0, |m| m.agents.len())
    }
}

/// Encodes a manifest as JSON with a trailing newline.
pub fn encode<T: Serialize>(manifest: &T, pretty: bool) -> serde_json::Result<Vec<u8>> {
    let mut bytes = if pretty {
        serde_json::to_vec_pretty(manifest)?
    } else {
        serde_json::to_vec(manifest)?
    };
    bytes.push(b'\n');
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn record(name: &str) -> TaskRecord {
        TaskRecord {
            name: name.to_string(),
            kind: TaskKind::Wait,
            config: json!({"seconds": 5}),
            export: None,
            then: None,
            depends_on: Vec::new(),
        }
    }

    #[test]
    fn test_task_record_skips_empty_fields() {
        let text = serde_json::to_string(&record("pause")).unwrap();
        assert_eq!(text, r#"{"name":"pause","kind":"WAIT","config":{"seconds":5}}"#);
    }

    #[test]
    fn test_digest_is_stable_and_content_sensitive() {
        let a = tasks_digest(&[record("a")]).unwrap();
        assert_eq!(a, tasks_digest(&[record("a")]).unwrap());
        assert_ne!(a, tasks_digest(&[record("b")]).unwrap());
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_metadata_serializes_rfc3339() {
        let ts = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let value = serde_json::to_value(SdkMetadata::new(ts)).unwrap();
        assert_eq!(value["language"], "rust");
        assert_eq!(value["generated_at"], "2026-01-02T03:04:05Z");
    }

    #[test]
    fn test_manifest_round_trips() {
        let ts = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let manifest = WorkflowManifest {
            sdk: SdkMetadata::new(ts),
            workflows: vec![WorkflowBlueprint {
                namespace: "ns".into(),
                name: "wf".into(),
                version: "1.0.0".into(),
                description: String::new(),
                env: vec![EnvVar::new("HOST")],
                digest: tasks_digest(&[record("a")]).unwrap(),
                tasks: vec![record("a")],
            }],
        };
        let bytes = encode(&manifest, true).unwrap();
        assert_eq!(bytes.last(), Some(&b'\n'));
        let back: WorkflowManifest = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(back, manifest);
    }
}
