//! [`Synthesizer`] -- registered blueprints in, manifest files out.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use tessera_config::SynthConfig;
use tessera_core::{Agent, Workflow};
use tracing::{info, warn};

use crate::convert::convert_workflow;
use crate::error::Result;
use crate::manifest::{self, AgentManifest, Manifests, SdkMetadata, WorkflowManifest};
use crate::resolve::resolve;
use crate::writer::ManifestWriter;

/// What a synthesis run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SynthesisOutcome {
    /// No output directory: everything was converted, nothing written.
    DryRun { workflows: usize, agents: usize },
    /// Output directory set but no resources were registered.
    NothingToWrite,
    /// Manifests were written to these paths.
    Written { files: Vec<PathBuf> },
}

impl SynthesisOutcome {
    /// One-line human summary.
    pub fn summary(&self) -> String {
        match self {
            Self::DryRun { workflows, agents } => format!(
                "dry run: converted {workflows} workflow(s) and {agents} agent(s); \
                 set TESSERA_OUTPUT_DIR to write manifests"
            ),
            Self::NothingToWrite => {
                "warning: no workflows or agents registered; nothing written".to_string()
            }
            Self::Written { files } => {
                let names: Vec<String> = files.iter().map(|p| p.display().to_string()).collect();
                format!("wrote {}", names.join(", "))
            }
        }
    }
}

/// Converts workflows and agents into manifests and writes them.
#[derive(Debug)]
pub struct Synthesizer<'a> {
    config: &'a SynthConfig,
    generated_at: DateTime<Utc>,
}

impl<'a> Synthesizer<'a> {
    pub fn new(config: &'a SynthConfig, generated_at: DateTime<Utc>) -> Self {
        Self {
            config,
            generated_at,
        }
    }

    /// Resolve and convert everything. Inputs are not modified; each
    /// workflow is resolved on a copy.
    ///
    /// # Errors
    ///
    /// The first resolution or conversion error of any workflow.
    pub fn build(&self, workflows: &[Workflow], agents: &[Agent]) -> Result<Manifests> {
        let mut blueprints = Vec::with_capacity(workflows.len());
        for workflow in workflows {
            let mut resolved = workflow.clone();
            resolve(&mut resolved)?;
            let blueprint = convert_workflow(&resolved)?;
            info!(
                workflow = %workflow.qualified_name(),
                tasks = blueprint.tasks.len(),
                "converted workflow"
            );
            blueprints.push(blueprint);
        }

        let sdk = SdkMetadata::new(self.generated_at);
        Ok(Manifests {
            workflow: (!blueprints.is_empty()).then(|| WorkflowManifest {
                sdk: sdk.clone(),
                workflows: blueprints,
            }),
            agent: (!agents.is_empty()).then(|| AgentManifest {
                sdk,
                agents: agents.to_vec(),
            }),
        })
    }

    /// Build and, unless this is a dry run, write the manifests.
    ///
    /// # Errors
    ///
    /// Any [`build`](Self::build) error, or [`SynthError::Io`](crate::SynthError::Io)
    /// from the write.
    pub fn synthesize(&self, workflows: &[Workflow], agents: &[Agent]) -> Result<SynthesisOutcome> {
        let manifests = self.build(workflows, agents)?;

        let Some(dir) = &self.config.output_dir else {
            info!(
                workflows = manifests.workflow_count(),
                agents = manifests.agent_count(),
                "dry run, no output directory configured"
            );
            return Ok(SynthesisOutcome::DryRun {
                workflows: manifests.workflow_count(),
                agents: manifests.agent_count(),
            });
        };

        if manifests.is_empty() {
            warn!(dir = ?dir, "no workflows or agents registered, nothing to write");
            return Ok(SynthesisOutcome::NothingToWrite);
        }

        let pretty = self.config.pretty;
        let mut files = Vec::new();
        if let Some(m) = &manifests.workflow {
            files.push((self.config.workflow_file.as_str(), manifest::encode(m, pretty)?));
        }
        if let Some(m) = &manifests.agent {
            files.push((self.config.agent_file.as_str(), manifest::encode(m, pretty)?));
        }
        let files = ManifestWriter::new(dir).write_all(&files)?;
        Ok(SynthesisOutcome::Written { files })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use tessera_core::{Task, TaskKind, WaitConfig};

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn workflow() -> Workflow {
        Workflow::new("ns", "wf").task(Task::new("pause", WaitConfig::new(5)))
    }

    #[test]
    fn test_dry_run_converts_without_writing() {
        let config = SynthConfig::default();
        let outcome = Synthesizer::new(&config, ts())
            .synthesize(&[workflow()], &[Agent::new("a", "b")])
            .unwrap();
        assert_eq!(
            outcome,
            SynthesisOutcome::DryRun {
                workflows: 1,
                agents: 1
            }
        );
    }

    #[test]
    fn test_dry_run_still_reports_errors() {
        let bad = Workflow::new("ns", "bad").task(Task::from_parts(
            "x",
            TaskKind::from("EMIT"),
            WaitConfig::new(1).into(),
        ));
        let config = SynthConfig::default();
        assert!(Synthesizer::new(&config, ts()).synthesize(&[bad], &[]).is_err());
    }

    #[test]
    fn test_nothing_to_write_with_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = SynthConfig::default().with_output_dir(dir.path().join("out"));
        let outcome = Synthesizer::new(&config, ts()).synthesize(&[], &[]).unwrap();
        assert_eq!(outcome, SynthesisOutcome::NothingToWrite);
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn test_only_populated_categories_are_written() {
        let dir = tempfile::tempdir().unwrap();
        let config = SynthConfig::default().with_output_dir(dir.path());
        let outcome = Synthesizer::new(&config, ts())
            .synthesize(&[workflow()], &[])
            .unwrap();
        assert_eq!(
            outcome,
            SynthesisOutcome::Written {
                files: vec![dir.path().join("workflow-manifest.json")]
            }
        );
        assert!(!dir.path().join("agent-manifest.json").exists());
    }

    #[test]
    fn test_failed_conversion_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let config = SynthConfig::default().with_output_dir(dir.path());
        let bad = Workflow::new("ns", "bad").task(Task::from_parts(
            "x",
            TaskKind::Switch,
            WaitConfig::new(1).into(),
        ));
        let result = Synthesizer::new(&config, ts()).synthesize(&[workflow(), bad], &[]);
        assert!(result.is_err());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_build_leaves_inputs_untouched() {
        let source = Task::new("src", WaitConfig::new(1));
        let seconds = source.field_int("n");
        let wf = Workflow::new("ns", "wf")
            .task(source)
            .task(Task::new("use", WaitConfig::new(seconds)));
        let before = wf.clone();
        let config = SynthConfig::default();
        let manifests = Synthesizer::new(&config, ts()).build(&[wf.clone()], &[]).unwrap();
        assert_eq!(wf, before);
        let tasks = &manifests.workflow.unwrap().workflows[0].tasks;
        assert_eq!(tasks[0].export.as_deref(), Some("${.}"));
        assert_eq!(tasks[1].depends_on, vec!["src"]);
    }

    #[test]
    fn test_summary_lines() {
        assert!(SynthesisOutcome::NothingToWrite.summary().starts_with("warning"));
        let written = SynthesisOutcome::Written {
            files: vec![PathBuf::from("out/w.json")],
        };
        assert_eq!(written.summary(), "wrote out/w.json");
    }
}
