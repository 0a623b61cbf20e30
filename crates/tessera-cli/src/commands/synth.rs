//! `tessera synth` -- build the sample blueprints and synthesize them.

use anyhow::{Context as _, Result};
use tessera_synth::{Context, SynthesisOutcome};
use tracing::debug;

use crate::cli::SynthArgs;
use crate::context::RuntimeContext;
use crate::output::output_json;
use crate::samples;

/// Execute the `tessera synth` command.
pub fn run(ctx: &RuntimeContext, args: &SynthArgs) -> Result<()> {
    let mut config = ctx.load_config()?;
    if let Some(dir) = &args.output_dir {
        config = config.with_output_dir(dir);
    }
    if args.compact {
        config.pretty = false;
    }
    debug!(?config, "effective synthesis config");

    let mut synth_ctx = Context::new(config);
    samples::build(&mut synth_ctx).context("failed to build sample blueprints")?;
    let outcome = synth_ctx.synthesize().context("synthesis failed")?;

    if ctx.json {
        output_json(&outcome_json(&outcome));
    } else {
        println!("{}", outcome.summary());
    }
    Ok(())
}

fn outcome_json(outcome: &SynthesisOutcome) -> serde_json::Value {
    match outcome {
        SynthesisOutcome::DryRun { workflows, agents } => serde_json::json!({
            "status": "dry_run",
            "workflows": workflows,
            "agents": agents,
        }),
        SynthesisOutcome::NothingToWrite => serde_json::json!({"status": "nothing_to_write"}),
        SynthesisOutcome::Written { files } => serde_json::json!({
            "status": "written",
            "files": files.iter().map(|p| p.display().to_string()).collect::<Vec<_>>(),
        }),
    }
}
