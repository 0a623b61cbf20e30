//! `tessera config` -- show the effective synthesis configuration.

use anyhow::Result;

use crate::context::RuntimeContext;
use crate::output::output_json;

/// Execute the `tessera config` command.
pub fn run(ctx: &RuntimeContext) -> Result<()> {
    let config = ctx.load_config()?;
    if ctx.json {
        output_json(&config);
        return Ok(());
    }

    let output_dir = match &config.output_dir {
        Some(dir) => dir.display().to_string(),
        None => "(unset: dry run)".to_string(),
    };
    println!("output_dir:    {output_dir}");
    println!("workflow_file: {}", config.workflow_file);
    println!("agent_file:    {}", config.agent_file);
    println!("pretty:        {}", config.pretty);
    Ok(())
}
