//! Program entry helpers: load config, build, synthesize, report.

use std::process::ExitCode;

use tessera_config::{ConfigError, SynthConfig};
use tracing::error;

use crate::context::Context;
use crate::error::SynthError;
use crate::synthesizer::SynthesisOutcome;

/// Error type user build functions may return; anything convertible works
/// with `?`.
pub type BuildError = Box<dyn std::error::Error + Send + Sync>;

/// Why a run failed.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The user's build function failed.
    #[error("build failed: {0}")]
    Build(BuildError),

    #[error(transparent)]
    Synth(#[from] SynthError),
}

/// Build blueprints into a fresh context and synthesize them with `config`.
///
/// # Errors
///
/// Returns [`RunError::Build`] if `build` fails, otherwise any synthesis
/// error.
pub fn run_with<F>(config: SynthConfig, build: F) -> Result<SynthesisOutcome, RunError>
where
    F: FnOnce(&mut Context) -> Result<(), BuildError>,
{
    let mut ctx = Context::new(config);
    build(&mut ctx).map_err(RunError::Build)?;
    Ok(ctx.synthesize()?)
}

/// Load configuration from `tessera.toml` and `TESSERA_*`, run `build`,
/// synthesize, and report on stderr. Use as the tail of `main`:
///
/// ```no_run
/// use std::process::ExitCode;
/// use tessera_core::{Task, WaitConfig, Workflow};
///
/// fn main() -> ExitCode {
///     tessera_synth::run(|ctx| {
///         ctx.register_workflow(
///             Workflow::new("demo", "pause").task(Task::new("wait", WaitConfig::new(5))),
///         );
///         Ok(())
///     })
/// }
/// ```
pub fn run<F>(build: F) -> ExitCode
where
    F: FnOnce(&mut Context) -> Result<(), BuildError>,
{
    let result = SynthConfig::load()
        .map_err(RunError::from)
        .and_then(|config| run_with(config, build));
    report(&result)
}

/// Print the outcome and map it to an exit code.
pub fn report(result: &Result<SynthesisOutcome, RunError>) -> ExitCode {
    match result {
        Ok(outcome) => {
            eprintln!("{}", outcome.summary());
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "synthesis failed");
            eprintln!("Error: {e}");
            let mut source = std::error::Error::source(e);
            while let Some(cause) = source {
                eprintln!("  caused by: {cause}");
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    }
}
