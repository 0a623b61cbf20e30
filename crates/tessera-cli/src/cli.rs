//! Clap CLI definitions for the `tessera` command.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// tessera -- workflow and agent blueprint synthesizer.
#[derive(Parser, Debug)]
#[command(
    name = "tessera",
    about = "Synthesize workflow and agent blueprints into manifests",
    version,
    propagate_version = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Global flags available to all subcommands.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Directory to read `tessera.toml` from (default: current directory).
    #[arg(short = 'C', long = "dir", global = true)]
    pub dir: Option<PathBuf>,

    /// Output in JSON format.
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose/debug output.
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the bundled sample blueprints and synthesize them.
    Synth(SynthArgs),

    /// Summarize an existing workflow or agent manifest.
    Inspect(InspectArgs),

    /// Show the effective synthesis configuration.
    Config,
}

#[derive(Args, Debug)]
pub struct SynthArgs {
    /// Write manifests here (overrides TESSERA_OUTPUT_DIR and tessera.toml).
    #[arg(short = 'o', long)]
    pub output_dir: Option<PathBuf>,

    /// Write single-line JSON instead of pretty-printed.
    #[arg(long)]
    pub compact: bool,
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Manifest file to read.
    pub file: PathBuf,
}
