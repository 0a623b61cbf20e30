//! Command handlers, one module per subcommand.

pub mod config_cmd;
pub mod inspect;
pub mod synth;
