//! Command-line interface definitions.
//!
//! - `Cli`, `Commands`: argument definitions via clap
//! - `Display`: colored terminal output
//! - `parse_params`: `--params` / `-P key=value` handling

mod commands;
mod display;
mod params;

pub use commands::{Cli, Commands, ConfigAction, OutputFormat, PriorityArg};
pub use display::Display;
pub use params::parse_params;
