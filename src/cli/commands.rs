use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::executor::TaskPriority;

#[derive(Parser)]
#[command(name = "kubectl-a2a")]
#[command(author, version, about = "Run automation functions through the A2A task executor", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(short, long, global = true, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Configuration directory (default: $XDG_CONFIG_HOME/kubectl-a2a)
    #[arg(long, global = true, env = "KUBECTL_A2A_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List all available functions
    ListFunctions,

    /// Show a function's description and parameter schema
    Describe {
        /// Function name
        function_name: String,
    },

    /// Execute a function through the priority executor
    Execute {
        /// Function name
        function_name: String,

        /// JSON object of parameters
        #[arg(short, long)]
        params: Option<String>,

        /// key=value parameter, value parsed as JSON when possible (repeatable)
        #[arg(short = 'P', long = "param")]
        param: Vec<String>,

        /// Scheduling priority (default: executor.default_priority)
        #[arg(long, value_enum)]
        priority: Option<PriorityArg>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,
    /// Print the configuration file path
    Path,
    /// Reset to defaults
    Reset,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PriorityArg {
    High,
    Medium,
    Low,
}

impl From<PriorityArg> for TaskPriority {
    fn from(arg: PriorityArg) -> Self {
        match arg {
            PriorityArg::High => Self::High,
            PriorityArg::Medium => Self::Medium,
            PriorityArg::Low => Self::Low,
        }
    }
}
