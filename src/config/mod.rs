//! Configuration types and loading.
//!
//! `A2aConfig` is read from `config.toml` inside the configuration directory.
//! Every section falls back to its defaults, so partial files are fine.

mod settings;

pub use settings::{
    A2aConfig, AuthConfig, BrokerConfig, CONFIG_FILE_NAME, ConsensusConfig, ExecutorConfig,
    SECRET_ENV_VAR, default_config_dir,
};
