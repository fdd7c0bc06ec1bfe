use thiserror::Error;

#[derive(Error, Debug)]
pub enum A2aError {
    #[error("Task cancelled before it started")]
    TaskCancelled,

    #[error("Task failed: {0}")]
    TaskFailed(String),

    #[error("Task panicked: {0}")]
    TaskPanicked(String),

    #[error("Function not found: {0}")]
    FunctionNotFound(String),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_bw::Error),
}

impl A2aError {
    /// Whether the error came from cancellation rather than from the work itself.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::TaskCancelled)
    }
}

pub type Result<T> = std::result::Result<T, A2aError>;
