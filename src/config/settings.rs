use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::error::{A2aError, Result};
use crate::executor::TaskPriority;

pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const SECRET_ENV_VAR: &str = "A2A_SECRET";
const FALLBACK_SECRET: &str = "dev-secret";
const APP_DIR_NAME: &str = "kubectl-a2a";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct A2aConfig {
    pub executor: ExecutorConfig,
    pub broker: BrokerConfig,
    pub consensus: ConsensusConfig,
    pub auth: AuthConfig,
}

impl A2aConfig {
    pub async fn load(config_dir: &Path) -> Result<Self> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);
        let config = if config_path.exists() {
            let content = fs::read_to_string(&config_path).await?;
            toml::from_str(&content)?
        } else {
            Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub async fn save(&self, config_dir: &Path) -> Result<()> {
        self.validate()?;
        fs::create_dir_all(config_dir).await?;
        let config_path = config_dir.join(CONFIG_FILE_NAME);
        let content =
            toml::to_string_pretty(self).map_err(|e| A2aError::Config(e.to_string()))?;
        fs::write(&config_path, content).await?;
        Ok(())
    }

    /// Validate configuration values for consistency and safety.
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        if self.broker.topic_capacity == 0 {
            errors.push("broker.topic_capacity must be greater than 0");
        }
        if self.broker.inbox_capacity == 0 {
            errors.push("broker.inbox_capacity must be greater than 0");
        }
        if self.consensus.default_timeout_ms == 0 {
            errors.push("consensus.default_timeout_ms must be greater than 0");
        }
        if self
            .auth
            .secret
            .as_deref()
            .is_some_and(|s| s.trim().is_empty())
        {
            errors.push("auth.secret must not be blank when set");
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(A2aError::Config(format!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            )))
        }
    }
}

/// Resolve the default configuration directory.
///
/// `$XDG_CONFIG_HOME/kubectl-a2a`, falling back to `$HOME/.config/kubectl-a2a`,
/// and finally to a relative `.kubectl-a2a` when neither variable is set.
pub fn default_config_dir() -> PathBuf {
    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
        return PathBuf::from(xdg).join(APP_DIR_NAME);
    }
    if let Some(home) = std::env::var_os("HOME").filter(|v| !v.is_empty()) {
        return PathBuf::from(home).join(".config").join(APP_DIR_NAME);
    }
    PathBuf::from(format!(".{APP_DIR_NAME}"))
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Priority used by the CLI when `--priority` is omitted.
    pub default_priority: TaskPriority,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    /// Pending message limit for each topic subscription.
    pub topic_capacity: usize,
    /// Pending message limit for each direct inbox.
    pub inbox_capacity: usize,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            topic_capacity: 1024,
            inbox_capacity: 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsensusConfig {
    pub default_timeout_ms: u64,
}

impl ConsensusConfig {
    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_timeout_ms)
    }
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            default_timeout_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC secret for agent tokens. Falls back to `A2A_SECRET`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    /// Agent id to role assignments.
    pub roles: HashMap<String, String>,
}

impl AuthConfig {
    pub fn resolve_secret(&self) -> String {
        self.secret
            .clone()
            .filter(|s| !s.trim().is_empty())
            .or_else(|| std::env::var(SECRET_ENV_VAR).ok().filter(|s| !s.is_empty()))
            .unwrap_or_else(|| FALLBACK_SECRET.to_string())
    }
}
