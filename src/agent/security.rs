//! Agent credentials: HMAC-SHA256 tokens and a role table.

use std::collections::HashMap;

use hmac::{Hmac, Mac};
use parking_lot::RwLock;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::config::AuthConfig;
use crate::error::{A2aError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Issues and checks the tokens carried in `Message::auth_token`.
pub trait CredentialVerifier: Send + Sync {
    fn issue_token(&self, agent_id: &str) -> String;
    fn verify(&self, agent_id: &str, token: &str) -> bool;
}

/// Token is the hex HMAC-SHA256 of the agent id under a shared secret.
pub struct AuthManager {
    keyed: HmacSha256,
    roles: RwLock<HashMap<String, String>>,
}

impl AuthManager {
    pub fn new(secret: &str) -> Result<Self> {
        let keyed = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|e| A2aError::Config(format!("invalid auth secret: {e}")))?;
        Ok(Self {
            keyed,
            roles: RwLock::new(HashMap::new()),
        })
    }

    pub fn from_config(config: &AuthConfig) -> Result<Self> {
        let manager = Self::new(&config.resolve_secret())?;
        manager.roles.write().extend(
            config
                .roles
                .iter()
                .map(|(agent, role)| (agent.clone(), role.clone())),
        );
        Ok(manager)
    }

    pub fn set_role(&self, agent_id: impl Into<String>, role: impl Into<String>) {
        self.roles.write().insert(agent_id.into(), role.into());
    }

    pub fn role(&self, agent_id: &str) -> Option<String> {
        self.roles.read().get(agent_id).cloned()
    }

    pub fn has_role(&self, agent_id: &str, required_role: &str) -> bool {
        self.roles
            .read()
            .get(agent_id)
            .is_some_and(|role| role == required_role)
    }

    fn digest(&self, agent_id: &str) -> Vec<u8> {
        let mut mac = self.keyed.clone();
        mac.update(agent_id.as_bytes());
        mac.finalize().into_bytes().to_vec()
    }
}

impl CredentialVerifier for AuthManager {
    fn issue_token(&self, agent_id: &str) -> String {
        hex::encode(self.digest(agent_id))
    }

    fn verify(&self, agent_id: &str, token: &str) -> bool {
        let Ok(provided) = hex::decode(token) else {
            return false;
        };
        self.digest(agent_id).as_slice().ct_eq(&provided).into()
    }
}
