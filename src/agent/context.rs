//! Shared multi-cluster state and the process-wide A2A context.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use sha2::{Digest, Sha256};
use tracing::debug;

use super::consensus::MajorityConsensus;
use super::messaging::AgentMessageBus;
use super::security::AuthManager;
use crate::config::A2aConfig;
use crate::error::{A2aError, Result};
use crate::executor::{PriorityTaskExecutor, TaskPriority};
use crate::functions::{FunctionParams, FunctionRegistry};

pub const CONTEXT_FORMAT_VERSION: u64 = 1;

fn unknown_cluster_type() -> String {
    "unknown".to_string()
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Point-in-time view of one cluster, serialized with single-letter keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterSnapshot {
    #[serde(rename = "n")]
    pub name: String,
    #[serde(rename = "t", default = "unknown_cluster_type")]
    pub cluster_type: String,
    #[serde(rename = "r", default)]
    pub resources_by_type: BTreeMap<String, Vec<Value>>,
    #[serde(rename = "k", default)]
    pub kubestellar_resources: Vec<Value>,
    #[serde(rename = "u", default = "now_ms")]
    pub updated_ms: i64,
}

impl ClusterSnapshot {
    pub fn new(name: impl Into<String>, cluster_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cluster_type: cluster_type.into(),
            resources_by_type: BTreeMap::new(),
            kubestellar_resources: Vec::new(),
            updated_ms: now_ms(),
        }
    }

    pub fn with_resources(mut self, kind: impl Into<String>, resources: Vec<Value>) -> Self {
        self.resources_by_type.insert(kind.into(), resources);
        self
    }

    pub fn to_compact(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn from_compact(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }
}

/// Versioned, key-sorted compact JSON with content hashing.
pub struct ContextSerializer;

impl ContextSerializer {
    pub fn dumps(context: &Value) -> Result<String> {
        let envelope = json!({ "v": CONTEXT_FORMAT_VERSION, "ctx": context });
        Ok(serde_json::to_string(&sorted(envelope))?)
    }

    /// Returns the inner context, or an empty object when absent.
    pub fn loads(text: &str) -> Result<Value> {
        let mut envelope: Value = serde_json::from_str(text)?;
        if !envelope.is_object() {
            return Err(A2aError::InvalidParameters(
                "serialized context must be a JSON object".into(),
            ));
        }
        Ok(envelope
            .get_mut("ctx")
            .map(Value::take)
            .unwrap_or_else(|| Value::Object(Map::new())))
    }

    pub fn hash(text: &str) -> String {
        hex::encode(Sha256::digest(text.as_bytes()))
    }
}

fn sorted(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let entries: BTreeMap<String, Value> =
                map.into_iter().map(|(k, v)| (k, sorted(v))).collect();
            Value::Object(entries.into_iter().collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sorted).collect()),
        other => other,
    }
}

/// Serialized context together with its hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextDelta {
    pub hash: String,
    pub context: Value,
}

/// Latest snapshot per cluster.
#[derive(Default)]
pub struct SharedContext {
    clusters: RwLock<BTreeMap<String, ClusterSnapshot>>,
    last_hash: Mutex<Option<String>>,
}

impl SharedContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any earlier snapshot with the same name.
    pub fn update_cluster(&self, snapshot: ClusterSnapshot) {
        debug!(cluster = %snapshot.name, "Cluster snapshot updated");
        self.clusters.write().insert(snapshot.name.clone(), snapshot);
    }

    pub fn cluster(&self, name: &str) -> Option<ClusterSnapshot> {
        self.clusters.read().get(name).cloned()
    }

    pub fn cluster_count(&self) -> usize {
        self.clusters.read().len()
    }

    pub fn to_model_context(&self) -> Result<Value> {
        let clusters = self
            .clusters
            .read()
            .iter()
            .map(|(name, snapshot)| Ok((name.clone(), snapshot.to_compact()?)))
            .collect::<Result<Map<String, Value>>>()?;
        Ok(json!({ "clusters": clusters }))
    }

    pub fn serialize(&self) -> Result<String> {
        ContextSerializer::dumps(&self.to_model_context()?)
    }

    /// Returns the serialized context only if it differs from the last call's.
    pub fn delta_if_changed(&self) -> Result<Option<ContextDelta>> {
        let text = self.serialize()?;
        let hash = ContextSerializer::hash(&text);

        let mut last_hash = self.last_hash.lock();
        if last_hash.as_deref() == Some(hash.as_str()) {
            return Ok(None);
        }
        *last_hash = Some(hash.clone());

        Ok(Some(ContextDelta {
            hash,
            context: serde_json::from_str(&text)?,
        }))
    }
}

/// Process-wide collaborators, built once by the entry point and passed down.
pub struct A2aContext {
    pub config: A2aConfig,
    pub bus: AgentMessageBus,
    pub executor: PriorityTaskExecutor,
    pub shared: Arc<SharedContext>,
    pub auth: Arc<AuthManager>,
    pub functions: FunctionRegistry,
}

impl A2aContext {
    pub fn new(config: A2aConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            bus: AgentMessageBus::from_config(&config.broker),
            executor: PriorityTaskExecutor::new(),
            shared: Arc::new(SharedContext::new()),
            auth: Arc::new(AuthManager::from_config(&config.auth)?),
            functions: FunctionRegistry::with_builtins(),
            config,
        })
    }

    pub fn consensus(&self, agent_id: impl Into<String>) -> Result<MajorityConsensus> {
        Ok(MajorityConsensus::new(self.bus.clone(), agent_id)?
            .with_default_timeout(self.config.consensus.default_timeout()))
    }

    /// Run a registered function through the executor.
    ///
    /// `priority` falls back to `executor.default_priority`.
    pub async fn execute_function(
        &self,
        name: &str,
        params: FunctionParams,
        priority: Option<TaskPriority>,
    ) -> Result<Value> {
        let function = self
            .functions
            .get(name)
            .ok_or_else(|| A2aError::FunctionNotFound(name.to_string()))?;
        let priority = priority.unwrap_or(self.config.executor.default_priority);
        self.executor
            .run_function(function, params, priority)
            .await
    }

    pub async fn shutdown(&self) {
        self.executor.shutdown().await;
    }
}
