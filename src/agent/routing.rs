//! Topic naming for cluster, resource and role scoped messages.

use serde::{Deserialize, Serialize};

pub const DEFAULT_ROLE: &str = "general";

pub fn topic_for_cluster(cluster_name: &str) -> String {
    format!("cluster.{cluster_name}")
}

pub fn topic_for_resource(kind: &str) -> String {
    format!("resource.{}", kind.to_lowercase())
}

pub fn topic_for_role(role: &str) -> String {
    format!("role.{}", role.to_lowercase())
}

/// Routing hints attached to a task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRoute {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// Cluster beats resource kind beats role.
pub fn route_for_task(task: &TaskRoute) -> String {
    if let Some(cluster) = &task.cluster {
        return topic_for_cluster(cluster);
    }
    if let Some(kind) = &task.resource_kind {
        return topic_for_resource(kind);
    }
    topic_for_role(task.role.as_deref().unwrap_or(DEFAULT_ROLE))
}
