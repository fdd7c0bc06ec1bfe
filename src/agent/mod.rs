//! Agent-to-agent coordination.
//!
//! `messaging` carries envelopes between agents; `consensus` builds majority
//! votes on top of it. The remaining modules are helpers agents use to pick
//! topics, split work, authenticate and share cluster state.

pub mod consensus;
pub mod context;
pub mod distribution;
pub mod messaging;
pub mod routing;
pub mod security;

pub use consensus::{MajorityConsensus, ProposalResult};
pub use context::{A2aContext, ClusterSnapshot, ContextDelta, ContextSerializer, SharedContext};
pub use distribution::{AgentLoad, Assignment, by_capacity, round_robin};
pub use messaging::{
    AgentMessageBus, DirectInbox, Message, MessagePayload, MessageType, Subscription,
};
pub use routing::{TaskRoute, route_for_task, topic_for_cluster, topic_for_resource, topic_for_role};
pub use security::{AuthManager, CredentialVerifier};
