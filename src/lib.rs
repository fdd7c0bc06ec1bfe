pub mod agent;
pub mod cli;
pub mod config;
pub mod error;
pub mod executor;
pub mod functions;

pub use agent::{
    A2aContext, AgentMessageBus, AuthManager, CredentialVerifier, DirectInbox, MajorityConsensus,
    Message, MessagePayload, MessageType, ProposalResult, SharedContext, Subscription,
};
pub use config::A2aConfig;
pub use error::{A2aError, Result};
pub use executor::{PriorityTaskExecutor, TaskHandle, TaskPriority};
pub use functions::{AutomationFunction, CreatePlanFunction, FunctionParams, FunctionRegistry};
