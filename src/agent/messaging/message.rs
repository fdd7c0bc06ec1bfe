//! Message envelope shared by the broker and the consensus layer.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{A2aError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Request,
    Response,
    Event,
    Heartbeat,
    Register,
    Proposal,
    Vote,
    Task,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Request => "request",
            Self::Response => "response",
            Self::Event => "event",
            Self::Heartbeat => "heartbeat",
            Self::Register => "register",
            Self::Proposal => "proposal",
            Self::Vote => "vote",
            Self::Task => "task",
        }
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind-specific message body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessagePayload {
    Request {
        operation: String,
        #[serde(default)]
        arguments: Map<String, Value>,
    },
    Response {
        in_reply_to: String,
        #[serde(default)]
        body: Value,
    },
    Event {
        name: String,
        #[serde(default)]
        data: Value,
    },
    Heartbeat {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        status: Option<String>,
    },
    Register {
        #[serde(default)]
        capabilities: Map<String, Value>,
    },
    Proposal {
        proposal_id: String,
        proposal: Value,
    },
    Vote {
        proposal_id: String,
        accept: bool,
    },
    Task {
        task: Map<String, Value>,
    },
}

impl MessagePayload {
    pub fn message_type(&self) -> MessageType {
        match self {
            Self::Request { .. } => MessageType::Request,
            Self::Response { .. } => MessageType::Response,
            Self::Event { .. } => MessageType::Event,
            Self::Heartbeat { .. } => MessageType::Heartbeat,
            Self::Register { .. } => MessageType::Register,
            Self::Proposal { .. } => MessageType::Proposal,
            Self::Vote { .. } => MessageType::Vote,
            Self::Task { .. } => MessageType::Task,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let (field, value) = match self {
            Self::Request { operation, .. } => ("operation", operation),
            Self::Response { in_reply_to, .. } => ("in_reply_to", in_reply_to),
            Self::Event { name, .. } => ("name", name),
            Self::Proposal { proposal_id, .. } | Self::Vote { proposal_id, .. } => {
                ("proposal_id", proposal_id)
            }
            Self::Heartbeat { .. } | Self::Register { .. } | Self::Task { .. } => return Ok(()),
        };
        if value.trim().is_empty() {
            return Err(A2aError::InvalidMessage(format!(
                "{} payload requires a non-empty {field}",
                self.message_type()
            )));
        }
        Ok(())
    }

    /// Proposal id carried by PROPOSAL and VOTE payloads.
    pub fn proposal_id(&self) -> Option<&str> {
        match self {
            Self::Proposal { proposal_id, .. } | Self::Vote { proposal_id, .. } => {
                Some(proposal_id.as_str())
            }
            _ => None,
        }
    }
}

fn new_message_id() -> String {
    Uuid::new_v4().to_string()
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Protocol envelope routed by topic (`publish`) or by target agent (`send`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default = "new_message_id")]
    pub id: String,
    pub sender_id: String,
    pub payload: MessagePayload,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_id: Option<String>,
    #[serde(default = "now_ms")]
    pub timestamp_ms: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
}

impl Message {
    pub fn new(sender_id: impl Into<String>, payload: MessagePayload) -> Result<Self> {
        let message = Self {
            id: new_message_id(),
            sender_id: sender_id.into(),
            payload,
            topic: None,
            target_id: None,
            timestamp_ms: now_ms(),
            trace_id: None,
            auth_token: None,
        };
        message.validate()?;
        Ok(message)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sender_id.trim().is_empty() {
            return Err(A2aError::InvalidMessage("sender_id must not be empty".into()));
        }
        self.payload.validate()
    }

    pub fn message_type(&self) -> MessageType {
        self.payload.message_type()
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    pub fn with_target(mut self, target_id: impl Into<String>) -> Self {
        self.target_id = Some(target_id.into());
        self
    }

    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn event(
        sender_id: impl Into<String>,
        topic: impl Into<String>,
        name: impl Into<String>,
        data: Value,
    ) -> Result<Self> {
        Ok(Self::new(
            sender_id,
            MessagePayload::Event {
                name: name.into(),
                data,
            },
        )?
        .with_topic(topic))
    }

    pub fn request(
        sender_id: impl Into<String>,
        target_id: impl Into<String>,
        operation: impl Into<String>,
        arguments: Map<String, Value>,
    ) -> Result<Self> {
        Ok(Self::new(
            sender_id,
            MessagePayload::Request {
                operation: operation.into(),
                arguments,
            },
        )?
        .with_target(target_id))
    }

    pub fn vote(
        sender_id: impl Into<String>,
        target_id: impl Into<String>,
        proposal_id: impl Into<String>,
        accept: bool,
    ) -> Result<Self> {
        Ok(Self::new(
            sender_id,
            MessagePayload::Vote {
                proposal_id: proposal_id.into(),
                accept,
            },
        )?
        .with_target(target_id))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse and validate a JSON envelope. Missing `id` and `timestamp_ms` are filled in.
    pub fn from_json(text: &str) -> Result<Self> {
        let message: Self = serde_json::from_str(text)?;
        message.validate()?;
        Ok(message)
    }
}
