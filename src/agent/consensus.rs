//! Majority-vote proposals over the agent message bus.
//!
//! A round publishes one PROPOSAL to a topic, counts the proposer as a yes
//! vote, then collects VOTE replies from its own direct inbox until every
//! expected voter has answered or the deadline passes.

use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, info};
use uuid::Uuid;

use super::messaging::{AgentMessageBus, DirectInbox, Message, MessagePayload};
use crate::error::{A2aError, Result};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(1000);

/// Outcome of one consensus round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalResult {
    pub proposal_id: String,
    pub accepted: bool,
    pub votes_for: usize,
    pub votes_against: usize,
    /// Expected voters including the proposer.
    pub total: usize,
    pub decided_ms: i64,
}

impl ProposalResult {
    pub fn votes_received(&self) -> usize {
        self.votes_for + self.votes_against
    }

    pub fn reached_quorum(&self) -> bool {
        self.votes_received() >= self.total
    }
}

#[derive(Debug, Default)]
struct Tally {
    votes_for: usize,
    votes_against: usize,
}

impl Tally {
    fn count(&self) -> usize {
        self.votes_for + self.votes_against
    }

    fn record(&mut self, accept: bool) {
        if accept {
            self.votes_for += 1;
        } else {
            self.votes_against += 1;
        }
    }
}

pub struct MajorityConsensus {
    bus: AgentMessageBus,
    agent_id: String,
    default_timeout: Duration,
}

impl MajorityConsensus {
    pub fn new(bus: AgentMessageBus, agent_id: impl Into<String>) -> Result<Self> {
        let agent_id = agent_id.into();
        if agent_id.trim().is_empty() {
            return Err(A2aError::InvalidParameters(
                "consensus agent id must not be empty".into(),
            ));
        }
        Ok(Self {
            bus,
            agent_id,
            default_timeout: DEFAULT_TIMEOUT,
        })
    }

    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    pub async fn propose_with_default_timeout(
        &self,
        topic: &str,
        proposal: Value,
        voter_count: usize,
    ) -> Result<ProposalResult> {
        self.propose(topic, proposal, voter_count, self.default_timeout)
            .await
    }

    /// Run one round and return its verdict.
    ///
    /// The proposal id is taken from a string `"id"` field of `proposal` when
    /// present, otherwise generated. Accepted means strictly more yes than no
    /// votes among those received; quorum is not required.
    pub async fn propose(
        &self,
        topic: &str,
        proposal: Value,
        voter_count: usize,
        timeout: Duration,
    ) -> Result<ProposalResult> {
        let proposal_id = proposal
            .get("id")
            .and_then(Value::as_str)
            .filter(|id| !id.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let inbox = self.bus.register_direct_inbox(&self.agent_id);
        let deadline = Instant::now() + timeout;

        let message = Message::new(
            self.agent_id.as_str(),
            MessagePayload::Proposal {
                proposal_id: proposal_id.clone(),
                proposal,
            },
        )?
        .with_topic(topic);
        self.bus.publish(message);
        debug!(proposal_id = %proposal_id, topic, voter_count, "Proposal published");

        let mut tally = Tally {
            votes_for: 1,
            votes_against: 0,
        };
        collect_votes(&inbox, &proposal_id, voter_count, deadline, &mut tally).await;

        let result = ProposalResult {
            accepted: tally.votes_for > tally.votes_against,
            votes_for: tally.votes_for,
            votes_against: tally.votes_against,
            total: voter_count,
            decided_ms: Utc::now().timestamp_millis(),
            proposal_id,
        };
        info!(
            proposal_id = %result.proposal_id,
            accepted = result.accepted,
            votes_for = result.votes_for,
            votes_against = result.votes_against,
            total = result.total,
            "Consensus decided"
        );
        Ok(result)
    }

    /// Answer a PROPOSAL by sending a VOTE to its sender's inbox.
    ///
    /// Returns `false` for non-proposal messages or when delivery fails.
    pub fn vote(&self, proposal: &Message, accept: bool) -> bool {
        let MessagePayload::Proposal { proposal_id, .. } = &proposal.payload else {
            return false;
        };
        match Message::vote(
            self.agent_id.as_str(),
            proposal.sender_id.as_str(),
            proposal_id.as_str(),
            accept,
        ) {
            Ok(vote) => self.bus.send(vote),
            Err(e) => {
                debug!(error = %e, "Failed to build vote");
                false
            }
        }
    }
}

async fn collect_votes(
    inbox: &DirectInbox,
    proposal_id: &str,
    voter_count: usize,
    deadline: Instant,
    tally: &mut Tally,
) {
    while tally.count() < voter_count {
        let message = match timeout_at(deadline, inbox.recv()).await {
            Ok(Some(message)) => message,
            Ok(None) | Err(_) => break,
        };

        match &message.payload {
            MessagePayload::Vote {
                proposal_id: voted,
                accept,
            } if voted == proposal_id => {
                tally.record(*accept);
                debug!(proposal_id, voter = %message.sender_id, accept, "Vote counted");
            }
            _ => debug!(
                proposal_id,
                msg_id = %message.id,
                kind = %message.message_type(),
                "Ignoring unrelated inbox message"
            ),
        }
    }
}
