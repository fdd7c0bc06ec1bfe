//! Inter-agent messaging.
//!
//! ```text
//! ┌─────────────┐ publish(topic) ┌─────────────────┐  Subscription  ┌─────────────┐
//! │   Agent A   │───────────────▶│ AgentMessageBus │───────────────▶│ Agents B, C │
//! └─────────────┘                │                 │                └─────────────┘
//!        │         send(target)  │  topics: fan-out│  DirectInbox   ┌─────────────┐
//!        └──────────────────────▶│  inboxes: 1:1   │───────────────▶│   Agent D   │
//!                                └─────────────────┘                └─────────────┘
//! ```

mod bus;
mod message;

pub use bus::{AgentMessageBus, DEFAULT_QUEUE_CAPACITY, DirectInbox, Subscription};
pub use message::{Message, MessagePayload, MessageType};
