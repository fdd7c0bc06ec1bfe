//! In-process agent message bus: topic fan-out plus per-agent direct inboxes.

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll};

use futures::Stream;
use parking_lot::Mutex;
use tokio::sync::mpsc::{self, error::TryRecvError, error::TrySendError};
use tracing::debug;

use super::message::Message;
use crate::config::BrokerConfig;

pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

struct TopicSubscriber {
    id: u64,
    sender: mpsc::Sender<Message>,
}

struct BusInner {
    topics: Mutex<HashMap<String, Vec<TopicSubscriber>>>,
    inboxes: Mutex<HashMap<String, DirectInbox>>,
    next_subscriber_id: AtomicU64,
    topic_capacity: usize,
    inbox_capacity: usize,
}

impl BusInner {
    fn unsubscribe(&self, topic: &str, id: u64) {
        let mut topics = self.topics.lock();
        if let Some(subscribers) = topics.get_mut(topic) {
            subscribers.retain(|s| s.id != id);
            if subscribers.is_empty() {
                topics.remove(topic);
            }
        }
    }
}

/// Publish/subscribe and direct-delivery transport for agents in one process.
///
/// Topic delivery is best effort: a subscriber whose queue is full misses the
/// message. Direct delivery reports whether the message was enqueued.
#[derive(Clone)]
pub struct AgentMessageBus {
    inner: Arc<BusInner>,
}

impl Default for AgentMessageBus {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentMessageBus {
    pub fn new() -> Self {
        Self::with_capacities(DEFAULT_QUEUE_CAPACITY, DEFAULT_QUEUE_CAPACITY)
    }

    pub fn from_config(config: &BrokerConfig) -> Self {
        Self::with_capacities(config.topic_capacity, config.inbox_capacity)
    }

    /// Zero capacities are raised to one.
    pub fn with_capacities(topic_capacity: usize, inbox_capacity: usize) -> Self {
        Self {
            inner: Arc::new(BusInner {
                topics: Mutex::new(HashMap::new()),
                inboxes: Mutex::new(HashMap::new()),
                next_subscriber_id: AtomicU64::new(1),
                topic_capacity: topic_capacity.max(1),
                inbox_capacity: inbox_capacity.max(1),
            }),
        }
    }

    /// Register a new queue on `topic`.
    ///
    /// Every subscription receives its own copy of each message published while
    /// it is alive. Dropping the subscription removes it from the topic.
    pub fn subscribe(&self, topic: impl Into<String>) -> Subscription {
        let topic = topic.into();
        let id = self.inner.next_subscriber_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = mpsc::channel(self.inner.topic_capacity);

        self.inner
            .topics
            .lock()
            .entry(topic.clone())
            .or_default()
            .push(TopicSubscriber { id, sender });
        debug!(topic = %topic, subscriber = id, "Subscribed");

        Subscription {
            topic,
            id,
            receiver,
            bus: Arc::clone(&self.inner),
        }
    }

    /// Return the inbox for `agent_id`, creating it on first call.
    pub fn register_direct_inbox(&self, agent_id: &str) -> DirectInbox {
        let capacity = self.inner.inbox_capacity;
        self.inner
            .inboxes
            .lock()
            .entry(agent_id.to_string())
            .or_insert_with(|| {
                debug!(agent = agent_id, capacity, "Registered direct inbox");
                DirectInbox::new(capacity)
            })
            .clone()
    }

    /// Fan `message` out to every current subscriber of its topic.
    ///
    /// No-op without a topic. Full subscriber queues drop the message.
    pub fn publish(&self, message: Message) {
        let Some(topic) = message.topic.as_deref() else {
            return;
        };

        let topics = self.inner.topics.lock();
        let Some(subscribers) = topics.get(topic) else {
            return;
        };
        for subscriber in subscribers {
            match subscriber.sender.try_send(message.clone()) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    debug!(
                        topic,
                        subscriber = subscriber.id,
                        msg_id = %message.id,
                        "Subscriber queue full, message dropped"
                    );
                }
                Err(TrySendError::Closed(_)) => {}
            }
        }
    }

    /// Deliver `message` to the inbox named by its `target_id`.
    ///
    /// Returns `false` without enqueuing when the target is unset, unknown, or full.
    pub fn send(&self, message: Message) -> bool {
        let Some(target) = message.target_id.as_deref() else {
            return false;
        };

        let Some(inbox) = self.inner.inboxes.lock().get(target).cloned() else {
            debug!(target, msg_id = %message.id, "No inbox registered for target");
            return false;
        };

        let target = target.to_string();
        match inbox.sender.try_send(message) {
            Ok(()) => true,
            Err(TrySendError::Full(msg)) => {
                debug!(target = %target, msg_id = %msg.id, "Direct inbox full, send rejected");
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }

    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.inner.topics.lock().get(topic).map_or(0, Vec::len)
    }

    pub fn inbox_count(&self) -> usize {
        self.inner.inboxes.lock().len()
    }
}

/// A live topic subscription. Yields messages in publish order.
pub struct Subscription {
    topic: String,
    id: u64,
    receiver: mpsc::Receiver<Message>,
    bus: Arc<BusInner>,
}

impl Subscription {
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Wait for the next message.
    pub async fn recv(&mut self) -> Option<Message> {
        self.receiver.recv().await
    }

    pub fn try_recv(&mut self) -> Option<Message> {
        self.receiver.try_recv().ok()
    }
}

impl Stream for Subscription {
    type Item = Message;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Message>> {
        self.get_mut().receiver.poll_recv(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.bus.unsubscribe(&self.topic, self.id);
        debug!(topic = %self.topic, subscriber = self.id, "Unsubscribed");
    }
}

/// Handle to an agent's point-to-point mailbox.
///
/// All handles returned for the same agent id share one bounded queue.
#[derive(Clone)]
pub struct DirectInbox {
    sender: mpsc::Sender<Message>,
    receiver: Arc<tokio::sync::Mutex<mpsc::Receiver<Message>>>,
}

impl DirectInbox {
    fn new(capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel(capacity);
        Self {
            sender,
            receiver: Arc::new(tokio::sync::Mutex::new(receiver)),
        }
    }

    /// Wait for the next message. Concurrent readers take turns.
    pub async fn recv(&self) -> Option<Message> {
        self.receiver.lock().await.recv().await
    }

    /// Take a queued message without waiting. Returns `None` when empty or
    /// when another handle is currently reading.
    pub fn try_recv(&self) -> Option<Message> {
        let mut receiver = self.receiver.try_lock().ok()?;
        match receiver.try_recv() {
            Ok(message) => Some(message),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    pub fn len(&self) -> usize {
        self.sender.max_capacity() - self.sender.capacity()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.sender.max_capacity()
    }
}
