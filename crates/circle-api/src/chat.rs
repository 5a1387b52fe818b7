//! # Circle Chat Relay
//!
//! Per-circle message history behind the [`MessageStore`] trait, plus a
//! broadcast hub that fans new messages out to connected WebSocket
//! sessions. The store is injected into [`crate::state::AppState`]; the
//! in-memory implementation serves tests and single-instance deployments.
//!
//! Circles are keyed by [`Address`], so `0xABC…` and `0xabc…` share one
//! history.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use circle_core::Address;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use utoipa::ToSchema;

/// Capacity of the relay channel. Slow sessions past this lag and skip.
const RELAY_CAPACITY: usize = 256;

/// One chat message as stored and relayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ChatMessage {
    /// Author account.
    #[schema(value_type = String, example = "0x5b38da6a701c568545dcfcb03fcb875f56beddc4")]
    pub address: Address,
    /// Message text.
    pub text: String,
    /// Server receive time, milliseconds since the Unix epoch.
    pub timestamp: i64,
}

/// Chat failures.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// Message text is empty or whitespace.
    #[error("message text must not be empty")]
    EmptyText,
    /// The backing store failed.
    #[error("message store error: {0}")]
    Store(String),
}

/// Storage for per-circle chat history.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Append `message` to the history of `circle`.
    async fn append(&self, circle: &Address, message: ChatMessage) -> Result<(), ChatError>;

    /// Messages for `circle`, oldest first.
    async fn history(&self, circle: &Address) -> Result<Vec<ChatMessage>, ChatError>;
}

#[derive(Debug, Default)]
struct CircleHistory {
    messages: VecDeque<ChatMessage>,
    last_write: u64,
}

#[derive(Debug, Default)]
struct Histories {
    circles: HashMap<Address, CircleHistory>,
    writes: u64,
}

/// Process-local message store with optional caps on messages per circle
/// and on the number of circles kept.
///
/// When a message for a new circle would exceed the circle cap, the circle
/// written least recently is dropped with its history.
#[derive(Debug, Default)]
pub struct InMemoryMessageStore {
    histories: RwLock<Histories>,
    limit: Option<usize>,
    max_circles: Option<usize>,
}

impl InMemoryMessageStore {
    /// Store that keeps at most `limit` messages per circle, dropping the
    /// oldest first. `None` keeps everything.
    pub fn new(limit: Option<usize>) -> Self {
        Self {
            histories: RwLock::new(Histories::default()),
            limit,
            max_circles: None,
        }
    }

    /// Keep at most `max` circles. `None` keeps every circle.
    pub fn with_max_circles(mut self, max: Option<usize>) -> Self {
        self.max_circles = max;
        self
    }

    /// Number of circles with stored history.
    pub fn circle_count(&self) -> usize {
        self.histories.read().circles.len()
    }
}

#[async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn append(&self, circle: &Address, message: ChatMessage) -> Result<(), ChatError> {
        let mut guard = self.histories.write();
        let Histories { circles, writes } = &mut *guard;

        if let Some(max) = self.max_circles {
            while !circles.contains_key(circle) && circles.len() >= max.max(1) {
                let Some(stale) = circles
                    .iter()
                    .min_by_key(|(_, h)| h.last_write)
                    .map(|(address, _)| address.clone())
                else {
                    break;
                };
                circles.remove(&stale);
                tracing::debug!(circle = %stale, "chat history evicted");
            }
        }

        *writes += 1;
        let history = circles.entry(circle.clone()).or_default();
        history.last_write = *writes;
        history.messages.push_back(message);
        if let Some(limit) = self.limit {
            while history.messages.len() > limit {
                history.messages.pop_front();
            }
        }
        Ok(())
    }

    async fn history(&self, circle: &Address) -> Result<Vec<ChatMessage>, ChatError> {
        Ok(self
            .histories
            .read()
            .circles
            .get(circle)
            .map(|h| h.messages.iter().cloned().collect())
            .unwrap_or_default())
    }
}

/// A message on its way to the sessions joined to `circle`.
#[derive(Debug, Clone)]
pub struct RelayedMessage {
    /// Circle the message belongs to.
    pub circle: Address,
    /// Session that posted it, if any. That session echoes it itself.
    pub origin: Option<u64>,
    /// The stored message.
    pub message: ChatMessage,
}

/// Store plus broadcast hub.
#[derive(Clone)]
pub struct ChatRelay {
    store: Arc<dyn MessageStore>,
    hub: broadcast::Sender<RelayedMessage>,
    next_session: Arc<AtomicU64>,
}

impl std::fmt::Debug for ChatRelay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatRelay")
            .field("subscribers", &self.hub.receiver_count())
            .finish_non_exhaustive()
    }
}

impl ChatRelay {
    /// Relay over `store`.
    pub fn new(store: Arc<dyn MessageStore>) -> Self {
        let (hub, _) = broadcast::channel(RELAY_CAPACITY);
        Self {
            store,
            hub,
            next_session: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Allocate an id for a new WebSocket session.
    pub fn open_session(&self) -> u64 {
        self.next_session.fetch_add(1, Ordering::Relaxed)
    }

    /// Receive every message posted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<RelayedMessage> {
        self.hub.subscribe()
    }

    /// History of `circle`, oldest first.
    pub async fn history(&self, circle: &Address) -> Result<Vec<ChatMessage>, ChatError> {
        self.store.history(circle).await
    }

    /// Timestamp, store and broadcast a message. `origin` is the posting
    /// session, if the message came over a WebSocket.
    pub async fn post(
        &self,
        circle: &Address,
        author: Address,
        text: String,
        origin: Option<u64>,
    ) -> Result<ChatMessage, ChatError> {
        if text.trim().is_empty() {
            return Err(ChatError::EmptyText);
        }
        let message = ChatMessage {
            address: author,
            text,
            timestamp: chrono::Utc::now().timestamp_millis(),
        };
        self.store.append(circle, message.clone()).await?;

        // No receivers is not an error: nobody is connected.
        let _ = self.hub.send(RelayedMessage {
            circle: circle.clone(),
            origin,
            message: message.clone(),
        });
        tracing::debug!(%circle, author = %message.address, "chat message relayed");
        Ok(message)
    }
}
