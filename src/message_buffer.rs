use std::collections::VecDeque;
use std::time::Duration;

use hashbrown::HashMap;
use tokio::sync::RwLock;
use web_time::Instant;

use crate::message::{Message, MessageId, PartitionKey};
use crate::native::{MessageType, NativeMessage, ResultHandle};

/// A read-only view of a buffered message, cheap to hand back from a locked lookup without
/// keeping the lock held (§4.2, precondition checks in §4.7–§4.10).
#[derive(Clone, Debug)]
pub struct MessageSnapshot {
    pub id: MessageId,
    pub native_handle: ResultHandle,
    pub message_type: MessageType,
    pub topic: String,
    pub database: String,
    pub vgroup_id: i32,
    pub offset: i64,
}

struct Inner {
    messages: VecDeque<Message>,
    index: HashMap<PartitionKey, MessageId>,
    next_message_id: u64,
    next_expiry: Option<Instant>,
}

impl Inner {
    fn new() -> Self {
        Inner {
            messages: VecDeque::new(),
            index: HashMap::new(),
            next_message_id: 0,
            next_expiry: None,
        }
    }

    /// Lookup by id is a linear scan from the head (§4.2): acceptable because clients
    /// typically operate on the most recently polled message and commit/auto-release keep
    /// the list short.
    fn position_of(&self, id: MessageId) -> Option<usize> {
        self.messages.iter().position(|message| message.id == id)
    }

    fn remove_at(&mut self, position: usize) -> Message {
        let message = self
            .messages
            .remove(position)
            .expect("position came from this same deque");
        self.index.remove(&message.partition_key());
        message
    }
}

/// Append-ordered buffer of polled messages plus a secondary `(topic, vgroup, offset) →
/// message_id` index (§3, §4.2). Both structures live behind one lock because every
/// mutation touches them together; see `src/pubsub/subscribers.rs` in the teacher for the
/// two-way-index idiom this is grounded on.
pub struct MessageBuffer {
    inner: RwLock<Inner>,
}

impl Default for MessageBuffer {
    fn default() -> Self {
        MessageBuffer {
            inner: RwLock::new(Inner::new()),
        }
    }
}

impl MessageBuffer {
    /// Append a newly polled message, assigning it the next id (§4.2).
    pub async fn append(
        &self,
        native: NativeMessage,
        auto_commit: bool,
        release_interval: Duration,
    ) -> MessageId {
        let mut inner = self.inner.write().await;
        inner.next_message_id += 1;
        let id = MessageId(inner.next_message_id);

        let timeout = auto_commit.then(|| Instant::now() + release_interval);
        let message = Message {
            id,
            native_handle: native.handle,
            message_type: native.message_type,
            topic: native.topic,
            database: native.database,
            vgroup_id: native.vgroup_id,
            offset: native.offset,
            buffer: tokio::sync::Mutex::new(Vec::new()),
            timeout,
        };

        inner.index.insert(message.partition_key(), id);
        inner.messages.push_back(message);
        id
    }

    /// A cheap snapshot of a message's descriptor fields, without its buffer.
    pub async fn snapshot(&self, id: MessageId) -> Option<MessageSnapshot> {
        let inner = self.inner.read().await;
        let position = inner.position_of(id)?;
        let message = &inner.messages[position];
        Some(MessageSnapshot {
            id: message.id,
            native_handle: message.native_handle,
            message_type: message.message_type,
            topic: message.topic.clone(),
            database: message.database.clone(),
            vgroup_id: message.vgroup_id,
            offset: message.offset,
        })
    }

    /// Replace a message's reusable buffer wholesale (populated by `fetch`, §4.7).
    pub async fn write_buffer(&self, id: MessageId, bytes: Vec<u8>) -> bool {
        let inner = self.inner.read().await;
        let Some(position) = inner.position_of(id) else {
            return false;
        };
        *inner.messages[position].buffer.lock().await = bytes;
        true
    }

    /// Stamp the leading 8 bytes with `timing_ns` and return a copy of the buffer to ship
    /// (`fetch_block`, §4.8). `None` if the message is gone or its buffer is still empty.
    pub async fn stamp_and_read_buffer(&self, id: MessageId, timing_ns: u64) -> Option<Vec<u8>> {
        let inner = self.inner.read().await;
        let position = inner.position_of(id)?;
        let mut buffer = inner.messages[position].buffer.lock().await;
        if buffer.is_empty() {
            return None;
        }
        buffer[0..8].copy_from_slice(&timing_ns.to_le_bytes());
        Some(buffer.clone())
    }

    /// Remove every message from the head up to and including `id` (§4.2, commit). Returns
    /// the native handles that must be freed, in removal order.
    pub async fn commit_prefix(&self, id: MessageId) -> Vec<ResultHandle> {
        let mut inner = self.inner.write().await;
        let Some(position) = inner.position_of(id) else {
            return Vec::new();
        };
        (0..=position)
            .map(|_| inner.remove_at(0).native_handle)
            .collect()
    }

    /// Remove only the message indexed at `(topic, vgroup_id, offset)`, if any (§4.2,
    /// commit_offset).
    pub async fn remove_by_partition(
        &self,
        topic: &str,
        vgroup_id: i32,
        offset: i64,
    ) -> Option<ResultHandle> {
        let mut inner = self.inner.write().await;
        let key = PartitionKey {
            topic: topic.to_owned(),
            vgroup_id,
            offset,
        };
        let id = *inner.index.get(&key)?;
        let position = inner.position_of(id)?;
        Some(inner.remove_at(position).native_handle)
    }

    /// Sweep expired messages (§4.3). Only does work if `now` is past the recorded next
    /// expiry and the buffer is non-empty; reschedules `next_expiry` to the first message
    /// still alive, or clears it if the buffer emptied out.
    pub async fn sweep_expired(&self, now: Instant) -> Vec<ResultHandle> {
        let mut inner = self.inner.write().await;

        // A never-yet-swept buffer (`next_expiry == None`) is eligible immediately, mirroring
        // the reference implementation's zero-value `nextTime`, which `time.Now().After(...)`
        // trivially satisfies on the first tick after messages appear.
        let should_sweep = !inner.messages.is_empty()
            && inner.next_expiry.is_none_or(|expiry| now >= expiry);
        if !should_sweep {
            return Vec::new();
        }

        let mut freed = Vec::new();
        while let Some(message) = inner.messages.front() {
            match message.timeout {
                Some(timeout) if timeout < now => {
                    freed.push(inner.remove_at(0).native_handle);
                }
                Some(timeout) => {
                    inner.next_expiry = Some(timeout);
                    return freed;
                }
                None => break,
            }
        }
        inner.next_expiry = None;
        freed
    }

    /// Drain every message (unsubscribe/close, §4.2). Resets `next_message_id` to 0.
    pub async fn clear(&self) -> Vec<ResultHandle> {
        let mut inner = self.inner.write().await;
        let freed = inner.messages.drain(..).map(|message| message.native_handle).collect();
        inner.index.clear();
        inner.next_message_id = 0;
        inner.next_expiry = None;
        freed
    }

    /// Number of buffered messages. Exposed for tests and diagnostics.
    pub async fn len(&self) -> usize {
        self.inner.read().await.messages.len()
    }
}

#[cfg(test)]
fn native(topic: &str, vgroup_id: i32, offset: i64, handle: u64) -> NativeMessage {
    NativeMessage {
        handle: ResultHandle(handle),
        message_type: MessageType::Data,
        topic: topic.to_owned(),
        database: "db".to_owned(),
        vgroup_id,
        offset,
    }
}
