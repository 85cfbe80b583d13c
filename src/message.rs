use web_time::Instant;

use crate::native::{MessageType, ResultHandle};

/// A message id, unique within one subscription of one session (§3). Reset to 0 on
/// unsubscribe — implementers must not rely on global uniqueness across subscriptions
/// within one session (§9).
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct MessageId(pub u64);

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The key the secondary index is built on (§3, §4.2).
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct PartitionKey {
    pub topic: String,
    pub vgroup_id: i32,
    pub offset: i64,
}

/// A buffered polled message (§3). Lives in a [`crate::message_buffer::MessageBuffer`] from
/// the moment `poll` appends it until it's removed by commit, commit_offset, auto-release,
/// unsubscribe, or session close.
pub struct Message {
    pub id: MessageId,
    pub native_handle: ResultHandle,
    pub message_type: MessageType,
    pub topic: String,
    pub database: String,
    pub vgroup_id: i32,
    pub offset: i64,

    /// Reusable buffer for the last-fetched block (§4.7) or raw payload (§4.10). Guarded by
    /// its own lock so that `fetch`'s header-write and `fetch_block`'s timing-stamp-and-ship
    /// see a consistent snapshot even though they're two separate dispatched actions.
    pub buffer: tokio::sync::Mutex<Vec<u8>>,

    /// Release deadline; only meaningful when the session has auto-commit enabled (§4.3).
    pub timeout: Option<Instant>,
}

impl Message {
    pub fn partition_key(&self) -> PartitionKey {
        PartitionKey {
            topic: self.topic.clone(),
            vgroup_id: self.vgroup_id,
            offset: self.offset,
        }
    }
}
