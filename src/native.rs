//! The opaque consumer API described in §6.2. This is the boundary the spec marks as an
//! external collaborator (the time-series database's native TMQ client library): production
//! code implements [`NativeConsumer`] against whatever driver a deployment links, and this
//! crate only ever calls it through a [`crate::worker::Worker`], never directly from a
//! request handler.
//!
//! A real implementation wraps a callback-based, single-threaded C library; the signatures
//! below model that as plain `async fn`-shaped futures instead of exposing callback
//! plumbing, matching the "blocking façade" described in SPEC_FULL §9.

#[cfg(test)]
pub(crate) mod fake;

use std::future::Future;
use std::pin::Pin;

use crate::error::NativeError;

/// A future returned by a [`NativeConsumer`] operation.
pub type NativeFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, NativeError>> + Send + 'a>>;

/// An opaque handle to a native result, as returned by [`NativeConsumer::poll`]. Stored on
/// [`crate::message::Message`] and passed back into `commit`/`fetch_block`/`get_raw`/
/// `get_json_meta`/`free_result`. Implementations are free to give this whatever meaning
/// they like (an index into an internal table, a raw pointer cast to `u64`, ...); the
/// gateway treats it as opaque.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct ResultHandle(pub u64);

/// The kind of payload a polled message carries (§3, §4.6).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MessageType {
    /// Row data, fetchable via `fetch`/`fetch_block`.
    Data,

    /// A single table's schema metadata, fetchable via `fetch_json_meta`/`fetch_raw`.
    TableMeta,

    /// Database-wide metadata (multiple schema changes), fetchable the same way as
    /// `TableMeta` and also permits `fetch`/`fetch_block`.
    Metadata,
}

impl MessageType {
    /// Does this message type permit `fetch`/`fetch_block` (§4.7)?
    pub fn permits_data(self) -> bool {
        matches!(self, MessageType::Data | MessageType::Metadata)
    }

    /// Does this message type permit `fetch_json_meta` (§4.9)?
    pub fn permits_meta(self) -> bool {
        matches!(self, MessageType::TableMeta | MessageType::Metadata)
    }
}

/// A message handed back by [`NativeConsumer::poll`], before it's been wrapped into a
/// buffered [`crate::message::Message`].
#[derive(Clone, Debug)]
pub struct NativeMessage {
    pub handle: ResultHandle,
    pub message_type: MessageType,
    pub topic: String,
    pub database: String,
    pub vgroup_id: i32,
    pub offset: i64,
}

/// One column's schema, as read by `fetch` (§4.7).
#[derive(Clone, Debug)]
pub struct FieldDescriptor {
    pub name: String,
    pub type_code: i32,
    pub length: i64,
}

/// The row-data block returned by `fetch_block` (§4.7, §4.8).
#[derive(Clone, Debug)]
pub struct Block {
    pub table_name: String,
    pub fields: Vec<FieldDescriptor>,
    pub precision: i32,
    pub row_count: u64,
    /// Raw columnar bytes in the native library's block layout, copied verbatim into the
    /// message's reusable buffer after the 24-byte header (§6.3.a).
    pub raw: Vec<u8>,
}

/// The raw metadata payload returned by `get_raw` (§4.10).
#[derive(Clone, Debug)]
pub struct RawMeta {
    pub meta_type: u16,
    pub payload: Vec<u8>,
}

/// One partition's assignment (§4.14).
#[derive(Clone, Copy, Debug)]
pub struct Assignment {
    pub vgroup_id: i32,
    pub begin: i64,
    pub end: i64,
    pub offset: i64,
}

/// The subset of `subscribe`'s `args` (§6.1) that become native consumer configuration.
/// Fields mirror the reference implementation's config keys (`group.id`, `td.connect.db`,
/// ...) one-to-one; string-vs-typed conversion happens in [`crate::protocol`], not here.
#[derive(Clone, Debug, Default)]
pub struct ConsumerConfig {
    pub group_id: Option<String>,
    pub client_id: Option<String>,
    pub db: Option<String>,
    pub user: String,
    pub password: String,
    pub offset_reset: Option<String>,
    pub with_table_name: Option<bool>,
    pub auto_commit: Option<bool>,
    pub auto_commit_interval_ms: Option<u64>,
    pub snapshot_enable: Option<bool>,
}

/// Creates new native consumers. Kept separate from [`NativeConsumer`] because a consumer
/// doesn't exist yet when this is called (Uninitialized → Subscribed, §4.4); once created, a
/// consumer outlives any number of unsubscribe/subscribe cycles.
pub trait NativeConsumerFactory: Send + Sync {
    fn new_consumer(
        &self,
        config: ConsumerConfig,
    ) -> NativeFuture<'static, Box<dyn NativeConsumer>>;
}

/// An existing native consumer. One instance per [`crate::session::Session`], reached only
/// through that session's [`crate::worker::Worker`] (§4.1, §5): the trait itself makes no
/// concurrency promises, because the worker is what guarantees at most one in-flight call.
pub trait NativeConsumer: Send {
    fn subscribe(&mut self, topics: Vec<String>) -> NativeFuture<'_, ()>;
    fn unsubscribe(&mut self) -> NativeFuture<'_, ()>;
    fn close(&mut self) -> NativeFuture<'_, ()>;

    fn poll(&mut self, blocking_ms: u64) -> NativeFuture<'_, Option<NativeMessage>>;

    fn commit(&mut self, handle: ResultHandle) -> NativeFuture<'_, ()>;
    fn commit_offset(&mut self, topic: String, vgroup_id: i32, offset: i64) -> NativeFuture<'_, ()>;
    fn committed(&mut self, topic: String, vgroup_id: i32) -> NativeFuture<'_, i64>;
    fn position(&mut self, topic: String, vgroup_id: i32) -> NativeFuture<'_, i64>;
    fn seek(&mut self, topic: String, vgroup_id: i32, offset: i64) -> NativeFuture<'_, ()>;
    fn assignment(&mut self, topic: String) -> NativeFuture<'_, Vec<Assignment>>;
    fn list_topics(&mut self) -> NativeFuture<'_, Vec<String>>;

    fn fetch_block(&mut self, handle: ResultHandle) -> NativeFuture<'_, Block>;
    /// Reads and frees the raw-meta buffer in one call: the native library's `get_raw` and
    /// `free_raw` are always used as an immediate copy-then-free pair (§4.10), so the trait
    /// collapses them rather than exposing a second `free_raw` nobody would call separately.
    fn get_raw(&mut self, handle: ResultHandle) -> NativeFuture<'_, RawMeta>;
    /// Reads and frees the JSON-meta C-string in one call, for the same reason as
    /// [`NativeConsumer::get_raw`].
    fn get_json_meta(&mut self, handle: ResultHandle) -> NativeFuture<'_, Option<String>>;

    /// Frees a previously polled result. Called once a [`crate::message::Message`] leaves
    /// the buffer (commit, commit_offset, auto-release, unsubscribe, close).
    fn free_result(&mut self, handle: ResultHandle) -> NativeFuture<'_, ()>;
}
