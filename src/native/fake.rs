//! A deterministic in-memory [`NativeConsumer`] used by this crate's own tests. Plays the
//! role the reference implementation's actual TDengine driver plays in production: nothing
//! here is part of the protocol, it only has to satisfy the trait honestly enough that the
//! Session/Worker/MessageBuffer code above it can be exercised without linking a real
//! driver.

use std::collections::VecDeque;
use std::sync::Mutex;

use hashbrown::HashMap;
use triomphe::Arc;

use crate::error::NativeError;
use crate::native::{
    Assignment, Block, ConsumerConfig, FieldDescriptor, MessageType, NativeConsumer,
    NativeConsumerFactory, NativeFuture, NativeMessage, RawMeta, ResultHandle,
};

/// One message a [`FakeConsumer`] will hand back from `poll`, plus the payload its
/// fetch-family calls should return.
#[derive(Clone, Debug)]
pub(crate) struct ScriptedMessage {
    pub(crate) message_type: MessageType,
    pub(crate) topic: String,
    pub(crate) database: String,
    pub(crate) vgroup_id: i32,
    pub(crate) offset: i64,
    pub(crate) block: Block,
    pub(crate) raw: RawMeta,
    pub(crate) json_meta: Option<String>,
}

/// A pre-seeded sequence of messages a [`FakeConsumer`] will emit, one per `poll`, in order.
#[derive(Clone, Default)]
pub(crate) struct Script {
    inner: Arc<Mutex<VecDeque<ScriptedMessage>>>,
}

impl Script {
    pub(crate) fn new(messages: impl IntoIterator<Item = ScriptedMessage>) -> Self {
        Script {
            inner: Arc::new(Mutex::new(messages.into_iter().collect())),
        }
    }

    fn pop(&self) -> Option<ScriptedMessage> {
        self.inner.lock().unwrap_or_else(|poison| poison.into_inner()).pop_front()
    }
}

/// Builds [`FakeConsumer`]s that all emit the same [`Script`]. A fresh `ResultHandle`
/// sequence and set of committed offsets is started per consumer, mirroring how each
/// `subscribe` gets a fresh native consumer in the real protocol.
pub(crate) struct FakeConsumerFactory {
    pub(crate) script: Script,
}

impl NativeConsumerFactory for FakeConsumerFactory {
    fn new_consumer(
        &self,
        _config: ConsumerConfig,
    ) -> NativeFuture<'static, Box<dyn NativeConsumer>> {
        let consumer = FakeConsumer {
            script: self.script.clone(),
            topics: Vec::new(),
            next_handle: 0,
            live: HashMap::new(),
            committed: HashMap::new(),
            position: HashMap::new(),
        };
        Box::pin(async move { Ok(Box::new(consumer) as Box<dyn NativeConsumer>) })
    }
}

struct LiveResult {
    message_type: MessageType,
    block: Block,
    raw: RawMeta,
    json_meta: Option<String>,
    topic: String,
    vgroup_id: i32,
    offset: i64,
}

/// A deterministic, single-process stand-in for a real TMQ consumer.
pub(crate) struct FakeConsumer {
    script: Script,
    topics: Vec<String>,
    next_handle: u64,
    live: HashMap<ResultHandle, LiveResult>,
    committed: HashMap<(String, i32), i64>,
    position: HashMap<(String, i32), i64>,
}

impl NativeConsumer for FakeConsumer {
    fn subscribe(&mut self, topics: Vec<String>) -> NativeFuture<'_, ()> {
        self.topics = topics;
        Box::pin(async { Ok(()) })
    }

    fn unsubscribe(&mut self) -> NativeFuture<'_, ()> {
        self.topics.clear();
        Box::pin(async { Ok(()) })
    }

    fn close(&mut self) -> NativeFuture<'_, ()> {
        Box::pin(async { Ok(()) })
    }

    fn poll(&mut self, _blocking_ms: u64) -> NativeFuture<'_, Option<NativeMessage>> {
        let scripted = self.script.pop();
        let result = scripted.map(|scripted| {
            let handle = ResultHandle(self.next_handle);
            self.next_handle += 1;
            self.position
                .insert((scripted.topic.clone(), scripted.vgroup_id), scripted.offset + 1);
            let message = NativeMessage {
                handle,
                message_type: scripted.message_type,
                topic: scripted.topic.clone(),
                database: scripted.database,
                vgroup_id: scripted.vgroup_id,
                offset: scripted.offset,
            };
            self.live.insert(
                handle,
                LiveResult {
                    message_type: scripted.message_type,
                    block: scripted.block,
                    raw: scripted.raw,
                    json_meta: scripted.json_meta,
                    topic: scripted.topic,
                    vgroup_id: scripted.vgroup_id,
                    offset: scripted.offset,
                },
            );
            message
        });
        Box::pin(async move { Ok(result) })
    }

    fn commit(&mut self, handle: ResultHandle) -> NativeFuture<'_, ()> {
        if let Some(live) = self.live.get(&handle) {
            self.committed
                .insert((live.topic.clone(), live.vgroup_id), live.offset + 1);
        }
        Box::pin(async { Ok(()) })
    }

    fn commit_offset(&mut self, topic: String, vgroup_id: i32, offset: i64) -> NativeFuture<'_, ()> {
        self.committed.insert((topic, vgroup_id), offset);
        Box::pin(async { Ok(()) })
    }

    fn committed(&mut self, topic: String, vgroup_id: i32) -> NativeFuture<'_, i64> {
        let offset = *self.committed.get(&(topic, vgroup_id)).unwrap_or(&-1);
        Box::pin(async move { Ok(offset) })
    }

    fn position(&mut self, topic: String, vgroup_id: i32) -> NativeFuture<'_, i64> {
        let offset = *self.position.get(&(topic, vgroup_id)).unwrap_or(&0);
        Box::pin(async move { Ok(offset) })
    }

    fn seek(&mut self, topic: String, vgroup_id: i32, offset: i64) -> NativeFuture<'_, ()> {
        self.position.insert((topic, vgroup_id), offset);
        Box::pin(async { Ok(()) })
    }

    fn assignment(&mut self, topic: String) -> NativeFuture<'_, Vec<Assignment>> {
        let assignments = self
            .position
            .iter()
            .filter(|((t, _), _)| *t == topic)
            .map(|((_, vgroup_id), offset)| Assignment {
                vgroup_id: *vgroup_id,
                begin: 0,
                end: *offset + 1,
                offset: *offset,
            })
            .collect();
        Box::pin(async move { Ok(assignments) })
    }

    fn list_topics(&mut self) -> NativeFuture<'_, Vec<String>> {
        let topics = self.topics.clone();
        Box::pin(async move { Ok(topics) })
    }

    fn fetch_block(&mut self, handle: ResultHandle) -> NativeFuture<'_, Block> {
        let result = self
            .live
            .get(&handle)
            .map(|live| live.block.clone())
            .ok_or_else(|| NativeError {
                code: -1,
                message: "unknown result handle".to_owned(),
            });
        Box::pin(async move { result })
    }

    fn get_raw(&mut self, handle: ResultHandle) -> NativeFuture<'_, RawMeta> {
        let result = self
            .live
            .get(&handle)
            .map(|live| live.raw.clone())
            .ok_or_else(|| NativeError {
                code: -1,
                message: "unknown result handle".to_owned(),
            });
        Box::pin(async move { result })
    }

    fn get_json_meta(&mut self, handle: ResultHandle) -> NativeFuture<'_, Option<String>> {
        let result = self
            .live
            .get(&handle)
            .map(|live| live.json_meta.clone())
            .ok_or_else(|| NativeError {
                code: -1,
                message: "unknown result handle".to_owned(),
            });
        Box::pin(async move { result })
    }

    fn free_result(&mut self, handle: ResultHandle) -> NativeFuture<'_, ()> {
        self.live.remove(&handle);
        Box::pin(async { Ok(()) })
    }
}

/// Builds a trivial, empty `DATA` block. Handy in tests that only care about row count /
/// completion behavior, not field contents.
pub(crate) fn empty_data_block() -> Block {
    Block {
        table_name: String::new(),
        fields: Vec::new(),
        precision: 0,
        row_count: 0,
        raw: Vec::new(),
    }
}

/// Builds a one-row, one-column `int` block: `[ts i64][c1 i32]`.
pub(crate) fn one_row_int_block(table_name: &str, ts: i64, value: i32) -> Block {
    let mut raw = Vec::with_capacity(12);
    raw.extend_from_slice(&ts.to_le_bytes());
    raw.extend_from_slice(&value.to_le_bytes());
    Block {
        table_name: table_name.to_owned(),
        fields: vec![
            FieldDescriptor {
                name: "ts".to_owned(),
                type_code: 9,
                length: 8,
            },
            FieldDescriptor {
                name: "c1".to_owned(),
                type_code: 4,
                length: 4,
            },
        ],
        precision: 0,
        row_count: 1,
        raw,
    }
}
