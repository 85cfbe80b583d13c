//! The Session (§2, §3): one per WebSocket connection, owning exactly one consumer lifecycle.
//! Its handler methods are called one at a time from the connection's read loop (§5: "handler
//! execution is serialized by the single read loop"), so `&mut self` is enough to serialize
//! state-machine and bookkeeping fields — only the Native Worker and Message Buffer need
//! their own interior locking, because the Auto-Release Timer also reaches them
//! independently. Grounded on `src/client.rs`'s `Client`, generalized from a Redis client's
//! command loop to this protocol's action set.

use triomphe::Arc;
use web_time::Instant;

use crate::auto_release;
use crate::error::ActionError;
use crate::fan_out;
use crate::message::MessageId;
use crate::native::{ConsumerConfig, MessageType, NativeConsumerFactory};
use crate::protocol::{
    AssignmentArgs, AssignmentEntry, AssignmentResp, CommitOffsetArgs, CommitOffsetResp,
    CommitResp, CommittedArgs, CommittedResp, ErrorResp, FetchJsonMetaResp, FetchResp,
    ListTopicsArgs, ListTopicsResp, MessageIdArgs, PollArgs, PollResp, PositionArgs,
    PositionResp, SeekArgs, SeekResp, SubscribeArgs, SubscribeResp, UnsubscribeArgs,
    UnsubscribeResp, VersionResp,
};
use crate::response::{self, OutboundFrame};
use crate::spawn::TaskHandle;
use crate::state::StateMachine;
use crate::time::elapsed_ns;
use crate::worker::{Worker, WorkerError};
use crate::{config::GatewayConfig, message_buffer::MessageBuffer};

/// Identifies one session for logging; carries no protocol meaning.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct SessionId(pub u64);

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub struct Session {
    id: SessionId,
    config: Arc<GatewayConfig>,
    state: StateMachine,
    worker: Arc<Worker>,
    buffer: Arc<MessageBuffer>,
    auto_commit: bool,
    auto_commit_interval_ms: u64,
    outbound: tokio::sync::mpsc::UnboundedSender<OutboundFrame>,
    release_timer: Option<TaskHandle<()>>,
}

impl Session {
    pub fn new(
        id: SessionId,
        config: Arc<GatewayConfig>,
        factory: Arc<dyn NativeConsumerFactory>,
        outbound: tokio::sync::mpsc::UnboundedSender<OutboundFrame>,
    ) -> Self {
        Session {
            id,
            config,
            state: StateMachine::default(),
            worker: Arc::new(Worker::new(factory)),
            buffer: Arc::new(MessageBuffer::default()),
            auto_commit: false,
            auto_commit_interval_ms: 0,
            outbound,
            release_timer: None,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    fn send(&self, frame: OutboundFrame) {
        // The framer task owns the socket; a closed receiver means the connection is already
        // tearing down, in which case there is nothing more a handler can do with the frame.
        _ = self.outbound.send(frame);
    }

    fn send_json(&self, value: &impl serde::Serialize) {
        match response::json(value) {
            Ok(frame) => self.send(frame),
            Err(error) => tracing::error!(session = %self.id, %error, "failed to encode response"),
        }
    }

    fn send_error(&self, error: &ActionError, action: &'static str, req_id: u64, message_id: Option<u64>, start: Instant) {
        self.send_json(&ErrorResp {
            code: error.wire_code(),
            message: error.wire_message(),
            action,
            req_id,
            timing: elapsed_ns(start),
            message_id,
        });
    }

    pub fn version(&self, start: Instant) {
        self.send_json(&VersionResp {
            code: 0,
            message: String::new(),
            version: env!("CARGO_PKG_VERSION"),
        });
        let _ = start;
    }

    pub async fn subscribe(&mut self, args: SubscribeArgs, start: Instant) {
        if let Err(error) = self.state.begin_subscribe() {
            self.send_error(&error, "subscribe", args.req_id, None, start);
            return;
        }

        let first_time = self.state.current() == crate::state::ConsumerState::Uninitialized;
        let auto_commit = args.auto_commit.unwrap_or(false);
        let auto_commit_interval_ms = args.auto_commit_interval_ms.unwrap_or(0);

        if first_time {
            let config = ConsumerConfig {
                group_id: args.group_id.clone(),
                client_id: args.client_id.clone(),
                db: args.db.clone(),
                user: args.user.clone(),
                password: args.password.clone(),
                offset_reset: args.offset_reset.clone(),
                with_table_name: args.with_table_name,
                auto_commit: args.auto_commit,
                auto_commit_interval_ms: args.auto_commit_interval_ms,
                snapshot_enable: args.snapshot_enable,
            };
            if let Err(native_error) = self.worker.new_consumer(config).await {
                self.send_error(&ActionError::Native(native_error), "subscribe", args.req_id, None, start);
                return;
            }
        }

        match self.worker.subscribe(args.topics).await {
            Ok(()) => {
                self.state.finish_subscribe();
                self.auto_commit = auto_commit;
                self.auto_commit_interval_ms = auto_commit_interval_ms;
                if first_time && auto_commit {
                    self.release_timer = Some(auto_release::start(self.buffer.clone(), self.worker.clone()));
                }
                self.send_json(&SubscribeResp {
                    code: 0,
                    message: String::new(),
                    action: "subscribe",
                    req_id: args.req_id,
                    timing: elapsed_ns(start),
                });
            }
            Err(error) => {
                if first_time {
                    self.worker.close_and_discard().await;
                }
                let action_error = match error {
                    WorkerError::Native(native_error) => ActionError::Native(native_error),
                    WorkerError::NotInitialized => ActionError::Precondition("tmq not init"),
                };
                self.send_error(&action_error, "subscribe", args.req_id, None, start);
            }
        }
    }

    pub async fn unsubscribe(&mut self, args: UnsubscribeArgs, start: Instant) {
        if let Err(error) = self.state.begin_unsubscribe() {
            self.send_error(&error, "unsubscribe", args.req_id, None, start);
            return;
        }
        match self.worker.unsubscribe().await {
            Ok(()) => {
                self.state.finish_unsubscribe();
                self.release_timer = None;
                for handle in self.buffer.clear().await {
                    if let Err(error) = self.worker.free_result(handle).await {
                        tracing::warn!(session = %self.id, ?error, "failed to free result during unsubscribe");
                    }
                }
                self.send_json(&UnsubscribeResp {
                    code: 0,
                    message: String::new(),
                    action: "unsubscribe",
                    req_id: args.req_id,
                    timing: elapsed_ns(start),
                });
            }
            Err(error) => self.send_error(&to_action_error(error), "unsubscribe", args.req_id, None, start),
        }
    }

    pub async fn poll(&mut self, args: PollArgs, start: Instant) {
        if let Err(error) = self.state.require_consumer() {
            self.send_error(&error, "poll", args.req_id, None, start);
            return;
        }
        let blocking_time = args.blocking_time.min(self.config.max_blocking_time_ms);
        match self.worker.poll(blocking_time).await {
            Ok(Some(native)) => {
                if !matches!(native.message_type, MessageType::Data | MessageType::TableMeta | MessageType::Metadata) {
                    self.send_error(
                        &ActionError::Precondition("unknown message type"),
                        "poll",
                        args.req_id,
                        None,
                        start,
                    );
                    return;
                }
                let message_type = native.message_type;
                let topic = native.topic.clone();
                let database = native.database.clone();
                let vgroup_id = native.vgroup_id;
                let offset = native.offset;
                let release_interval = self.config.release_interval(self.auto_commit_interval_ms);
                let id = self.buffer.append(native, self.auto_commit, release_interval).await;
                self.send_json(&PollResp {
                    code: 0,
                    message: String::new(),
                    action: "poll",
                    req_id: args.req_id,
                    timing: elapsed_ns(start),
                    have_message: true,
                    topic,
                    database,
                    vgroup_id,
                    message_type: message_type_code(message_type),
                    message_id: id.0,
                    offset,
                });
            }
            Ok(None) => {
                self.send_json(&PollResp {
                    code: 0,
                    message: String::new(),
                    action: "poll",
                    req_id: args.req_id,
                    timing: elapsed_ns(start),
                    have_message: false,
                    topic: String::new(),
                    database: String::new(),
                    vgroup_id: 0,
                    message_type: 0,
                    message_id: 0,
                    offset: 0,
                });
            }
            Err(error) => self.send_error(&to_action_error(error), "poll", args.req_id, None, start),
        }
    }

    pub async fn fetch(&mut self, args: MessageIdArgs, start: Instant) {
        if let Err(error) = self.state.require_consumer() {
            self.send_error(&error, "fetch", args.req_id, Some(args.message_id), start);
            return;
        }
        let Some(snapshot) = self.buffer.snapshot(MessageId(args.message_id)).await else {
            self.send_error(
                &ActionError::Precondition("message is nil"),
                "fetch",
                args.req_id,
                Some(args.message_id),
                start,
            );
            return;
        };
        if !snapshot.message_type.permits_data() {
            self.send_error(
                &ActionError::Precondition("message type is not data"),
                "fetch",
                args.req_id,
                Some(args.message_id),
                start,
            );
            return;
        }

        match self.worker.fetch_block(snapshot.native_handle).await {
            Ok(block) if block.row_count == 0 => {
                self.send_json(&FetchResp {
                    code: 0,
                    message: String::new(),
                    action: "fetch",
                    req_id: args.req_id,
                    timing: elapsed_ns(start),
                    message_id: args.message_id,
                    completed: true,
                    table_name: String::new(),
                    rows: 0,
                    fields_count: 0,
                    fields_names: Vec::new(),
                    fields_types: Vec::new(),
                    fields_lengths: Vec::new(),
                    precision: 0,
                });
            }
            Ok(block) => {
                let mut bytes = Vec::with_capacity(24 + block.raw.len());
                bytes.extend_from_slice(&0u64.to_le_bytes());
                bytes.extend_from_slice(&args.req_id.to_le_bytes());
                bytes.extend_from_slice(&args.message_id.to_le_bytes());
                bytes.extend_from_slice(&block.raw);
                self.buffer.write_buffer(MessageId(args.message_id), bytes).await;

                self.send_json(&FetchResp {
                    code: 0,
                    message: String::new(),
                    action: "fetch",
                    req_id: args.req_id,
                    timing: elapsed_ns(start),
                    message_id: args.message_id,
                    completed: false,
                    table_name: block.table_name,
                    rows: block.row_count,
                    fields_count: block.fields.len(),
                    fields_names: block.fields.iter().map(|field| field.name.clone()).collect(),
                    fields_types: block.fields.iter().map(|field| field.type_code).collect(),
                    fields_lengths: block.fields.iter().map(|field| field.length).collect(),
                    precision: block.precision,
                });
            }
            Err(error) => {
                self.send_error(&to_action_error(error), "fetch", args.req_id, Some(args.message_id), start);
            }
        }
    }

    pub async fn fetch_block(&mut self, args: MessageIdArgs, start: Instant) {
        if let Err(error) = self.state.require_consumer() {
            self.send_error(&error, "fetch_block", args.req_id, Some(args.message_id), start);
            return;
        }
        let Some(snapshot) = self.buffer.snapshot(MessageId(args.message_id)).await else {
            self.send_error(
                &ActionError::Precondition("message is nil"),
                "fetch_block",
                args.req_id,
                Some(args.message_id),
                start,
            );
            return;
        };
        if !snapshot.message_type.permits_data() {
            self.send_error(
                &ActionError::Precondition("message type is not data"),
                "fetch_block",
                args.req_id,
                Some(args.message_id),
                start,
            );
            return;
        }

        match self
            .buffer
            .stamp_and_read_buffer(MessageId(args.message_id), elapsed_ns(start))
            .await
        {
            Some(bytes) => self.send(OutboundFrame::Binary(bytes)),
            None => self.send_error(
                &ActionError::Precondition("no fetch data"),
                "fetch_block",
                args.req_id,
                Some(args.message_id),
                start,
            ),
        }
    }

    pub async fn fetch_raw(&mut self, args: MessageIdArgs, start: Instant) {
        if let Err(error) = self.state.require_consumer() {
            self.send_error(&error, "fetch_raw", args.req_id, Some(args.message_id), start);
            return;
        }
        let Some(snapshot) = self.buffer.snapshot(MessageId(args.message_id)).await else {
            self.send_error(
                &ActionError::Precondition("message is nil"),
                "fetch_raw",
                args.req_id,
                Some(args.message_id),
                start,
            );
            return;
        };
        match self.worker.get_raw(snapshot.native_handle).await {
            Ok(raw) => {
                let frame = response::raw_meta_frame(elapsed_ns(start), args.req_id, args.message_id, raw.meta_type, &raw.payload);
                self.send(OutboundFrame::Binary(frame));
            }
            Err(error) => {
                self.send_error(&to_action_error(error), "fetch_raw", args.req_id, Some(args.message_id), start);
            }
        }
    }

    pub async fn fetch_json_meta(&mut self, args: MessageIdArgs, start: Instant) {
        if let Err(error) = self.state.require_consumer() {
            self.send_error(&error, "fetch_json_meta", args.req_id, Some(args.message_id), start);
            return;
        }
        let Some(snapshot) = self.buffer.snapshot(MessageId(args.message_id)).await else {
            self.send_error(
                &ActionError::Precondition("message is nil"),
                "fetch_json_meta",
                args.req_id,
                Some(args.message_id),
                start,
            );
            return;
        };
        if !snapshot.message_type.permits_meta() {
            self.send_error(
                &ActionError::Precondition("message type is not meta"),
                "fetch_json_meta",
                args.req_id,
                Some(args.message_id),
                start,
            );
            return;
        }
        match self.worker.get_json_meta(snapshot.native_handle).await {
            Ok(json) => {
                let raw = json.unwrap_or_else(|| "null".to_owned());
                match serde_json::value::RawValue::from_string(raw) {
                    Ok(raw_value) => self.send_json(&FetchJsonMetaResp {
                        code: 0,
                        message: String::new(),
                        action: "fetch_json_meta",
                        req_id: args.req_id,
                        timing: elapsed_ns(start),
                        message_id: args.message_id,
                        data: &raw_value,
                    }),
                    Err(error) => tracing::error!(session = %self.id, %error, "native library returned invalid JSON meta"),
                }
            }
            Err(error) => {
                self.send_error(&to_action_error(error), "fetch_json_meta", args.req_id, Some(args.message_id), start);
            }
        }
    }

    pub async fn commit(&mut self, args: MessageIdArgs, start: Instant) {
        if let Err(error) = self.state.require_consumer() {
            self.send_error(&error, "commit", args.req_id, Some(args.message_id), start);
            return;
        }
        let id = MessageId(args.message_id);
        let Some(snapshot) = self.buffer.snapshot(id).await else {
            // Commit of an already-released id tolerated as a no-op success (§4.11, §8).
            self.send_json(&CommitResp {
                code: 0,
                message: String::new(),
                action: "commit",
                req_id: args.req_id,
                timing: elapsed_ns(start),
                message_id: args.message_id,
            });
            return;
        };
        match self.worker.commit(snapshot.native_handle).await {
            Ok(()) => {
                for handle in self.buffer.commit_prefix(id).await {
                    if let Err(error) = self.worker.free_result(handle).await {
                        tracing::warn!(session = %self.id, ?error, "failed to free committed result");
                    }
                }
                self.send_json(&CommitResp {
                    code: 0,
                    message: String::new(),
                    action: "commit",
                    req_id: args.req_id,
                    timing: elapsed_ns(start),
                    message_id: args.message_id,
                });
            }
            Err(error) => self.send_error(&to_action_error(error), "commit", args.req_id, Some(args.message_id), start),
        }
    }

    pub async fn commit_offset(&mut self, args: CommitOffsetArgs, start: Instant) {
        if let Err(error) = self.state.require_consumer() {
            self.send_error(&error, "commit_offset", args.req_id, None, start);
            return;
        }
        match self.worker.commit_offset(args.topic.clone(), args.vg_id, args.offset).await {
            Ok(()) => {
                if let Some(handle) = self.buffer.remove_by_partition(&args.topic, args.vg_id, args.offset).await {
                    if let Err(error) = self.worker.free_result(handle).await {
                        tracing::warn!(session = %self.id, ?error, "failed to free result during commit_offset");
                    }
                }
                self.send_json(&CommitOffsetResp {
                    code: 0,
                    message: String::new(),
                    action: "commit_offset",
                    req_id: args.req_id,
                    timing: elapsed_ns(start),
                    topic: args.topic,
                    vg_id: args.vg_id,
                    offset: args.offset,
                });
            }
            Err(error) => self.send_error(&to_action_error(error), "commit_offset", args.req_id, None, start),
        }
    }

    pub async fn committed(&mut self, args: CommittedArgs, start: Instant) {
        if let Err(error) = self.state.require_consumer() {
            self.send_error(&error, "committed", args.req_id, None, start);
            return;
        }
        match fan_out::committed(self.worker.clone(), args.topic_vgroup_ids).await {
            Ok(committed) => self.send_json(&CommittedResp {
                code: 0,
                message: String::new(),
                action: "committed",
                req_id: args.req_id,
                timing: elapsed_ns(start),
                committed,
            }),
            Err(error) => self.send_error(&error, "committed", args.req_id, None, start),
        }
    }

    pub async fn position(&mut self, args: PositionArgs, start: Instant) {
        if let Err(error) = self.state.require_consumer() {
            self.send_error(&error, "position", args.req_id, None, start);
            return;
        }
        match fan_out::position(self.worker.clone(), args.topic_vgroup_ids).await {
            Ok(position) => self.send_json(&PositionResp {
                code: 0,
                message: String::new(),
                action: "position",
                req_id: args.req_id,
                timing: elapsed_ns(start),
                position,
            }),
            Err(error) => self.send_error(&error, "position", args.req_id, None, start),
        }
    }

    pub async fn assignment(&mut self, args: AssignmentArgs, start: Instant) {
        if let Err(error) = self.state.require_consumer() {
            self.send_error(&error, "assignment", args.req_id, None, start);
            return;
        }
        match self.worker.assignment(args.topic).await {
            Ok(assignment) => self.send_json(&AssignmentResp {
                code: 0,
                message: String::new(),
                action: "assignment",
                req_id: args.req_id,
                timing: elapsed_ns(start),
                assignment: assignment
                    .into_iter()
                    .map(|a| AssignmentEntry {
                        vgroup_id: a.vgroup_id,
                        begin: a.begin,
                        end: a.end,
                        offset: a.offset,
                    })
                    .collect(),
            }),
            Err(error) => self.send_error(&to_action_error(error), "assignment", args.req_id, None, start),
        }
    }

    pub async fn seek(&mut self, args: SeekArgs, start: Instant) {
        if let Err(error) = self.state.require_consumer() {
            self.send_error(&error, "seek", args.req_id, None, start);
            return;
        }
        match self.worker.seek(args.topic, args.vgroup_id, args.offset).await {
            Ok(()) => self.send_json(&SeekResp {
                code: 0,
                message: String::new(),
                action: "seek",
                req_id: args.req_id,
                timing: elapsed_ns(start),
            }),
            Err(error) => self.send_error(&to_action_error(error), "seek", args.req_id, None, start),
        }
    }

    pub async fn list_topics(&mut self, args: ListTopicsArgs, start: Instant) {
        if let Err(error) = self.state.require_consumer() {
            self.send_error(&error, "list_topics", args.req_id, None, start);
            return;
        }
        match self.worker.list_topics().await {
            Ok(topics) => self.send_json(&ListTopicsResp {
                code: 0,
                message: String::new(),
                action: "list_topics",
                req_id: args.req_id,
                timing: elapsed_ns(start),
                topics,
            }),
            Err(error) => self.send_error(&to_action_error(error), "list_topics", args.req_id, None, start),
        }
    }

    /// Tear the session down (§4.4, any → Closed): best-effort unsubscribe, close the
    /// consumer, stop the timer, drain the buffer. Idempotent (§7).
    pub async fn shutdown(&mut self) {
        if self.state.is_closed() {
            return;
        }
        if self.state.current() == crate::state::ConsumerState::Subscribed {
            _ = self.worker.unsubscribe().await;
        }
        _ = self.worker.close().await;
        self.release_timer = None;
        for handle in self.buffer.clear().await {
            _ = self.worker.free_result(handle).await;
        }
        self.state.close();
    }
}

fn to_action_error(error: WorkerError) -> ActionError {
    match error {
        WorkerError::Native(native_error) => ActionError::Native(native_error),
        WorkerError::NotInitialized => ActionError::Precondition("tmq not init"),
    }
}

fn message_type_code(message_type: MessageType) -> i32 {
    match message_type {
        MessageType::Data => 1,
        MessageType::TableMeta => 2,
        MessageType::Metadata => 3,
    }
}

#[cfg(test)]
mod tests {
    use web_time::Instant;

    use super::*;
    use crate::native::fake::{empty_data_block, FakeConsumerFactory, Script, ScriptedMessage};
    use crate::native::{MessageType, RawMeta};
    use crate::response::OutboundFrame;

    fn session(script: Script) -> (Session, tokio::sync::mpsc::UnboundedReceiver<OutboundFrame>) {
        let (sender, receiver) = tokio::sync::mpsc::unbounded_channel();
        let factory = Arc::new(FakeConsumerFactory { script });
        (Session::new(SessionId(1), Arc::new(GatewayConfig::default()), factory, sender), receiver)
    }

    fn scripted(message_type: MessageType, topic: &str, raw: RawMeta, json_meta: Option<String>) -> ScriptedMessage {
        ScriptedMessage {
            message_type,
            topic: topic.to_owned(),
            database: "db".to_owned(),
            vgroup_id: 0,
            offset: 0,
            block: empty_data_block(),
            raw,
            json_meta,
        }
    }

    async fn subscribed(session: &mut Session) {
        session
            .subscribe(
                SubscribeArgs {
                    req_id: 1,
                    user: String::new(),
                    password: String::new(),
                    db: None,
                    group_id: None,
                    client_id: None,
                    offset_reset: None,
                    with_table_name: None,
                    auto_commit: None,
                    auto_commit_interval_ms: None,
                    snapshot_enable: None,
                    topics: vec!["t1".to_owned()],
                },
                Instant::now(),
            )
            .await;
    }

    fn drain_text(receiver: &mut tokio::sync::mpsc::UnboundedReceiver<OutboundFrame>) -> String {
        match receiver.try_recv().unwrap() {
            OutboundFrame::Text(text) => text,
            OutboundFrame::Binary(_) => panic!("expected a text frame"),
        }
    }

    #[tokio::test]
    async fn fetch_raw_ships_the_scripted_payload_as_a_binary_frame() {
        let raw = RawMeta { meta_type: 7, payload: vec![1, 2, 3, 4] };
        let script = Script::new([scripted(MessageType::Data, "t1", raw, None)]);
        let (mut session, mut receiver) = session(script);
        subscribed(&mut session).await;
        receiver.try_recv().unwrap();

        session.poll(PollArgs { req_id: 2, blocking_time: 10 }, Instant::now()).await;
        let poll_reply = drain_text(&mut receiver);
        let poll: serde_json::Value = serde_json::from_str(&poll_reply).unwrap();
        let message_id = poll["message_id"].as_u64().unwrap();

        session.fetch_raw(MessageIdArgs { req_id: 3, message_id }, Instant::now()).await;
        match receiver.try_recv().unwrap() {
            OutboundFrame::Binary(bytes) => {
                assert_eq!(u16::from_le_bytes(bytes[36..38].try_into().unwrap()), 7);
                assert_eq!(&bytes[38..], &[1, 2, 3, 4]);
            }
            OutboundFrame::Text(_) => panic!("expected a binary frame"),
        }
    }

    #[tokio::test]
    async fn fetch_json_meta_rejects_a_data_message() {
        let script = Script::new([scripted(
            MessageType::Data,
            "t1",
            RawMeta { meta_type: 0, payload: Vec::new() },
            None,
        )]);
        let (mut session, mut receiver) = session(script);
        subscribed(&mut session).await;
        receiver.try_recv().unwrap();

        session.poll(PollArgs { req_id: 2, blocking_time: 10 }, Instant::now()).await;
        let poll: serde_json::Value = serde_json::from_str(&drain_text(&mut receiver)).unwrap();
        let message_id = poll["message_id"].as_u64().unwrap();

        session.fetch_json_meta(MessageIdArgs { req_id: 3, message_id }, Instant::now()).await;
        let reply: serde_json::Value = serde_json::from_str(&drain_text(&mut receiver)).unwrap();
        assert_ne!(reply["code"], 0);
        assert_eq!(reply["message"], "message type is not meta");
    }

    #[tokio::test]
    async fn commit_offset_removes_the_message_from_the_buffer() {
        let script = Script::new([scripted(
            MessageType::Data,
            "t1",
            RawMeta { meta_type: 0, payload: Vec::new() },
            None,
        )]);
        let (mut session, mut receiver) = session(script);
        subscribed(&mut session).await;
        receiver.try_recv().unwrap();

        session.poll(PollArgs { req_id: 2, blocking_time: 10 }, Instant::now()).await;
        drain_text(&mut receiver);
        assert_eq!(session.buffer.len().await, 1);

        session
            .commit_offset(CommitOffsetArgs { req_id: 3, topic: "t1".to_owned(), vg_id: 0, offset: 0 }, Instant::now())
            .await;
        let reply: serde_json::Value = serde_json::from_str(&drain_text(&mut receiver)).unwrap();
        assert_eq!(reply["code"], 0);
        assert_eq!(session.buffer.len().await, 0);
    }

    #[tokio::test]
    async fn assignment_before_subscribe_reports_not_init() {
        let (mut session, mut receiver) = session(Script::default());
        session.assignment(AssignmentArgs { req_id: 1, topic: "t1".to_owned() }, Instant::now()).await;
        let reply: serde_json::Value = serde_json::from_str(&drain_text(&mut receiver)).unwrap();
        assert_ne!(reply["code"], 0);
        assert_eq!(reply["message"], "tmq not init");
    }
}
