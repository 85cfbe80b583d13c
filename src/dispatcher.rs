//! Request Dispatcher (§4.5): parses one inbound text frame as a tagged action and routes it
//! to the session's handler for that action. Malformed envelopes and unknown actions are
//! logged and dropped — the protocol defines no error frame for either (§4.5, §6.1).

use web_time::Instant;

use crate::protocol::{
    AssignmentArgs, CommitOffsetArgs, CommittedArgs, Envelope, ListTopicsArgs, MessageIdArgs,
    PollArgs, PositionArgs, SeekArgs, SubscribeArgs, UnsubscribeArgs,
};
use crate::session::Session;

/// Parse and route one text frame. Never fails outward: parse/decode problems are logged
/// and the frame is dropped, per §4.5.
pub async fn dispatch(session: &mut Session, text: &str) {
    let start = Instant::now();

    let envelope: Envelope = match serde_json::from_str(text) {
        Ok(envelope) => envelope,
        Err(error) => {
            tracing::warn!(session = %session.id(), %error, "dropping malformed envelope");
            return;
        }
    };

    macro_rules! args {
        ($ty:ty) => {{
            let Some(raw) = envelope.args else {
                tracing::warn!(session = %session.id(), action = %envelope.action, "missing args");
                return;
            };
            match serde_json::from_str::<$ty>(raw.get()) {
                Ok(args) => args,
                Err(error) => {
                    tracing::warn!(session = %session.id(), action = %envelope.action, %error, "dropping malformed args");
                    return;
                }
            }
        }};
    }

    match envelope.action.as_str() {
        "version" => session.version(start),
        "subscribe" => session.subscribe(args!(SubscribeArgs), start).await,
        "poll" => session.poll(args!(PollArgs), start).await,
        "fetch" => session.fetch(args!(MessageIdArgs), start).await,
        "fetch_block" => session.fetch_block(args!(MessageIdArgs), start).await,
        "fetch_raw" => session.fetch_raw(args!(MessageIdArgs), start).await,
        "fetch_json_meta" => session.fetch_json_meta(args!(MessageIdArgs), start).await,
        "commit" => session.commit(args!(MessageIdArgs), start).await,
        "unsubscribe" => session.unsubscribe(args!(UnsubscribeArgs), start).await,
        "assignment" => session.assignment(args!(AssignmentArgs), start).await,
        "seek" => session.seek(args!(SeekArgs), start).await,
        "commit_offset" => session.commit_offset(args!(CommitOffsetArgs), start).await,
        "committed" => session.committed(args!(CommittedArgs), start).await,
        "position" => session.position(args!(PositionArgs), start).await,
        "list_topics" => session.list_topics(args!(ListTopicsArgs), start).await,
        other => tracing::debug!(session = %session.id(), action = other, "dropping unknown action"),
    }
}
