//! Wire shapes for client → server text frames (§6.1) and their JSON responses.
//!
//! Every inbound envelope is `{ "action": <string>, "args": <object> }`; `args` is kept as a
//! [`serde_json::value::RawValue`] so the dispatcher can pick the right argument type per
//! action before paying for a second parse (`serde_json`'s `raw_value` feature, as used by
//! `client-api` in the SpacetimeDB example pack for the same reason: defer the second parse).
//!
//! Several `args` fields are carried on the wire as JSON strings even though they're really
//! booleans or integers (the reference implementation's request structs are all
//! string-typed and parsed internally with `strconv`). The `stringy` helpers below accept
//! either representation so this implementation stays wire-compatible without adopting the
//! reference's all-strings shape internally.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Deserialize)]
pub struct Envelope<'a> {
    pub action: String,
    #[serde(borrow, default)]
    pub args: Option<&'a serde_json::value::RawValue>,
}

fn stringy_opt_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::Bool(value) => Ok(Some(value)),
        Value::String(s) if s.is_empty() => Ok(None),
        Value::String(s) => s.parse().map(Some).map_err(D::Error::custom),
        other => Err(D::Error::custom(format!("expected bool or string, got {other}"))),
    }
}

fn stringy_opt_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::Number(n) => n.as_u64().map(Some).ok_or_else(|| D::Error::custom("not a u64")),
        Value::String(s) if s.is_empty() => Ok(None),
        Value::String(s) => s.parse().map(Some).map_err(D::Error::custom),
        other => Err(D::Error::custom(format!("expected integer or string, got {other}"))),
    }
}

fn stringy_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(s) if s.is_empty() => Ok(None),
        Value::String(s) => Ok(Some(s)),
        other => Err(D::Error::custom(format!("expected string, got {other}"))),
    }
}

#[derive(Debug, Deserialize)]
pub struct SubscribeArgs {
    pub req_id: u64,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
    #[serde(default, deserialize_with = "stringy_opt_string")]
    pub db: Option<String>,
    #[serde(default, deserialize_with = "stringy_opt_string")]
    pub group_id: Option<String>,
    #[serde(default, deserialize_with = "stringy_opt_string")]
    pub client_id: Option<String>,
    #[serde(default, rename = "offset_rest", deserialize_with = "stringy_opt_string")]
    pub offset_reset: Option<String>,
    pub topics: Vec<String>,
    #[serde(default, deserialize_with = "stringy_opt_bool")]
    pub auto_commit: Option<bool>,
    #[serde(default, deserialize_with = "stringy_opt_u64")]
    pub auto_commit_interval_ms: Option<u64>,
    #[serde(default, deserialize_with = "stringy_opt_bool")]
    pub snapshot_enable: Option<bool>,
    #[serde(default, deserialize_with = "stringy_opt_bool")]
    pub with_table_name: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct SubscribeResp {
    pub code: u32,
    pub message: String,
    pub action: &'static str,
    pub req_id: u64,
    pub timing: u64,
}

#[derive(Debug, Deserialize)]
pub struct PollArgs {
    pub req_id: u64,
    pub blocking_time: u64,
}

#[derive(Debug, Serialize)]
pub struct PollResp {
    pub code: u32,
    pub message: String,
    pub action: &'static str,
    pub req_id: u64,
    pub timing: u64,
    pub have_message: bool,
    pub topic: String,
    pub database: String,
    pub vgroup_id: i32,
    pub message_type: i32,
    pub message_id: u64,
    pub offset: i64,
}

#[derive(Debug, Deserialize)]
pub struct MessageIdArgs {
    pub req_id: u64,
    pub message_id: u64,
}

#[derive(Debug, Serialize)]
pub struct FetchResp {
    pub code: u32,
    pub message: String,
    pub action: &'static str,
    pub req_id: u64,
    pub timing: u64,
    pub message_id: u64,
    pub completed: bool,
    pub table_name: String,
    pub rows: u64,
    pub fields_count: usize,
    pub fields_names: Vec<String>,
    pub fields_types: Vec<i32>,
    pub fields_lengths: Vec<i64>,
    pub precision: i32,
}

#[derive(Debug, Serialize)]
pub struct FetchJsonMetaResp<'a> {
    pub code: u32,
    pub message: String,
    pub action: &'static str,
    pub req_id: u64,
    pub timing: u64,
    pub message_id: u64,
    /// Raw JSON bytes from the native library, opaque to the gateway (§4.9). Serialized
    /// as-is rather than re-encoded, via [`serde_json::value::RawValue`].
    #[serde(borrow)]
    pub data: &'a serde_json::value::RawValue,
}

#[derive(Debug, Serialize)]
pub struct CommitResp {
    pub code: u32,
    pub message: String,
    pub action: &'static str,
    pub req_id: u64,
    pub timing: u64,
    pub message_id: u64,
}

#[derive(Debug, Deserialize)]
pub struct UnsubscribeArgs {
    pub req_id: u64,
}

#[derive(Debug, Serialize)]
pub struct UnsubscribeResp {
    pub code: u32,
    pub message: String,
    pub action: &'static str,
    pub req_id: u64,
    pub timing: u64,
}

#[derive(Debug, Deserialize)]
pub struct AssignmentArgs {
    pub req_id: u64,
    pub topic: String,
}

#[derive(Debug, Serialize)]
pub struct AssignmentEntry {
    pub vgroup_id: i32,
    pub begin: i64,
    pub end: i64,
    pub offset: i64,
}

#[derive(Debug, Serialize)]
pub struct AssignmentResp {
    pub code: u32,
    pub message: String,
    pub action: &'static str,
    pub req_id: u64,
    pub timing: u64,
    pub assignment: Vec<AssignmentEntry>,
}

#[derive(Debug, Deserialize)]
pub struct SeekArgs {
    pub req_id: u64,
    pub topic: String,
    pub vgroup_id: i32,
    pub offset: i64,
}

#[derive(Debug, Serialize)]
pub struct SeekResp {
    pub code: u32,
    pub message: String,
    pub action: &'static str,
    pub req_id: u64,
    pub timing: u64,
}

#[derive(Debug, Deserialize)]
pub struct CommitOffsetArgs {
    pub req_id: u64,
    pub topic: String,
    pub vg_id: i32,
    pub offset: i64,
}

#[derive(Debug, Serialize)]
pub struct CommitOffsetResp {
    pub code: u32,
    pub message: String,
    pub action: &'static str,
    pub req_id: u64,
    pub timing: u64,
    pub topic: String,
    pub vg_id: i32,
    pub offset: i64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TopicVgroupId {
    pub topic: String,
    pub vgroup_id: i32,
}

#[derive(Debug, Deserialize)]
pub struct CommittedArgs {
    pub req_id: u64,
    pub topic_vgroup_ids: Vec<TopicVgroupId>,
}

#[derive(Debug, Serialize)]
pub struct CommittedResp {
    pub code: u32,
    pub message: String,
    pub action: &'static str,
    pub req_id: u64,
    pub timing: u64,
    pub committed: Vec<i64>,
}

#[derive(Debug, Deserialize)]
pub struct PositionArgs {
    pub req_id: u64,
    pub topic_vgroup_ids: Vec<TopicVgroupId>,
}

#[derive(Debug, Serialize)]
pub struct PositionResp {
    pub code: u32,
    pub message: String,
    pub action: &'static str,
    pub req_id: u64,
    pub timing: u64,
    pub position: Vec<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ListTopicsArgs {
    pub req_id: u64,
}

#[derive(Debug, Serialize)]
pub struct ListTopicsResp {
    pub code: u32,
    pub message: String,
    pub action: &'static str,
    pub req_id: u64,
    pub timing: u64,
    pub topics: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct VersionResp {
    pub code: u32,
    pub message: String,
    pub version: &'static str,
}

/// `{code,message,action,req_id,timing,message_id?}` (§6.4). `message_id` is only populated
/// for fetch-family actions; all other actions send it as absent, matching the reference
/// implementation's `*uint64` + `omitempty`.
#[derive(Debug, Serialize)]
pub struct ErrorResp {
    pub code: u32,
    pub message: String,
    pub action: &'static str,
    pub req_id: u64,
    pub timing: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<u64>,
}
