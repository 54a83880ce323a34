//! Wire message types
//!
//! Every message is a JSON envelope `{"src", "dest", "body"}`. Request bodies
//! are tagged by `type` and may carry a `msg_id`; reply bodies echo it back
//! as `in_reply_to`.

use std::collections::HashMap;

use klog_store::{CommittedOffsets, Offset, PollResult};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::ProtocolError;

/// A message envelope
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message<B> {
    pub src: String,
    pub dest: String,
    pub body: B,
}

/// Request bodies the node understands
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Assign this node its identity
    Init {
        node_id: String,
        #[serde(default)]
        node_ids: Vec<String>,
    },

    /// Append a value to a key's log
    Send {
        key: String,
        #[serde(deserialize_with = "integer")]
        msg: i64,
    },

    /// Read logs, from per-key offsets or in full when `offsets` is absent
    Poll {
        #[serde(default, deserialize_with = "optional_offsets")]
        offsets: Option<HashMap<String, Offset>>,
    },

    /// Record consumer progress per key
    CommitOffsets {
        #[serde(deserialize_with = "offsets")]
        offsets: CommittedOffsets,
    },

    /// Look up committed offsets
    ListCommittedOffsets { keys: Vec<String> },
}

impl Request {
    /// Request types accepted by [`Request::decode`].
    pub const TYPES: &'static [&'static str] = &[
        "init",
        "send",
        "poll",
        "commit_offsets",
        "list_committed_offsets",
    ];

    /// Decode a request body, telling unknown types apart from bad fields.
    pub fn decode(body: Value) -> Result<Self, ProtocolError> {
        if let Some(kind) = body.get("type").and_then(Value::as_str)
            && !Self::TYPES.contains(&kind)
        {
            return Err(ProtocolError::Unsupported(kind.to_string()));
        }
        Ok(serde_json::from_value(body)?)
    }
}

/// Reply bodies sent by the node
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    InitOk,
    SendOk { offset: Offset },
    PollOk { msgs: PollResult },
    CommitOffsetsOk,
    ListCommittedOffsetsOk { offsets: CommittedOffsets },
    Error { code: u32, text: String },
}

impl From<&ProtocolError> for Response {
    fn from(err: &ProtocolError) -> Self {
        Self::Error {
            code: err.code(),
            text: err.to_string(),
        }
    }
}

/// A reply body with its correlation ids
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReplyBody {
    #[serde(flatten)]
    pub response: Response,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msg_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_reply_to: Option<u64>,
}

/// Convert a JSON number to an integer, accepting integral floats.
fn to_integer<E: serde::de::Error>(number: &serde_json::Number) -> Result<i64, E> {
    if let Some(n) = number.as_i64() {
        return Ok(n);
    }
    match number.as_f64() {
        Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 => {
            Ok(f as i64)
        }
        _ => Err(E::custom(format!("expected an integer, got {number}"))),
    }
}

fn integer<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let number = serde_json::Number::deserialize(deserializer)?;
    to_integer(&number)
}

fn offsets<'de, D: Deserializer<'de>>(deserializer: D) -> Result<CommittedOffsets, D::Error> {
    HashMap::<String, serde_json::Number>::deserialize(deserializer)?
        .into_iter()
        .map(|(key, number)| to_integer(&number).map(|offset| (key, offset)))
        .collect()
}

fn optional_offsets<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<CommittedOffsets>, D::Error> {
    let raw = Option::<HashMap<String, serde_json::Number>>::deserialize(deserializer)?;
    raw.map(|map| {
        map.into_iter()
            .map(|(key, number)| to_integer::<D::Error>(&number).map(|offset| (key, offset)))
            .collect()
    })
    .transpose()
}
