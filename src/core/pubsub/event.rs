// src/core/pubsub/event.rs

use crate::core::protocol::RespValue;
use bytes::Bytes;

/// A structured pub/sub delivery. Internal consumers only ever see this;
/// the wire-level array is produced only at the point a connection writer
/// serializes one of these (see `into_resp_value`).
#[derive(Debug, Clone, PartialEq)]
pub enum SubscriberEvent {
    Subscribe { channel: String, index: usize },
    Unsubscribe { channel: String, index: usize },
    Psubscribe { pattern: String, index: usize },
    Punsubscribe { pattern: String, index: usize },
    Message { channel: String, payload: Bytes },
    Pmessage {
        pattern: String,
        channel: String,
        payload: Bytes,
    },
}

impl SubscriberEvent {
    /// Renders this event the way a subscribed client expects it on the
    /// wire, matching the `(message, channel, payload)` / `(subscribe,
    /// channel, count)` array shapes `PubSubModeHandler` produces for the
    /// broadcast-backed transport.
    pub fn into_resp_value(self) -> RespValue {
        match self {
            Self::Subscribe { channel, index } => RespValue::Array(vec![
                RespValue::BulkString("subscribe".into()),
                RespValue::BulkString(channel.into()),
                RespValue::Integer(index as i64),
            ]),
            Self::Unsubscribe { channel, index } => RespValue::Array(vec![
                RespValue::BulkString("unsubscribe".into()),
                RespValue::BulkString(channel.into()),
                RespValue::Integer(index as i64),
            ]),
            Self::Psubscribe { pattern, index } => RespValue::Array(vec![
                RespValue::BulkString("psubscribe".into()),
                RespValue::BulkString(pattern.into()),
                RespValue::Integer(index as i64),
            ]),
            Self::Punsubscribe { pattern, index } => RespValue::Array(vec![
                RespValue::BulkString("punsubscribe".into()),
                RespValue::BulkString(pattern.into()),
                RespValue::Integer(index as i64),
            ]),
            Self::Message { channel, payload } => RespValue::Array(vec![
                RespValue::BulkString("message".into()),
                RespValue::BulkString(channel.into()),
                RespValue::BulkString(payload),
            ]),
            Self::Pmessage {
                pattern,
                channel,
                payload,
            } => RespValue::Array(vec![
                RespValue::BulkString("pmessage".into()),
                RespValue::BulkString(pattern.into()),
                RespValue::BulkString(channel.into()),
                RespValue::BulkString(payload),
            ]),
        }
    }
}
