//! Wire types for the hosted row store and its realtime channel.
//!
//! Rows live in a single table `{key, content, updated_at}`. Change
//! notifications arrive over a Phoenix-style channel socket where every
//! frame is a JSON object `{topic, event, payload, ref, join_ref}`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// One row of the shared table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteRow {
    pub key: String,
    #[serde(default)]
    pub content: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl RemoteRow {
    pub fn new(key: impl Into<String>, content: Value) -> Self {
        Self {
            key: key.into(),
            content,
            updated_at: Some(Utc::now()),
        }
    }
}

/// Event name of row-level change notifications.
pub const CHANGE_EVENT: &str = "postgres_changes";
/// Topic used for socket heartbeats.
pub const HEARTBEAT_TOPIC: &str = "phoenix";

/// A frame on the realtime socket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelMessage {
    pub topic: String,
    pub event: String,
    #[serde(default)]
    pub payload: Value,
    #[serde(rename = "ref", default)]
    pub msg_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_ref: Option<String>,
}

impl ChannelMessage {
    /// Join request subscribing to every change on one table.
    pub fn join(topic: &str, schema: &str, table: &str, access_token: &str, msg_ref: &str) -> Self {
        Self {
            topic: topic.to_string(),
            event: "phx_join".to_string(),
            payload: json!({
                "config": {
                    "broadcast": { "self": false },
                    "presence": { "key": "" },
                    "postgres_changes": [
                        { "event": "*", "schema": schema, "table": table }
                    ]
                },
                "access_token": access_token
            }),
            msg_ref: Some(msg_ref.to_string()),
            join_ref: Some(msg_ref.to_string()),
        }
    }

    pub fn heartbeat(msg_ref: &str) -> Self {
        Self {
            topic: HEARTBEAT_TOPIC.to_string(),
            event: "heartbeat".to_string(),
            payload: json!({}),
            msg_ref: Some(msg_ref.to_string()),
            join_ref: None,
        }
    }

    pub fn leave(topic: &str, msg_ref: &str) -> Self {
        Self {
            topic: topic.to_string(),
            event: "phx_leave".to_string(),
            payload: json!({}),
            msg_ref: Some(msg_ref.to_string()),
            join_ref: None,
        }
    }

    /// Row change notification, as the server sends it.
    pub fn change(topic: &str) -> Self {
        Self {
            topic: topic.to_string(),
            event: CHANGE_EVENT.to_string(),
            payload: json!({ "data": { "type": "UPDATE" } }),
            msg_ref: None,
            join_ref: None,
        }
    }

    /// Reply to a request carrying `msg_ref`.
    pub fn reply(topic: &str, msg_ref: Option<String>, status: &str) -> Self {
        Self {
            topic: topic.to_string(),
            event: "phx_reply".to_string(),
            payload: json!({ "status": status, "response": {} }),
            msg_ref,
            join_ref: None,
        }
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn decode(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// True for a row change on `topic`.
    pub fn is_change(&self, topic: &str) -> bool {
        self.topic == topic && self.event == CHANGE_EVENT
    }

    /// Status of a `phx_reply` to the request with `msg_ref`, if this is one.
    pub fn reply_status(&self, msg_ref: &str) -> Option<&str> {
        if self.event != "phx_reply" || self.msg_ref.as_deref() != Some(msg_ref) {
            return None;
        }
        self.payload.get("status").and_then(Value::as_str)
    }

    /// True when the server reports the channel closed or crashed.
    pub fn is_channel_closed(&self, topic: &str) -> bool {
        self.topic == topic && (self.event == "phx_close" || self.event == "phx_error")
    }
}
