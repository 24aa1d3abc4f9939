//! WebSocket layer: request/response messages, events, configuration.
//!
//! Every Deriv API call is a JSON object sent over one socket; the server
//! echoes the caller's `req_id` so responses can be matched to requests.
//! The actual transport lives in `native.rs` (`ws-native` feature).

#[cfg(feature = "ws-native")]
pub mod native;

use crate::auth::AuthorizeRequest;
use crate::domain::candles::wire::TicksHistoryRequest;
use crate::error::ProviderError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ─── Outbound messages ───────────────────────────────────────────────────────

/// Messages sent from client to server.
///
/// Each variant serializes to the flat request object the API expects;
/// `req_id` is attached at send time by [`MessageOut::encode`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MessageOut {
    Authorize(AuthorizeRequest),
    TicksHistory(TicksHistoryRequest),
    Ping(PingRequest),
}

/// Application-level keepalive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PingRequest {
    pub ping: u8,
}

impl MessageOut {
    pub fn ping() -> Self {
        MessageOut::Ping(PingRequest { ping: 1 })
    }

    pub fn authorize(token: &str) -> Self {
        MessageOut::Authorize(AuthorizeRequest::new(token))
    }

    pub fn is_authorize(&self) -> bool {
        matches!(self, MessageOut::Authorize(_))
    }

    /// Serialize to the wire text, attaching `req_id` when given.
    pub fn encode(&self, req_id: Option<u64>) -> Result<String, serde_json::Error> {
        let mut value = serde_json::to_value(self)?;
        if let (Some(id), Some(obj)) = (req_id, value.as_object_mut()) {
            obj.insert("req_id".to_string(), Value::from(id));
        }
        serde_json::to_string(&value)
    }
}

// ─── Inbound messages ────────────────────────────────────────────────────────

/// Raw inbound message from the server.
///
/// `body` holds every field other than the envelope (e.g. `candles`,
/// `authorize`, `ping`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MessageIn {
    #[serde(default)]
    pub msg_type: String,
    #[serde(default)]
    pub req_id: Option<u64>,
    #[serde(default)]
    pub error: Option<Value>,
    #[serde(default)]
    pub echo_req: Value,
    #[serde(flatten)]
    pub body: Map<String, Value>,
}

impl MessageIn {
    /// Split off an embedded provider error.
    pub fn into_result(mut self) -> Result<Self, ProviderError> {
        match self.error.take() {
            Some(payload) => {
                let msg_type = (!self.msg_type.is_empty()).then(|| self.msg_type.clone());
                Err(ProviderError::from_payload(payload, msg_type))
            }
            None => Ok(self),
        }
    }

    /// Deserialize the body into a typed response.
    pub fn decode<T: DeserializeOwned>(self) -> Result<T, serde_json::Error> {
        serde_json::from_value(Value::Object(self.body))
    }

    pub fn is_pong(&self) -> bool {
        self.msg_type == "ping"
    }
}

// ─── WsEvent ─────────────────────────────────────────────────────────────────

/// High-level events emitted by the WS client to the consumer.
#[derive(Debug, Clone)]
pub enum WsEvent {
    /// A message no request was waiting for.
    Message(MessageIn),
    /// Connection established.
    Connected,
    /// Connection lost (may trigger reconnect).
    Disconnected { code: Option<u16>, reason: String },
    /// A deserialization or protocol error.
    Error(String),
    /// Reconnection gave up.
    MaxReconnectReached,
}

/// Connection state, stored as `u16` for atomic sharing with the background task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ReadyState {
    Connecting = 0,
    Open = 1,
    Closing = 2,
    Closed = 3,
}

impl From<u16> for ReadyState {
    fn from(v: u16) -> Self {
        match v {
            0 => ReadyState::Connecting,
            1 => ReadyState::Open,
            2 => ReadyState::Closing,
            _ => ReadyState::Closed,
        }
    }
}

/// Configuration for the WS client.
#[derive(Debug, Clone)]
pub struct WsConfig {
    pub url: String,
    pub reconnect: bool,
    pub max_reconnect_attempts: u32,
    pub base_reconnect_delay_ms: u32,
    pub ping_interval_ms: u32,
    pub pong_timeout_ms: u32,
    pub request_timeout_ms: u64,
}

impl Default for WsConfig {
    fn default() -> Self {
        Self {
            url: crate::network::DEFAULT_WS_URL.to_string(),
            reconnect: true,
            max_reconnect_attempts: 10,
            base_reconnect_delay_ms: 1000,
            ping_interval_ms: 30_000,
            pong_timeout_ms: 10_000,
            request_timeout_ms: 30_000,
        }
    }
}
