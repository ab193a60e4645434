//! Engine.IO v4 / Socket.IO v5 text framing.
//!
//! Only the subset used by the event stream is supported: the default
//! namespace, text frames and JSON payloads. Binary attachments are rejected.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Socket.IO CONNECT for the default namespace.
pub const CONNECT_FRAME: &str = "40";
/// Engine.IO PONG.
pub const PONG_FRAME: &str = "3";
/// Engine.IO CLOSE.
pub const CLOSE_FRAME: &str = "1";

/// Engine.IO handshake sent by the server on open.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Handshake {
    pub sid: String,
    #[serde(default)]
    pub ping_interval: u64,
    #[serde(default)]
    pub ping_timeout: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    Open(Handshake),
    Close,
    Ping,
    Pong,
    Noop,
    Connect(Option<Value>),
    Disconnect,
    Event {
        name: String,
        data: Value,
        ack: Option<u64>,
    },
    ConnectError(Value),
}

#[derive(Debug, Error)]
pub enum PacketError {
    #[error("empty frame")]
    Empty,
    #[error("unknown packet type {0:?}")]
    UnknownType(char),
    #[error("unsupported packet: {0}")]
    Unsupported(&'static str),
    #[error("malformed event payload")]
    MalformedEvent,
    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),
}

/// Decodes one WebSocket text frame.
pub fn decode(frame: &str) -> Result<Packet, PacketError> {
    let mut chars = frame.chars();
    let kind = chars.next().ok_or(PacketError::Empty)?;
    let rest = chars.as_str();
    match kind {
        '0' => Ok(Packet::Open(serde_json::from_str(rest)?)),
        '1' => Ok(Packet::Close),
        '2' => Ok(Packet::Ping),
        '3' => Ok(Packet::Pong),
        '4' => decode_socket(rest),
        '5' => Err(PacketError::Unsupported("upgrade")),
        '6' => Ok(Packet::Noop),
        other => Err(PacketError::UnknownType(other)),
    }
}

fn decode_socket(body: &str) -> Result<Packet, PacketError> {
    let mut chars = body.chars();
    let kind = chars.next().ok_or(PacketError::Empty)?;
    let rest = strip_namespace(chars.as_str());
    match kind {
        '0' => {
            if rest.is_empty() {
                Ok(Packet::Connect(None))
            } else {
                Ok(Packet::Connect(Some(serde_json::from_str(rest)?)))
            }
        }
        '1' => Ok(Packet::Disconnect),
        '2' => {
            let (ack, json) = split_ack(rest);
            let Value::Array(mut items) = serde_json::from_str(json)? else {
                return Err(PacketError::MalformedEvent);
            };
            if items.is_empty() {
                return Err(PacketError::MalformedEvent);
            }
            let Value::String(name) = items.remove(0) else {
                return Err(PacketError::MalformedEvent);
            };
            let data = if items.is_empty() {
                Value::Null
            } else {
                items.swap_remove(0)
            };
            Ok(Packet::Event { name, data, ack })
        }
        '3' => Err(PacketError::Unsupported("ack")),
        '4' => {
            if rest.is_empty() {
                Ok(Packet::ConnectError(Value::Null))
            } else {
                Ok(Packet::ConnectError(serde_json::from_str(rest)?))
            }
        }
        '5' | '6' => Err(PacketError::Unsupported("binary")),
        other => Err(PacketError::UnknownType(other)),
    }
}

/// Drops a leading `/nsp,` prefix. Only the default namespace is used.
fn strip_namespace(rest: &str) -> &str {
    if rest.starts_with('/') {
        match rest.find(',') {
            Some(idx) => &rest[idx + 1..],
            None => "",
        }
    } else {
        rest
    }
}

fn split_ack(rest: &str) -> (Option<u64>, &str) {
    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return (None, rest);
    }
    (rest[..digits].parse().ok(), &rest[digits..])
}

/// Encodes a Socket.IO EVENT frame for the default namespace.
pub fn encode_event(name: &str, data: &Value) -> String {
    format!("42{}", Value::Array(vec![Value::from(name), data.clone()]))
}
