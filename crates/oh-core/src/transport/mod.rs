//! Event-stream transport.
//!
//! A transport owns one logical connection to the backend and reports its
//! lifecycle through an [`EventSink`]. Every message is stamped with the
//! generation of the connection that produced it so the session controller
//! can drop events from a connection it has already replaced.

pub mod packet;
pub mod socketio;

use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;

pub use socketio::{ReconnectPolicy, SocketIoConnector, SocketIoTransport};

/// Inbound event name carrying backend events.
pub const INBOUND_EVENT: &str = "oh_event";
/// Outbound event name carrying user actions.
pub const OUTBOUND_EVENT: &str = "oh_action";

/// Query parameters of a (re)connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectParams {
    /// Last event id seen, or `-1` when none.
    pub latest_event_id: i64,
    pub conversation_id: String,
}

/// Lifecycle notifications produced by a transport.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    Connected,
    /// Payload of an inbound `oh_event`.
    Event(Value),
    /// Connection lost. Carries the disconnect reason or error payload.
    Disconnected(Value),
    /// The server or the socket refused the connection.
    ConnectError(Value),
    /// Reconnection gave up.
    ConnectFailed(Value),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransportMessage {
    pub generation: u64,
    pub event: TransportEvent,
}

/// Sending half handed to a transport; stamps its generation on every event.
#[derive(Debug, Clone)]
pub struct EventSink {
    generation: u64,
    tx: mpsc::UnboundedSender<TransportMessage>,
}

impl EventSink {
    pub fn new(generation: u64, tx: mpsc::UnboundedSender<TransportMessage>) -> Self {
        Self { generation, tx }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns false once the receiving side is gone.
    pub fn send(&self, event: TransportEvent) -> bool {
        self.tx
            .send(TransportMessage {
                generation: self.generation,
                event,
            })
            .is_ok()
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport is closed")]
    Closed,
}

/// Handle to a live connection.
pub trait Transport: Send {
    /// Queues an outbound event. Fire-and-forget.
    fn emit(&mut self, event: &str, payload: &Value) -> Result<(), TransportError>;

    /// Replaces the query parameters used by the next reconnect.
    fn update_params(&mut self, params: ConnectParams);

    /// Closes the connection. Further emits fail with [`TransportError::Closed`].
    fn close(&mut self);
}

/// Opens transports.
pub trait Connector {
    type Transport: Transport;

    fn connect(&self, params: ConnectParams, sink: EventSink) -> Self::Transport;
}
