//! Event-stream session controller.
//!
//! Owns the single transport of a conversation, accumulates inbound events in
//! arrival order, buffers outbound actions while disconnected and turns
//! connection errors into chat-visible errors.
//!
//! The controller is synchronous: transports report through a channel and
//! the owner feeds each [`TransportMessage`] into [`SessionController::handle`].

use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

use oh_types::EventRecord;
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::transport::{
    ConnectParams, Connector, EventSink, OUTBOUND_EVENT, Transport, TransportEvent,
    TransportMessage,
};

/// Error message that is never surfaced to the chat.
pub const WEBSOCKET_ERROR_MARKER: &str = "websocket error";

/// Source tag of chat errors raised by the connection.
pub const CHAT_ERROR_SOURCE: &str = "websocket";

/// Message actions arriving faster than this mean history is still loading.
pub const MESSAGE_RATE_THRESHOLD: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    Connected,
    #[default]
    Disconnected,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionStatus::Connected => f.write_str("connected"),
            ConnectionStatus::Disconnected => f.write_str("disconnected"),
        }
    }
}

/// Tracks the interval between consecutive message actions.
#[derive(Debug, Clone)]
pub struct MessageRate {
    threshold: Duration,
    last: Option<Instant>,
    rate: Option<Duration>,
    under: bool,
    count: usize,
}

impl MessageRate {
    pub fn new(threshold: Duration) -> Self {
        Self {
            threshold,
            last: None,
            rate: None,
            under: true,
            count: 0,
        }
    }

    pub fn record(&mut self, now: Instant) {
        if let Some(prev) = self.last {
            let interval = now.saturating_duration_since(prev);
            self.rate = Some(interval);
            self.under = interval <= self.threshold;
        }
        self.last = Some(now);
        self.count += 1;
    }

    /// Interval between the last two recorded messages.
    pub fn rate(&self) -> Option<Duration> {
        self.rate
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// True while messages keep arriving within the threshold.
    pub fn is_under_threshold(&self, now: Instant) -> bool {
        self.under
            && self
                .last
                .is_none_or(|last| now.saturating_duration_since(last) <= self.threshold)
    }
}

impl Default for MessageRate {
    fn default() -> Self {
        Self::new(MESSAGE_RATE_THRESHOLD)
    }
}

/// An error shown inline in the chat transcript.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatError {
    pub message: String,
    pub source: &'static str,
    pub msg_id: Option<String>,
    pub metadata: Map<String, Value>,
}

/// Builds the chat error for a connection error payload.
///
/// Only objects with a string `message` qualify, and the generic
/// `"websocket error"` marker is suppressed.
pub fn chat_error_from_payload(payload: &Value) -> Option<ChatError> {
    let message = payload.get("message")?.as_str()?;
    if message == WEBSOCKET_ERROR_MARKER {
        return None;
    }

    let (msg_id, metadata) = match payload.get("data") {
        Some(Value::Object(data)) => (
            data.get("msg_id").and_then(Value::as_str).map(str::to_string),
            data.clone(),
        ),
        _ => (None, Map::new()),
    };

    Some(ChatError {
        message: message.to_string(),
        source: CHAT_ERROR_SOURCE,
        msg_id,
        metadata,
    })
}

/// What changed after handling a transport message.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionUpdate {
    StatusChanged(ConnectionStatus),
    /// A new inbound event, already appended to the event list.
    Event(EventRecord),
    /// Pending actions sent after (re)connecting.
    Flushed(usize),
    ChatError(ChatError),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("a conversation id is required")]
    MissingConversationId,
}

pub struct SessionController<C: Connector> {
    connector: C,
    tx: mpsc::UnboundedSender<TransportMessage>,
    transport: Option<C::Transport>,
    generation: u64,
    conversation_id: Option<String>,
    status: ConnectionStatus,
    events: Vec<EventRecord>,
    pending: VecDeque<Value>,
    last_event_id: Option<i64>,
    rate: MessageRate,
}

impl<C: Connector> SessionController<C> {
    /// Creates an idle controller. Transport messages are delivered to `tx`.
    pub fn new(connector: C, tx: mpsc::UnboundedSender<TransportMessage>) -> Self {
        Self {
            connector,
            tx,
            transport: None,
            generation: 0,
            conversation_id: None,
            status: ConnectionStatus::Disconnected,
            events: Vec::new(),
            pending: VecDeque::new(),
            last_event_id: None,
            rate: MessageRate::default(),
        }
    }

    /// Opens the connection for a conversation.
    ///
    /// Connecting to the current conversation again is a no-op while its
    /// connection is open, and a retry that resumes from the last event id
    /// once the connection has failed. A different id tears down the
    /// previous connection first.
    pub fn connect(&mut self, conversation_id: &str) -> Result<(), SessionError> {
        let conversation_id = conversation_id.trim();
        if conversation_id.is_empty() {
            return Err(SessionError::MissingConversationId);
        }
        let same_conversation = self.conversation_id.as_deref() == Some(conversation_id);
        if same_conversation && self.transport.is_some() {
            return Ok(());
        }

        if let Some(mut old) = self.transport.take() {
            old.close();
        }
        self.generation += 1;
        if !same_conversation {
            self.conversation_id = Some(conversation_id.to_string());
            self.last_event_id = None;
            self.events.clear();
            self.rate = MessageRate::default();
        }
        self.status = ConnectionStatus::Disconnected;

        let params = self.connect_params();
        info!(
            conversation_id,
            generation = self.generation,
            "connecting to event stream"
        );
        let sink = EventSink::new(self.generation, self.tx.clone());
        self.transport = Some(self.connector.connect(params, sink));
        Ok(())
    }

    /// Sends an action now, or queues it when not connected.
    pub fn send(&mut self, action: Value) {
        if self.status == ConnectionStatus::Connected
            && let Some(transport) = self.transport.as_mut()
        {
            match transport.emit(OUTBOUND_EVENT, &action) {
                Ok(()) => return,
                Err(err) => warn!(error = %err, "emit failed; queueing action"),
            }
        } else {
            warn!("not connected; queueing action until the connection opens");
        }
        self.pending.push_back(action);
    }

    /// Queues an action for the next connect without sending it.
    pub fn queue(&mut self, action: Value) {
        self.pending.push_back(action);
    }

    /// Applies one transport message. Messages from replaced connections
    /// are dropped.
    pub fn handle(&mut self, message: TransportMessage, now: Instant) -> Vec<SessionUpdate> {
        if message.generation != self.generation || self.transport.is_none() {
            debug!(
                generation = message.generation,
                current = self.generation,
                "dropping stale transport message"
            );
            return Vec::new();
        }

        let mut updates = Vec::new();
        match message.event {
            TransportEvent::Connected => {
                self.set_status(ConnectionStatus::Connected, &mut updates);
                let sent = self.flush_pending();
                if sent > 0 {
                    updates.push(SessionUpdate::Flushed(sent));
                }
            }
            TransportEvent::Event(value) => {
                let record = EventRecord::new(value);
                if record.is_message_action() {
                    self.rate.record(now);
                }
                if let Some(id) = record.id() {
                    self.last_event_id = Some(id);
                }
                self.events.push(record.clone());
                updates.push(SessionUpdate::Event(record));
            }
            TransportEvent::Disconnected(payload) => {
                self.set_status(ConnectionStatus::Disconnected, &mut updates);
                let params = self.connect_params();
                if let Some(transport) = self.transport.as_mut() {
                    transport.update_params(params);
                }
                self.surface_error(&payload, &mut updates);
            }
            TransportEvent::ConnectError(payload) => {
                self.set_status(ConnectionStatus::Disconnected, &mut updates);
                self.surface_error(&payload, &mut updates);
            }
            TransportEvent::ConnectFailed(payload) => {
                self.set_status(ConnectionStatus::Disconnected, &mut updates);
                self.surface_error(&payload, &mut updates);
                // The connection task has ended; `connect` may retry.
                if let Some(mut transport) = self.transport.take() {
                    transport.close();
                }
            }
        }
        updates
    }

    fn set_status(&mut self, status: ConnectionStatus, updates: &mut Vec<SessionUpdate>) {
        if self.status != status {
            info!(%status, "event stream status changed");
            self.status = status;
            updates.push(SessionUpdate::StatusChanged(status));
        }
    }

    fn surface_error(&self, payload: &Value, updates: &mut Vec<SessionUpdate>) {
        match chat_error_from_payload(payload) {
            Some(error) => {
                warn!(message = %error.message, "event stream error");
                updates.push(SessionUpdate::ChatError(error));
            }
            None => debug!(%payload, "connection error not surfaced"),
        }
    }

    fn flush_pending(&mut self) -> usize {
        let Some(transport) = self.transport.as_mut() else {
            return 0;
        };
        let mut sent = 0;
        while let Some(action) = self.pending.pop_front() {
            if let Err(err) = transport.emit(OUTBOUND_EVENT, &action) {
                warn!(error = %err, "flush interrupted");
                self.pending.push_front(action);
                break;
            }
            sent += 1;
        }
        sent
    }

    /// Parameters for the next (re)connect, built from current state.
    pub fn connect_params(&self) -> ConnectParams {
        ConnectParams {
            latest_event_id: self.last_event_id.unwrap_or(-1),
            conversation_id: self.conversation_id.clone().unwrap_or_default(),
        }
    }

    /// Closes the connection for good.
    pub fn close(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            transport.close();
        }
        self.status = ConnectionStatus::Disconnected;
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn events(&self) -> &[EventRecord] {
        &self.events
    }

    pub fn pending(&self) -> impl ExactSizeIterator<Item = &Value> {
        self.pending.iter()
    }

    pub fn last_event_id(&self) -> Option<i64> {
        self.last_event_id
    }

    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation_id.as_deref()
    }

    /// True while a connection task is alive (connected or reconnecting).
    pub fn is_open(&self) -> bool {
        self.transport.is_some()
    }

    pub fn message_rate(&self) -> &MessageRate {
        &self.rate
    }

    /// True while history is still being replayed.
    pub fn is_loading_messages(&self, now: Instant) -> bool {
        self.rate.is_under_threshold(now)
    }
}

impl<C: Connector> Drop for SessionController<C> {
    fn drop(&mut self) {
        self.close();
    }
}
