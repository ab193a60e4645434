//! Socket.IO client over a WebSocket.
//!
//! One tokio task per connection. The task reconnects with exponential
//! backoff and reads its query parameters from the latest value sent by
//! the session controller.

use std::time::Duration;

use futures_util::{Sink, SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::packet::{self, CLOSE_FRAME, CONNECT_FRAME, PONG_FRAME, Packet};
use super::{
    ConnectParams, Connector, EventSink, INBOUND_EVENT, Transport, TransportError, TransportEvent,
};
use crate::config::BackendConfig;
use crate::endpoint::Endpoint;

/// Error message the socket library reports for low-level socket failures.
pub const WEBSOCKET_ERROR: &str = "websocket error";

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Backoff between reconnection attempts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub delay: Duration,
    pub delay_max: Duration,
    /// Consecutive failures tolerated before giving up. `None` retries forever.
    pub attempts: Option<u32>,
}

impl ReconnectPolicy {
    pub fn from_config(config: &BackendConfig) -> Self {
        Self {
            delay: config.reconnect_delay(),
            delay_max: config.reconnect_delay_max(),
            attempts: config.reconnect_attempts,
        }
    }

    /// Delay before the given (1-based) consecutive attempt.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32 << attempt.saturating_sub(1).min(16);
        self.delay.saturating_mul(factor).min(self.delay_max)
    }

    fn exhausted(&self, failures: u32) -> bool {
        self.attempts.is_some_and(|max| failures >= max)
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::from_config(&BackendConfig::default())
    }
}

#[derive(Debug, Clone)]
pub struct SocketIoConnector {
    endpoint: Endpoint,
    policy: ReconnectPolicy,
}

impl SocketIoConnector {
    pub fn new(endpoint: Endpoint, policy: ReconnectPolicy) -> Self {
        Self { endpoint, policy }
    }
}

impl Connector for SocketIoConnector {
    type Transport = SocketIoTransport;

    /// Spawns the connection task. Must be called within a tokio runtime.
    fn connect(&self, params: ConnectParams, sink: EventSink) -> SocketIoTransport {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let task = ConnectionTask {
            endpoint: self.endpoint.clone(),
            policy: self.policy.clone(),
            params,
            sink,
            cmd_rx,
            cancel: cancel.clone(),
            outbox: Vec::new(),
        };
        tokio::spawn(task.run());
        SocketIoTransport {
            cmd_tx,
            cancel,
        }
    }
}

enum Command {
    Emit(String),
    UpdateParams(ConnectParams),
}

/// Handle to a connection task. Dropping it closes the connection.
#[derive(Debug)]
pub struct SocketIoTransport {
    cmd_tx: mpsc::UnboundedSender<Command>,
    cancel: CancellationToken,
}

impl Transport for SocketIoTransport {
    fn emit(&mut self, event: &str, payload: &Value) -> Result<(), TransportError> {
        if self.cancel.is_cancelled() {
            return Err(TransportError::Closed);
        }
        self.cmd_tx
            .send(Command::Emit(packet::encode_event(event, payload)))
            .map_err(|_| TransportError::Closed)
    }

    fn update_params(&mut self, params: ConnectParams) {
        let _ = self.cmd_tx.send(Command::UpdateParams(params));
    }

    fn close(&mut self) {
        self.cancel.cancel();
    }
}

impl Drop for SocketIoTransport {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// How a single WebSocket session ended.
enum SessionEnd {
    Cancelled,
    /// The server rejected the Socket.IO connect. No reconnect follows.
    Refused(Value),
    Lost { reason: &'static str, connected: bool },
}

struct ConnectionTask {
    endpoint: Endpoint,
    policy: ReconnectPolicy,
    params: ConnectParams,
    sink: EventSink,
    cmd_rx: mpsc::UnboundedReceiver<Command>,
    cancel: CancellationToken,
    /// Frames not yet written: emitted before the Socket.IO connect
    /// completed, or left over from a failed write.
    outbox: Vec<String>,
}

impl ConnectionTask {
    async fn run(mut self) {
        let mut failures = 0u32;
        loop {
            let url = self.endpoint.socket_url(&self.params);
            debug!(%url, generation = self.sink.generation(), "opening event stream");

            let opened = tokio::select! {
                () = self.cancel.cancelled() => return,
                result = connect_async(url.as_str()) => result,
            };

            match opened {
                Ok((stream, _)) => match self.drive(stream).await {
                    SessionEnd::Cancelled => return,
                    SessionEnd::Refused(payload) => {
                        warn!(%payload, "event stream refused by server");
                        self.sink.send(TransportEvent::ConnectFailed(payload));
                        return;
                    }
                    SessionEnd::Lost { reason, connected } => {
                        info!(reason, "event stream lost");
                        if connected {
                            failures = 0;
                            self.sink.send(TransportEvent::Disconnected(json!(reason)));
                        } else {
                            failures += 1;
                            self.sink.send(TransportEvent::ConnectError(
                                json!({ "message": WEBSOCKET_ERROR, "description": reason }),
                            ));
                        }
                    }
                },
                Err(err) => {
                    failures += 1;
                    warn!(error = %err, "failed to open event stream");
                    self.sink.send(TransportEvent::ConnectError(
                        json!({ "message": WEBSOCKET_ERROR, "description": err.to_string() }),
                    ));
                }
            }

            if self.policy.exhausted(failures) {
                warn!(failures, "giving up on event stream");
                self.sink.send(TransportEvent::ConnectFailed(json!({
                    "message": format!("Reconnection failed after {failures} attempts"),
                })));
                return;
            }

            let delay = self.policy.delay_for(failures.max(1));
            if !self.wait(delay).await {
                return;
            }
        }
    }

    /// Sleeps before the next attempt while still accepting parameter
    /// updates. Returns false when cancelled.
    async fn wait(&mut self, delay: Duration) -> bool {
        let deadline = Instant::now() + delay;
        loop {
            tokio::select! {
                () = self.cancel.cancelled() => return false,
                () = tokio::time::sleep_until(deadline) => return true,
                cmd = self.cmd_rx.recv() => match cmd {
                    None => return false,
                    Some(cmd) => self.apply(cmd),
                },
            }
        }
    }

    fn apply(&mut self, cmd: Command) {
        match cmd {
            Command::Emit(frame) => self.outbox.push(frame),
            Command::UpdateParams(params) => self.params = params,
        }
    }

    async fn drive(&mut self, stream: WsStream) -> SessionEnd {
        let (mut write, mut read) = stream.split();
        let mut connected = false;
        let mut heartbeat: Option<Duration> = None;
        let mut deadline = Instant::now();

        loop {
            tokio::select! {
                () = self.cancel.cancelled() => {
                    let _ = write.send(Message::text(CLOSE_FRAME)).await;
                    let _ = write.close().await;
                    return SessionEnd::Cancelled;
                }
                () = tokio::time::sleep_until(deadline), if heartbeat.is_some() => {
                    return SessionEnd::Lost { reason: "ping timeout", connected };
                }
                cmd = self.cmd_rx.recv() => match cmd {
                    None => {
                        let _ = write.close().await;
                        return SessionEnd::Cancelled;
                    }
                    Some(Command::Emit(frame)) if connected => {
                        if let Err(unsent) = write_frames(&mut write, vec![frame]).await {
                            // Resent after the reconnect.
                            self.outbox.extend(unsent);
                            return SessionEnd::Lost { reason: "transport error", connected };
                        }
                    }
                    Some(cmd) => self.apply(cmd),
                },
                frame = read.next() => {
                    let text = match frame {
                        None | Some(Ok(Message::Close(_))) => {
                            return SessionEnd::Lost { reason: "transport close", connected };
                        }
                        Some(Err(err)) => {
                            debug!(error = %err, "event stream read failed");
                            return SessionEnd::Lost { reason: "transport error", connected };
                        }
                        Some(Ok(Message::Text(text))) => text,
                        Some(Ok(_)) => continue,
                    };

                    match packet::decode(text.as_str()) {
                        Ok(Packet::Open(handshake)) => {
                            let window = Duration::from_millis(
                                handshake.ping_interval + handshake.ping_timeout,
                            );
                            if !window.is_zero() {
                                heartbeat = Some(window);
                                deadline = Instant::now() + window;
                            }
                            if write.send(Message::text(CONNECT_FRAME)).await.is_err() {
                                return SessionEnd::Lost { reason: "transport error", connected };
                            }
                        }
                        Ok(Packet::Ping) => {
                            if let Some(window) = heartbeat {
                                deadline = Instant::now() + window;
                            }
                            if write.send(Message::text(PONG_FRAME)).await.is_err() {
                                return SessionEnd::Lost { reason: "transport error", connected };
                            }
                        }
                        Ok(Packet::Connect(_)) => {
                            connected = true;
                            self.sink.send(TransportEvent::Connected);
                            let queued = std::mem::take(&mut self.outbox);
                            if let Err(unsent) = write_frames(&mut write, queued).await {
                                self.outbox.extend(unsent);
                                return SessionEnd::Lost { reason: "transport error", connected };
                            }
                        }
                        Ok(Packet::Event { name, data, .. }) => {
                            if name == INBOUND_EVENT {
                                self.sink.send(TransportEvent::Event(data));
                            } else {
                                debug!(%name, "ignoring unknown event");
                            }
                        }
                        Ok(Packet::ConnectError(payload)) => {
                            let _ = write.close().await;
                            return SessionEnd::Refused(payload);
                        }
                        Ok(Packet::Disconnect) => {
                            return SessionEnd::Lost { reason: "io server disconnect", connected };
                        }
                        Ok(Packet::Close) => {
                            return SessionEnd::Lost { reason: "transport close", connected };
                        }
                        Ok(Packet::Pong | Packet::Noop) => {}
                        Err(err) => debug!(error = %err, "ignoring malformed frame"),
                    }
                }
            }
        }
    }
}

/// Writes `frames` in order. On the first failed write, returns that frame
/// and every frame after it.
async fn write_frames<S>(write: &mut S, frames: Vec<String>) -> Result<(), Vec<String>>
where
    S: Sink<Message> + Unpin,
{
    let mut frames = frames.into_iter();
    while let Some(frame) = frames.next() {
        if write.send(Message::text(frame.clone())).await.is_err() {
            let mut unsent = vec![frame];
            unsent.extend(frames);
            return Err(unsent);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    #[tokio::test]
    async fn test_write_frames_returns_unsent_tail_on_failure() {
        let sent = Arc::new(Mutex::new(Vec::<String>::new()));
        let log = Arc::clone(&sent);
        let mut sink = Box::pin(futures_util::sink::unfold((), move |(), msg: Message| {
            let log = Arc::clone(&log);
            async move {
                let mut log = log.lock().unwrap();
                if log.len() == 1 {
                    return Err("connection reset");
                }
                log.push(msg.to_text().unwrap().to_string());
                Ok(())
            }
        }));

        let frames = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let unsent = write_frames(&mut sink, frames).await.unwrap_err();
        assert_eq!(unsent, vec!["b", "c"]);
        assert_eq!(*sent.lock().unwrap(), vec!["a"]);
    }

    #[tokio::test]
    async fn test_write_frames_sends_everything() {
        let mut sink = futures_util::sink::drain();
        let frames = vec!["a".to_string(), "b".to_string()];
        assert!(write_frames(&mut sink, frames).await.is_ok());
    }

    #[test]
    fn test_backoff_doubles_up_to_max() {
        let policy = ReconnectPolicy {
            delay: Duration::from_millis(1000),
            delay_max: Duration::from_millis(5000),
            attempts: None,
        };
        assert_eq!(policy.delay_for(1), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(2), Duration::from_millis(2000));
        assert_eq!(policy.delay_for(3), Duration::from_millis(4000));
        assert_eq!(policy.delay_for(4), Duration::from_millis(5000));
        assert_eq!(policy.delay_for(40), Duration::from_millis(5000));
    }

    #[test]
    fn test_policy_exhaustion() {
        let mut policy = ReconnectPolicy::default();
        assert!(!policy.exhausted(1000));
        policy.attempts = Some(3);
        assert!(!policy.exhausted(2));
        assert!(policy.exhausted(3));
    }
}
