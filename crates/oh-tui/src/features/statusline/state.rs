//! Status line state types.

use oh_core::session::ConnectionStatus;

/// Snapshot of the session taken by the runtime each frame.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionView {
    pub conversation_id: Option<String>,
    pub status: ConnectionStatus,
    /// True while message history is still replaying.
    pub loading: bool,
    pub pending: usize,
    pub last_event_id: Option<i64>,
}

impl SessionView {
    pub fn status_label(&self) -> &'static str {
        match self.status {
            ConnectionStatus::Connected if self.loading => "Loading messages",
            ConnectionStatus::Connected => "Connected",
            ConnectionStatus::Disconnected => "Disconnected",
        }
    }
}
