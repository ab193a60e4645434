//! UI effect types.
//!
//! Effects are commands returned by the reducer that the runtime executes.
//! The reducer only mutates state; sending on the socket happens in the
//! runtime.

use serde_json::Value;

/// Effects returned by the reducer for the runtime to execute.
#[derive(Debug, PartialEq)]
pub enum UiEffect {
    /// Quit the application.
    Quit,

    /// Send an action payload over the event stream (queued while
    /// disconnected).
    SendAction(Value),

    /// Reconnect the session to another conversation.
    SwitchConversation(String),
}
