//! UI event types.
//!
//! Everything the reducer reacts to arrives as a `UiEvent`: terminal input,
//! timer ticks, the per-frame terminal size and session output.

use crossterm::event::Event;
use oh_core::session::SessionUpdate;

use crate::statusline::SessionView;

#[derive(Debug)]
pub enum UiEvent {
    /// Timer tick for animations and debounced work.
    Tick,

    /// Current terminal size, sent before other events each loop.
    Frame { width: u16, height: u16 },

    /// Raw terminal input (keys, mouse, paste, resize).
    Terminal(Event),

    /// Output of the session controller for one transport message.
    Session(SessionUpdate),

    /// Session snapshot for the status line.
    SessionSnapshot(SessionView),
}
