//! Application state composition.
//!
//! ```text
//! AppState
//! └── tui: TuiState
//!     ├── split: SplitPane            (chat | workspace layout)
//!     ├── resize: ResizeDebouncer     (pending terminal resize)
//!     ├── transcript: TranscriptState (chat cells, scroll)
//!     ├── workspace: WorkspaceState   (agent operations, output)
//!     ├── input: InputState           (prompt buffer, history)
//!     └── session: SessionView        (status line snapshot)
//! ```

use oh_core::config::Config;

use crate::input::InputState;
use crate::split_pane::{ResizeDebouncer, SplitPane};
use crate::statusline::SessionView;
use crate::transcript::TranscriptState;
use crate::workspace::WorkspaceState;

/// Combined application state for the TUI.
pub struct AppState {
    pub tui: TuiState,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self {
            tui: TuiState::new(config),
        }
    }
}

pub struct TuiState {
    /// Flag indicating the app should quit.
    pub should_quit: bool,
    pub split: SplitPane,
    pub resize: ResizeDebouncer,
    pub transcript: TranscriptState,
    pub workspace: WorkspaceState,
    pub input: InputState,
    pub session: SessionView,
    /// Last state reported by the agent (`running`, `awaiting_user_input`, ...).
    pub agent_state: Option<String>,
    /// Spinner animation frame counter.
    pub spinner_frame: usize,
    /// Terminal size from the latest frame; `None` before the first frame.
    pub terminal_size: Option<(u16, u16)>,
}

impl TuiState {
    pub fn new(config: &Config) -> Self {
        Self {
            should_quit: false,
            split: SplitPane::from_config(&config.layout),
            resize: ResizeDebouncer::default(),
            transcript: TranscriptState::new(),
            workspace: WorkspaceState::new(),
            input: InputState::new(),
            session: SessionView::default(),
            agent_state: None,
            spinner_frame: 0,
            terminal_size: None,
        }
    }

    /// Drops everything tied to the current conversation.
    pub fn reset_conversation(&mut self) {
        self.transcript.clear();
        self.workspace.clear();
        self.agent_state = None;
    }
}
