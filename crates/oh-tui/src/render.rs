//! Pure view/render functions for the TUI.
//!
//! Functions here take `&AppState`, draw to a ratatui `Frame` and never
//! mutate state or return effects.
//!
//! Screen layout: the split pane (chat first, workspace second) above a
//! one-row status line.

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};

use crate::state::{AppState, TuiState};
use crate::{input, split_pane, statusline, transcript, workspace};

/// Height of the status line.
pub const STATUS_HEIGHT: u16 = 1;

const INPUT_HINT: &str = " Enter send · Shift+Enter newline ";

/// Top-level regions of the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenLayout {
    pub pane: Rect,
    pub status: Rect,
}

pub fn screen_layout(area: Rect) -> ScreenLayout {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(STATUS_HEIGHT)])
        .split(area);
    ScreenLayout {
        pane: chunks[0],
        status: chunks[1],
    }
}

/// Renders the entire TUI to the frame.
pub fn render(app: &AppState, frame: &mut Frame) {
    let state = &app.tui;
    let screen = screen_layout(frame.area());
    let pane = state.split.layout(screen.pane);

    render_chat(state, frame, pane.first);
    split_pane::render_handle(&state.split, frame, pane.handle);
    workspace::render_workspace(&state.workspace, frame, pane.second);
    statusline::render_status_line(
        &state.session,
        state.agent_state.as_deref(),
        state.spinner_frame,
        frame,
        screen.status,
    );
}

/// Transcript above the prompt input.
fn render_chat(state: &TuiState, frame: &mut Frame, area: Rect) {
    if area.width == 0 || area.height == 0 {
        return;
    }
    let input_height = input::input_height(&state.input, area.width).min(area.height);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(input_height)])
        .split(area);

    transcript::render_transcript(&state.transcript, frame, chunks[0]);
    input::render_input(&state.input, frame, chunks[1], INPUT_HINT);
}

#[cfg(test)]
mod tests {
    use oh_core::config::Config;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    use super::*;
    use crate::transcript::HistoryCell;

    #[test]
    fn test_screen_layout_reserves_status_row() {
        let layout = screen_layout(Rect::new(0, 0, 100, 30));
        assert_eq!(layout.pane, Rect::new(0, 0, 100, 29));
        assert_eq!(layout.status, Rect::new(0, 29, 100, 1));
    }

    #[test]
    fn test_render_draws_both_regions() {
        let mut app = AppState::new(&Config::default());
        app.tui.split.set_viewport(120, 29);
        app.tui
            .transcript
            .push_cell(HistoryCell::assistant("hello from the agent"));

        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();
        terminal.draw(|frame| render(&app, frame)).unwrap();

        let buffer = terminal.backend().buffer();
        let screen: String = buffer.content().iter().map(|c| c.symbol()).collect();
        assert!(screen.contains("hello from the agent"));
        assert!(screen.contains("Workspace"));
        assert!(screen.contains("Disconnected"));
    }
}
