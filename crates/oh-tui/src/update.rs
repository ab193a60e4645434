//! TUI reducer (update function).
//!
//! All state mutations happen here. The runtime calls `update(app, event)`
//! and executes the returned effects.

use std::time::Instant;

use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use oh_core::session::{ConnectionStatus, SessionUpdate};
use oh_types::EventRecord;
use ratatui::layout::{Position, Rect};
use serde_json::Value;

use crate::effects::UiEffect;
use crate::events::UiEvent;
use crate::split_pane::HandleHit;
use crate::state::{AppState, TuiState};
use crate::transcript::HistoryCell;
use crate::{input, render, transcript, workspace};

/// Lines scrolled per mouse wheel step.
const SCROLL_STEP: usize = 3;

/// Lines scrolled per PageUp/PageDown.
const PAGE_STEP: usize = 10;

/// Observation reporting agent state transitions.
const AGENT_STATE_OBSERVATION: &str = "agent_state_changed";

/// The main reducer function.
pub fn update(app: &mut AppState, event: UiEvent) -> Vec<UiEffect> {
    match event {
        UiEvent::Tick => {
            handle_tick(&mut app.tui, Instant::now());
            vec![]
        }
        UiEvent::Frame { width, height } => {
            handle_frame(&mut app.tui, width, height);
            vec![]
        }
        UiEvent::Terminal(term_event) => handle_terminal_event(&mut app.tui, term_event),
        UiEvent::Session(session_update) => {
            handle_session_update(&mut app.tui, session_update);
            vec![]
        }
        UiEvent::SessionSnapshot(view) => {
            app.tui.session = view;
            vec![]
        }
    }
}

// ============================================================================
// Frame / Tick
// ============================================================================

/// Viewport of the split pane for a terminal of `width` x `height`.
fn pane_viewport(width: u16, height: u16) -> (u16, u16) {
    let pane = render::screen_layout(Rect::new(0, 0, width, height)).pane;
    (pane.width, pane.height)
}

fn handle_frame(tui: &mut TuiState, width: u16, height: u16) {
    // The first frame sizes the pane directly; later changes go through the
    // resize debouncer.
    if tui.terminal_size.is_none() {
        let (w, h) = pane_viewport(width, height);
        tui.split.set_viewport(w, h);
    }
    tui.terminal_size = Some((width, height));
}

fn handle_tick(tui: &mut TuiState, now: Instant) {
    tui.spinner_frame = tui.spinner_frame.wrapping_add(1);
    if let Some((width, height)) = tui.resize.poll(now) {
        let (w, h) = pane_viewport(width, height);
        tui.split.set_viewport(w, h);
    }
    tui.split.tick();
}

// ============================================================================
// Terminal Event Handlers
// ============================================================================

fn handle_terminal_event(tui: &mut TuiState, event: Event) -> Vec<UiEffect> {
    match event {
        Event::Key(key) if key.kind != KeyEventKind::Release => handle_key(tui, key),
        Event::Mouse(mouse) => {
            handle_mouse(tui, mouse);
            vec![]
        }
        Event::Paste(text) => {
            input::handle_paste(&mut tui.input, &text);
            vec![]
        }
        Event::Resize(width, height) => {
            tui.resize.push((width, height), Instant::now());
            vec![]
        }
        _ => vec![],
    }
}

fn handle_key(tui: &mut TuiState, key: KeyEvent) -> Vec<UiEffect> {
    if key.modifiers.contains(KeyModifiers::ALT) {
        match key.code {
            KeyCode::Left | KeyCode::Up => {
                tui.split.toggle_collapse();
                return vec![];
            }
            KeyCode::Right | KeyCode::Down => {
                tui.split.toggle_expand();
                return vec![];
            }
            _ => {}
        }
    }

    match key.code {
        KeyCode::PageUp => {
            tui.transcript.scroll_up(PAGE_STEP);
            vec![]
        }
        KeyCode::PageDown => {
            tui.transcript.scroll_down(PAGE_STEP);
            vec![]
        }
        _ => input::handle_main_key(&mut tui.input, key),
    }
}

fn pane_area(tui: &TuiState) -> Option<Rect> {
    let (width, height) = tui.terminal_size?;
    Some(render::screen_layout(Rect::new(0, 0, width, height)).pane)
}

fn handle_mouse(tui: &mut TuiState, mouse: MouseEvent) {
    let Some(area) = pane_area(tui) else {
        return;
    };
    let pos = tui.split.axis_position(mouse.column, mouse.row);

    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            match tui.split.hit_test(area, mouse.column, mouse.row) {
                Some(HandleHit::Collapse) => tui.split.toggle_collapse(),
                Some(HandleHit::Expand) => tui.split.toggle_expand(),
                Some(HandleHit::Bar) => {
                    tui.split.start_drag(pos);
                }
                None => {}
            }
        }
        // Drags are tracked anywhere on screen, not only over the handle.
        MouseEventKind::Drag(MouseButton::Left) => tui.split.drag_to(pos),
        MouseEventKind::Up(MouseButton::Left) => tui.split.end_drag(pos),
        MouseEventKind::ScrollUp | MouseEventKind::ScrollDown => {
            let up = mouse.kind == MouseEventKind::ScrollUp;
            let point = Position::new(mouse.column, mouse.row);
            let layout = tui.split.layout(area);
            if layout.second.contains(point) {
                if up {
                    tui.workspace.scroll_up(SCROLL_STEP);
                } else {
                    tui.workspace.scroll_down(SCROLL_STEP);
                }
            } else if up {
                tui.transcript.scroll_up(SCROLL_STEP);
            } else {
                tui.transcript.scroll_down(SCROLL_STEP);
            }
        }
        _ => {}
    }
}

// ============================================================================
// Session Updates
// ============================================================================

fn handle_session_update(tui: &mut TuiState, update: SessionUpdate) {
    match update {
        SessionUpdate::StatusChanged(status) => {
            tui.session.status = status;
            let message = match status {
                ConnectionStatus::Connected => "Connected to the event stream",
                ConnectionStatus::Disconnected => "Disconnected from the event stream",
            };
            tui.transcript.push_cell(HistoryCell::system(message));
        }
        SessionUpdate::Event(record) => handle_event_record(tui, &record),
        SessionUpdate::Flushed(count) => {
            tui.transcript.push_cell(HistoryCell::system(format!(
                "Sent {count} queued message(s)"
            )));
        }
        SessionUpdate::ChatError(error) => {
            tui.transcript
                .push_cell(transcript::cell_for_chat_error(&error));
        }
    }
}

fn handle_event_record(tui: &mut TuiState, record: &EventRecord) {
    if let Some(observation) = record.observation()
        && observation.tag == AGENT_STATE_OBSERVATION
    {
        tui.agent_state = observation
            .extras
            .and_then(|extras| extras.get("agent_state"))
            .and_then(Value::as_str)
            .map(str::to_string);
        return;
    }

    for cell in transcript::cells_for_event(record) {
        tui.transcript.push_cell(cell);
    }
    if let Some(entry) = workspace::entry_for_event(record) {
        tui.workspace.push(entry);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use oh_core::config::Config;
    use oh_core::session::ChatError;
    use serde_json::{Map, json};

    use super::*;
    use crate::split_pane::CollapseMode;

    fn app() -> AppState {
        let mut app = AppState::new(&Config::default());
        update(
            &mut app,
            UiEvent::Frame {
                width: 161,
                height: 41,
            },
        );
        app
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> UiEvent {
        UiEvent::Terminal(Event::Mouse(MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }))
    }

    #[test]
    fn test_first_frame_sizes_pane() {
        let app = app();
        assert_eq!(app.tui.split.viewport(), (161, 40));
        assert_eq!(app.tui.split.bounds(), (40, 80));
    }

    #[test]
    fn test_mouse_drag_on_handle() {
        let mut app = app();
        // Handle sits right after the 60-column chat region.
        update(&mut app, mouse(MouseEventKind::Down(MouseButton::Left), 60, 20));
        assert!(app.tui.split.is_dragging());
        update(&mut app, mouse(MouseEventKind::Drag(MouseButton::Left), 70, 5));
        assert_eq!(app.tui.split.first_size(), 70);
        update(&mut app, mouse(MouseEventKind::Drag(MouseButton::Left), 150, 5));
        assert_eq!(app.tui.split.first_size(), 80);
        update(&mut app, mouse(MouseEventKind::Up(MouseButton::Left), 150, 5));
        assert!(!app.tui.split.is_dragging());
        assert_eq!(app.tui.split.first_size(), 80);
    }

    #[test]
    fn test_clicking_glyphs_toggles() {
        let mut app = app();
        update(&mut app, mouse(MouseEventKind::Down(MouseButton::Left), 60, 1));
        assert_eq!(app.tui.split.mode(), CollapseMode::Collapsed);
        assert!(!app.tui.split.is_dragging());
    }

    #[test]
    fn test_alt_arrows_toggle() {
        let mut app = app();
        let key = |code| UiEvent::Terminal(Event::Key(KeyEvent::new(code, KeyModifiers::ALT)));
        update(&mut app, key(KeyCode::Right));
        assert_eq!(app.tui.split.mode(), CollapseMode::Filled);
        update(&mut app, key(KeyCode::Left));
        assert_eq!(app.tui.split.mode(), CollapseMode::Split);
        assert!(app.tui.input.is_empty());
    }

    #[test]
    fn test_resize_is_debounced() {
        let mut app = app();
        update(&mut app, UiEvent::Terminal(Event::Resize(101, 41)));
        // Not applied until the debounce delay has passed.
        assert_eq!(app.tui.split.viewport(), (161, 40));

        handle_tick(
            &mut app.tui,
            Instant::now() + crate::split_pane::RESIZE_DEBOUNCE + Duration::from_millis(1),
        );
        assert_eq!(app.tui.split.viewport(), (101, 40));
        assert_eq!(app.tui.split.first_size(), 50);
    }

    #[test]
    fn test_session_events_fill_chat_and_workspace() {
        let mut app = app();
        let record = EventRecord::new(json!({
            "id": 3, "source": "agent", "message": "Running", "timestamp": "t",
            "action": "run", "args": {"command": "ls", "thought": "Look around"}
        }));
        update(&mut app, UiEvent::Session(SessionUpdate::Event(record)));
        assert_eq!(
            app.tui.transcript.cells(),
            &[HistoryCell::assistant("Look around")]
        );
        assert_eq!(app.tui.workspace.entries()[0].title, "$ ls");
    }

    #[test]
    fn test_agent_state_observation_updates_status() {
        let mut app = app();
        let record = EventRecord::new(json!({
            "id": 4, "source": "agent", "observation": "agent_state_changed",
            "content": "", "extras": {"agent_state": "awaiting_user_input"}
        }));
        update(&mut app, UiEvent::Session(SessionUpdate::Event(record)));
        assert_eq!(app.tui.agent_state.as_deref(), Some("awaiting_user_input"));
        assert!(app.tui.transcript.cells().is_empty());
    }

    #[test]
    fn test_chat_error_and_status_change() {
        let mut app = app();
        update(
            &mut app,
            UiEvent::Session(SessionUpdate::StatusChanged(ConnectionStatus::Connected)),
        );
        assert_eq!(app.tui.session.status, ConnectionStatus::Connected);

        let error = ChatError {
            message: "Agent crashed".to_string(),
            source: "websocket",
            msg_id: None,
            metadata: Map::new(),
        };
        update(&mut app, UiEvent::Session(SessionUpdate::ChatError(error)));
        assert_eq!(
            app.tui.transcript.cells().last(),
            Some(&HistoryCell::error("Agent crashed", None))
        );
    }
}
