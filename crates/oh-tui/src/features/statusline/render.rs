//! Status line rendering.

use oh_core::session::ConnectionStatus;
use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use super::state::SessionView;
use crate::common::text::truncate_with_ellipsis;

/// Spinner frames for status line animation.
const SPINNER_FRAMES: &[&str] = &["◐", "◓", "◑", "◒"];

/// Ticks per spinner frame.
const SPINNER_SPEED_DIVISOR: usize = 3;

fn status_spans(
    view: &SessionView,
    agent_state: Option<&str>,
    spinner_frame: usize,
) -> Vec<Span<'static>> {
    let color = match view.status {
        ConnectionStatus::Connected if view.loading => Color::Yellow,
        ConnectionStatus::Connected => Color::Green,
        ConnectionStatus::Disconnected => Color::Red,
    };
    let indicator = if view.loading || view.status == ConnectionStatus::Disconnected {
        SPINNER_FRAMES[(spinner_frame / SPINNER_SPEED_DIVISOR) % SPINNER_FRAMES.len()]
    } else {
        "●"
    };

    let mut spans = vec![
        Span::styled(indicator, Style::default().fg(color)),
        Span::raw(" "),
        Span::styled(view.status_label(), Style::default().fg(color)),
    ];
    if let Some(state) = agent_state {
        spans.push(Span::styled(
            format!("  agent: {state}"),
            Style::default().fg(Color::Gray),
        ));
    }
    if view.pending > 0 {
        spans.push(Span::styled(
            format!("  {} queued", view.pending),
            Style::default().fg(Color::Yellow),
        ));
    }
    if let Some(id) = view.last_event_id {
        spans.push(Span::styled(
            format!("  #{id}"),
            Style::default().fg(Color::DarkGray),
        ));
    }
    spans
}

/// Renders connection state on the left and the conversation on the right.
pub fn render_status_line(
    view: &SessionView,
    agent_state: Option<&str>,
    spinner_frame: usize,
    frame: &mut Frame,
    area: Rect,
) {
    if area.height == 0 {
        return;
    }
    let left = Paragraph::new(Line::from(status_spans(view, agent_state, spinner_frame)))
        .alignment(Alignment::Left);
    frame.render_widget(left, area);

    if let Some(id) = &view.conversation_id {
        let hint = format!("{}  Alt+←/→ panel  Ctrl+C quit", truncate_with_ellipsis(id, 24));
        let right = Paragraph::new(Line::from(Span::styled(
            hint,
            Style::default().fg(Color::DarkGray),
        )))
        .alignment(Alignment::Right);
        frame.render_widget(right, area);
    }
}
