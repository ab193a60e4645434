//! Workspace panel rendering.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use super::state::{EntryKind, WorkspaceEntry, WorkspaceState};
use crate::common::text::{truncate_with_ellipsis, wrap_text};
use crate::transcript::visible_window;

fn title_style(kind: EntryKind) -> Style {
    let color = match kind {
        EntryKind::Command | EntryKind::IPython => Color::Green,
        EntryKind::Read => Color::Blue,
        EntryKind::Write | EntryKind::Edit => Color::Yellow,
        EntryKind::Browse => Color::Magenta,
        EntryKind::Output => Color::DarkGray,
    };
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

fn body_style(body_line: &str) -> Style {
    if body_line.starts_with("+ ") {
        Style::default().fg(Color::Green)
    } else if body_line.starts_with("- ") {
        Style::default().fg(Color::Red)
    } else {
        Style::default().fg(Color::Gray)
    }
}

fn entry_lines(entry: &WorkspaceEntry, width: usize) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(Span::styled(
        truncate_with_ellipsis(&entry.title, width),
        title_style(entry.kind),
    ))];
    if !entry.body.is_empty() {
        for raw in entry.body.lines() {
            let style = body_style(raw);
            lines.extend(
                wrap_text(raw, width)
                    .into_iter()
                    .map(|line| Line::from(Span::styled(line, style))),
            );
        }
    }
    lines
}

pub fn workspace_lines(state: &WorkspaceState, width: usize) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for (i, entry) in state.entries().iter().enumerate() {
        if i > 0 {
            lines.push(Line::default());
        }
        lines.extend(entry_lines(entry, width));
    }
    lines
}

pub fn render_workspace(state: &WorkspaceState, frame: &mut Frame, area: Rect) {
    if area.width == 0 || area.height == 0 {
        return;
    }
    let block = Block::default()
        .borders(Borders::TOP)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Line::from(Span::styled(
            " Workspace ",
            Style::default().fg(Color::Gray),
        )));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let width = inner.width.saturating_sub(1) as usize;
    let lines = workspace_lines(state, width.max(1));
    let visible = visible_window(lines, inner.height as usize, state.scroll_offset());
    let content = Rect {
        x: inner.x + 1.min(inner.width),
        width: inner.width.saturating_sub(1),
        ..inner
    };
    frame.render_widget(Paragraph::new(visible), content);
}
