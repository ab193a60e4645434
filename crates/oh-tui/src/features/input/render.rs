//! Prompt input rendering.

use ratatui::Frame;
use ratatui::layout::{Position, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use unicode_width::UnicodeWidthChar;

use super::state::InputState;

/// Rows of text shown before the input scrolls.
const MAX_INPUT_ROWS: u16 = 6;

/// Splits text into rows of at most `width` columns, hard-wrapping.
///
/// Returns the rows and the `(row, column)` of the cursor.
fn layout_rows(text: &str, cursor: usize, width: usize) -> (Vec<String>, (usize, usize)) {
    let width = width.max(1);
    let mut rows = vec![String::new()];
    let mut col = 0;
    let mut cursor_at = (0, 0);
    for (i, ch) in text.chars().enumerate() {
        if i == cursor {
            cursor_at = (rows.len() - 1, col);
        }
        if ch == '\n' {
            rows.push(String::new());
            col = 0;
            continue;
        }
        let w = ch.width().unwrap_or(0);
        if col + w > width {
            rows.push(String::new());
            col = 0;
        }
        if let Some(row) = rows.last_mut() {
            row.push(ch);
        }
        col += w;
    }
    if cursor >= text.chars().count() {
        if col >= width {
            rows.push(String::new());
            col = 0;
        }
        cursor_at = (rows.len() - 1, col);
    }
    (rows, cursor_at)
}

/// Height of the input box (borders included) for the given width.
pub fn input_height(input: &InputState, width: u16) -> u16 {
    let inner = width.saturating_sub(2) as usize;
    let (rows, _) = layout_rows(input.text(), input.cursor(), inner);
    (rows.len() as u16).clamp(1, MAX_INPUT_ROWS) + 2
}

pub fn render_input(input: &InputState, frame: &mut Frame, area: Rect, focused_hint: &str) {
    if area.width < 3 || area.height < 3 {
        return;
    }
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title_bottom(Line::from(Span::styled(
            focused_hint.to_string(),
            Style::default().fg(Color::DarkGray),
        )));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let (rows, (cursor_row, cursor_col)) =
        layout_rows(input.text(), input.cursor(), inner.width as usize);
    let visible = inner.height as usize;
    let first = (cursor_row + 1).saturating_sub(visible);
    let lines: Vec<Line<'static>> = rows
        .into_iter()
        .skip(first)
        .take(visible)
        .map(Line::from)
        .collect();
    frame.render_widget(Paragraph::new(lines), inner);

    frame.set_cursor_position(Position::new(
        inner.x + cursor_col as u16,
        inner.y + (cursor_row - first) as u16,
    ));
}
