//! Transcript rendering.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use super::state::TranscriptState;

/// Horizontal padding on each side of the transcript.
pub const TRANSCRIPT_MARGIN: u16 = 1;

/// Lays out every cell for `width` columns, blank line between cells.
pub fn transcript_lines(state: &TranscriptState, width: usize) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for (i, cell) in state.cells().iter().enumerate() {
        if i > 0 {
            lines.push(Line::default());
        }
        lines.extend(cell.display_lines(width));
    }
    lines
}

/// Picks the visible window, bottom-aligned and clamped to the scroll range.
pub fn visible_window(
    lines: Vec<Line<'static>>,
    height: usize,
    scroll_offset: usize,
) -> Vec<Line<'static>> {
    let total = lines.len();
    if total <= height {
        let mut padded = vec![Line::default(); height - total];
        padded.extend(lines);
        return padded;
    }
    let max_offset = total - height;
    let start = max_offset - scroll_offset.min(max_offset);
    lines.into_iter().skip(start).take(height).collect()
}

pub fn render_transcript(state: &TranscriptState, frame: &mut Frame, area: Rect) {
    if area.width == 0 || area.height == 0 {
        return;
    }
    let inner = Rect {
        x: area.x + TRANSCRIPT_MARGIN.min(area.width),
        y: area.y,
        width: area.width.saturating_sub(TRANSCRIPT_MARGIN * 2),
        height: area.height,
    };

    if state.cells().is_empty() {
        let hint = Line::from(Span::styled(
            "Waiting for the conversation to load…",
            Style::default().fg(Color::DarkGray),
        ));
        frame.render_widget(Paragraph::new(hint), inner);
        return;
    }

    let lines = transcript_lines(state, inner.width as usize);
    let visible = visible_window(lines, inner.height as usize, state.scroll_offset());
    frame.render_widget(Paragraph::new(visible), inner);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::HistoryCell;

    #[test]
    fn test_visible_window_pads_short_content() {
        let lines = vec![Line::from("a"), Line::from("b")];
        let window = visible_window(lines, 4, 0);
        assert_eq!(window.len(), 4);
        assert_eq!(window[3].to_string(), "b");
    }

    #[test]
    fn test_visible_window_scrolls_from_bottom() {
        let lines: Vec<Line<'static>> = (0..10).map(|i| Line::from(i.to_string())).collect();
        let tail = visible_window(lines.clone(), 3, 0);
        assert_eq!(tail[2].to_string(), "9");
        let scrolled = visible_window(lines.clone(), 3, 2);
        assert_eq!(scrolled[2].to_string(), "7");
        let clamped = visible_window(lines, 3, 100);
        assert_eq!(clamped[0].to_string(), "0");
    }

    #[test]
    fn test_cells_are_separated() {
        let mut state = TranscriptState::new();
        state.push_cell(HistoryCell::system("one"));
        state.push_cell(HistoryCell::system("two"));
        let lines = transcript_lines(&state, 40);
        assert_eq!(lines.len(), 3);
        assert!(lines[1].to_string().is_empty());
    }
}
