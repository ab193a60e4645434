//! Split handle rendering.

use oh_core::config::Orientation;
use ratatui::Frame;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};

use super::state::{CollapseMode, SplitPane};

fn glyphs(orientation: Orientation) -> (&'static str, &'static str, &'static str) {
    match orientation {
        // (bar, collapse, expand)
        Orientation::Horizontal => ("│", "‹", "›"),
        Orientation::Vertical => ("─", "▴", "▾"),
    }
}

/// Draws the handle bar and its collapse/expand glyphs.
pub fn render_handle(pane: &SplitPane, frame: &mut Frame, handle: Rect) {
    if handle.width == 0 || handle.height == 0 {
        return;
    }
    draw_handle(pane, frame.buffer_mut(), handle);
}

fn draw_handle(pane: &SplitPane, buf: &mut Buffer, handle: Rect) {
    let (bar, collapse, expand) = glyphs(pane.orientation());
    let bar_style = if pane.is_dragging() {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    for y in handle.top()..handle.bottom() {
        for x in handle.left()..handle.right() {
            buf[(x, y)].set_symbol(bar).set_style(bar_style);
        }
    }

    let Some((collapse_at, expand_at)) = pane.glyph_positions(handle) else {
        return;
    };
    let glyph_style = Style::default().fg(Color::Gray);
    // Dim the glyph whose action would only return to split.
    let collapse_style = if pane.mode() == CollapseMode::Collapsed {
        bar_style
    } else {
        glyph_style
    };
    let expand_style = if pane.mode() == CollapseMode::Filled {
        bar_style
    } else {
        glyph_style
    };
    buf[collapse_at]
        .set_symbol(collapse)
        .set_style(collapse_style);
    buf[expand_at].set_symbol(expand).set_style(expand_style);
}
