//! Transcript cells and their line layout.

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use unicode_width::UnicodeWidthStr;

use crate::common::text::wrap_text;

const USER_PREFIX: &str = "│ ";
const ASSISTANT_PREFIX: &str = "  ";
const SYSTEM_PREFIX: &str = "• ";
const ERROR_PREFIX: &str = "! ";

/// One entry in the chat transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryCell {
    User { content: String },
    Assistant { content: String },
    System { content: String },
    Error {
        message: String,
        msg_id: Option<String>,
    },
}

impl HistoryCell {
    pub fn user(content: impl Into<String>) -> Self {
        Self::User {
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::Assistant {
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::System {
            content: content.into(),
        }
    }

    pub fn error(message: impl Into<String>, msg_id: Option<String>) -> Self {
        Self::Error {
            message: message.into(),
            msg_id,
        }
    }

    fn parts(&self) -> (&'static str, Style, Style, String) {
        match self {
            Self::User { content } => (
                USER_PREFIX,
                Style::default().fg(Color::Cyan),
                Style::default().add_modifier(Modifier::ITALIC),
                content.clone(),
            ),
            Self::Assistant { content } => (
                ASSISTANT_PREFIX,
                Style::default(),
                Style::default(),
                content.clone(),
            ),
            Self::System { content } => (
                SYSTEM_PREFIX,
                Style::default().fg(Color::DarkGray),
                Style::default().fg(Color::DarkGray),
                content.clone(),
            ),
            Self::Error { message, msg_id } => {
                let text = match msg_id {
                    Some(id) => format!("{message} ({id})"),
                    None => message.clone(),
                };
                (
                    ERROR_PREFIX,
                    Style::default().fg(Color::Red),
                    Style::default().fg(Color::Red),
                    text,
                )
            }
        }
    }

    /// Lays the cell out for `width` columns, prefix included.
    pub fn display_lines(&self, width: usize) -> Vec<Line<'static>> {
        let (prefix, prefix_style, text_style, text) = self.parts();
        let content_width = width.saturating_sub(prefix.width()).max(1);
        let continuation = " ".repeat(prefix.width());
        wrap_text(text.trim_end(), content_width)
            .into_iter()
            .enumerate()
            .map(|(i, line)| {
                let lead = if i == 0 {
                    prefix.to_string()
                } else {
                    continuation.clone()
                };
                Line::from(vec![
                    Span::styled(lead, prefix_style),
                    Span::styled(line, text_style),
                ])
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(lines: &[Line<'_>]) -> Vec<String> {
        lines.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_user_cell_wraps_under_prefix() {
        let cell = HistoryCell::user("hello there world");
        assert_eq!(
            plain(&cell.display_lines(13)),
            vec!["│ hello there", "  world"]
        );
    }

    #[test]
    fn test_error_cell_shows_msg_id() {
        let cell = HistoryCell::error("Agent crashed", Some("STATUS$ERROR".to_string()));
        assert_eq!(
            plain(&cell.display_lines(80)),
            vec!["! Agent crashed (STATUS$ERROR)"]
        );
    }
}
