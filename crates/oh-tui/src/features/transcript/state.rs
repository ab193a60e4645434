//! Transcript state: cells plus a scroll position.

use super::cell::HistoryCell;

/// Chat transcript. The scroll offset counts lines up from the bottom, so
/// zero follows the latest output.
#[derive(Debug, Default)]
pub struct TranscriptState {
    cells: Vec<HistoryCell>,
    scroll_offset: usize,
}

impl TranscriptState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cells(&self) -> &[HistoryCell] {
        &self.cells
    }

    pub fn push_cell(&mut self, cell: HistoryCell) {
        self.cells.push(cell);
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.scroll_offset = 0;
    }

    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    pub fn is_following(&self) -> bool {
        self.scroll_offset == 0
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.scroll_offset = self.scroll_offset.saturating_add(lines);
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(lines);
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll_offset = 0;
    }
}
