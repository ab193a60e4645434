//! Chat transcript feature slice.
//!
//! - `cell.rs`: `HistoryCell` and its wrapped line layout
//! - `state.rs`: cells plus scroll position
//! - `update.rs`: event records and chat errors to cells
//! - `render.rs`: bottom-aligned, scrollable rendering

mod cell;
mod render;
mod state;
mod update;

pub use cell::HistoryCell;
pub use render::{TRANSCRIPT_MARGIN, render_transcript, transcript_lines, visible_window};
pub use state::TranscriptState;
pub use update::{cell_for_chat_error, cells_for_event};
