//! Resizable split between the chat and workspace panels.
//!
//! - `state.rs`: `SplitPane` (size, drag, collapse mode, animation)
//! - `resize.rs`: trailing-edge debounce for terminal resizes
//! - `render.rs`: handle bar with collapse/expand glyphs

mod render;
mod resize;
mod state;

pub use render::render_handle;
pub use resize::{RESIZE_DEBOUNCE, ResizeDebouncer};
pub use state::{CollapseMode, HANDLE_SIZE, HandleHit, PaneConstraints, PaneLayout, SplitPane};
