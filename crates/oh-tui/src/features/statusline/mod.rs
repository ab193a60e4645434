//! Status line feature slice.
//!
//! Shows the event-stream connection (with a spinner while replaying history
//! or reconnecting), the agent state, queued actions and the last event id.
//!
//! - `state.rs`: `SessionView`, the per-frame session snapshot
//! - `render.rs`: status line rendering

mod render;
mod state;

pub use render::render_status_line;
pub use state::SessionView;
