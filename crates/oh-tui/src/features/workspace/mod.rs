//! Workspace panel: commands, file operations and their output.

mod render;
mod state;

pub use render::{render_workspace, workspace_lines};
pub use state::{EntryKind, WorkspaceEntry, WorkspaceState, entry_for_event};
