//! Full-screen TUI for OH: chat and agent workspace side by side.

pub mod common;
pub mod effects;
pub mod events;
pub mod features;
pub mod render;
pub mod runtime;
pub mod state;
pub mod terminal;
pub mod update;

use std::io::{IsTerminal, Write, stderr};

use anyhow::Result;
pub use features::{input, split_pane, statusline, transcript, workspace};
use oh_core::config::Config;
use oh_core::endpoint::Endpoint;
pub use runtime::TuiRuntime;

use crate::transcript::HistoryCell;

/// Runs the interactive chat loop for one conversation.
pub async fn run_interactive_chat(
    config: &Config,
    endpoint: Endpoint,
    conversation_id: &str,
) -> Result<()> {
    // Chat mode requires a terminal to render the TUI
    if !stderr().is_terminal() {
        anyhow::bail!(
            "Chat mode requires a terminal.\n\
             Use `oh events --conversation <ID>` for a headless event stream."
        );
    }

    let mut err = stderr();
    writeln!(err, "OH Chat")?;
    writeln!(err, "Backend: {endpoint}")?;
    writeln!(err, "Conversation: {conversation_id}")?;
    err.flush()?;

    let mut runtime = TuiRuntime::new(config, endpoint, conversation_id)?;

    let config_path = oh_core::config::paths::config_path();
    if config_path.exists() {
        runtime
            .state
            .tui
            .transcript
            .push_cell(HistoryCell::system(format!(
                "Config file: {}",
                config_path.display()
            )));
    }

    runtime.run()?;
    drop(runtime);

    writeln!(stderr(), "Goodbye!")?;
    Ok(())
}
