//! Chat command handler.

use anyhow::{Context, Result};
use oh_core::config::{self, paths};
use oh_core::endpoint::Endpoint;
use oh_core::logging;

pub async fn run(
    config: &config::Config,
    endpoint: Endpoint,
    conversation_id: Option<&str>,
) -> Result<()> {
    let Some(conversation_id) = conversation_id.map(str::trim).filter(|id| !id.is_empty()) else {
        anyhow::bail!(
            "No conversation selected.\n\
             Pass `--conversation <ID>` or set OH_CONVERSATION_ID."
        );
    };

    // The TUI owns the terminal, so logs go to a file.
    let _guard = logging::init_file(&paths::log_dir(), &config.log.level)
        .context("initialize logging")?;

    oh_tui::run_interactive_chat(config, endpoint, conversation_id)
        .await
        .context("interactive chat failed")?;

    Ok(())
}
