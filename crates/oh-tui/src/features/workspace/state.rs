//! Workspace panel state: what the agent did and what came back.

use oh_types::{Action, EventRecord};
use serde_json::Value;

/// Observations that never show up in the workspace.
const HIDDEN_OBSERVATIONS: &[&str] = &["error", "agent_state_changed", "null"];

/// Maximum body lines kept per entry.
const MAX_BODY_LINES: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Command,
    IPython,
    Read,
    Write,
    Edit,
    Browse,
    Output,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceEntry {
    pub kind: EntryKind,
    pub title: String,
    pub body: String,
}

impl WorkspaceEntry {
    fn new(kind: EntryKind, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            body: clip_lines(&body.into(), MAX_BODY_LINES),
        }
    }
}

fn clip_lines(text: &str, max: usize) -> String {
    let total = text.lines().count();
    if total <= max {
        return text.to_string();
    }
    let mut clipped: Vec<&str> = text.lines().take(max).collect();
    let more = format!("… {} more lines", total - max);
    clipped.push(&more);
    clipped.join("\n")
}

fn edit_body(args: &oh_types::action::FileEditArgs) -> String {
    match (&args.old_str, &args.new_str) {
        (Some(old), Some(new)) => {
            let removed = old.lines().map(|l| format!("- {l}"));
            let added = new.lines().map(|l| format!("+ {l}"));
            removed.chain(added).collect::<Vec<_>>().join("\n")
        }
        _ => args
            .file_text
            .clone()
            .or_else(|| args.content.clone())
            .unwrap_or_default(),
    }
}

/// Builds the workspace entry for an event, if it has one.
pub fn entry_for_event(record: &EventRecord) -> Option<WorkspaceEntry> {
    if let Some(event) = record.action() {
        return match event.action {
            Action::Command(args) if !args.hidden => Some(WorkspaceEntry::new(
                EntryKind::Command,
                format!("$ {}", args.command),
                "",
            )),
            Action::IPython(args) => {
                Some(WorkspaceEntry::new(EntryKind::IPython, "ipython", args.code))
            }
            Action::FileRead(args) => Some(WorkspaceEntry::new(
                EntryKind::Read,
                format!("read {}", args.path),
                "",
            )),
            Action::FileWrite(args) => Some(WorkspaceEntry::new(
                EntryKind::Write,
                format!("write {}", args.path),
                args.content,
            )),
            Action::FileEdit(ref args) => Some(WorkspaceEntry::new(
                EntryKind::Edit,
                format!("edit {}", args.path),
                edit_body(args),
            )),
            Action::Browse(args) => Some(WorkspaceEntry::new(
                EntryKind::Browse,
                format!("browse {}", args.url),
                "",
            )),
            Action::BrowseInteractive(args) => Some(WorkspaceEntry::new(
                EntryKind::Browse,
                "browse (interactive)",
                args.browser_actions,
            )),
            _ => None,
        };
    }

    let observation = record.observation()?;
    if HIDDEN_OBSERVATIONS.contains(&observation.tag) || observation.content.trim().is_empty() {
        return None;
    }
    let exit_code = observation
        .extras
        .and_then(|extras| extras.get("exit_code"))
        .and_then(Value::as_i64);
    let title = match exit_code {
        Some(code) => format!("{} (exit {code})", observation.tag),
        None => observation.tag.to_string(),
    };
    Some(WorkspaceEntry::new(
        EntryKind::Output,
        title,
        observation.content,
    ))
}

/// Entries in arrival order, scroll counted up from the bottom.
#[derive(Debug, Default)]
pub struct WorkspaceState {
    entries: Vec<WorkspaceEntry>,
    scroll_offset: usize,
}

impl WorkspaceState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[WorkspaceEntry] {
        &self.entries
    }

    pub fn push(&mut self, entry: WorkspaceEntry) {
        self.entries.push(entry);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.scroll_offset = 0;
    }

    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.scroll_offset = self.scroll_offset.saturating_add(lines);
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(lines);
    }
}
