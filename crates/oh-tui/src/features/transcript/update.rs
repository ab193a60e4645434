//! Maps session output to transcript cells.

use oh_core::session::ChatError;
use oh_types::{Action, EventRecord};

use super::cell::HistoryCell;

/// Observation tag for errors reported by the agent runtime.
const ERROR_OBSERVATION: &str = "error";

/// Builds the chat cells for one inbound event.
///
/// Agent reasoning lands in the chat; the operation itself goes to the
/// workspace panel.
pub fn cells_for_event(record: &EventRecord) -> Vec<HistoryCell> {
    if let Some(event) = record.action() {
        let message = event.message.trim();
        return match &event.action {
            Action::UserMessage(args) => vec![HistoryCell::user(args.content.clone())],
            Action::AssistantMessage(args) => {
                let text = if message.is_empty() {
                    args.thought.as_str()
                } else {
                    message
                };
                vec![HistoryCell::assistant(text)]
            }
            Action::Finish(_) => {
                let mut cells: Vec<HistoryCell> = event
                    .action
                    .thought()
                    .map(HistoryCell::assistant)
                    .into_iter()
                    .collect();
                cells.push(HistoryCell::system("Task finished"));
                cells
            }
            Action::Reject(_) => {
                let reason = event.action.thought().unwrap_or("no reason given");
                vec![HistoryCell::system(format!("Task rejected: {reason}"))]
            }
            Action::Delegate(args) => {
                let mut cells: Vec<HistoryCell> = event
                    .action
                    .thought()
                    .map(HistoryCell::assistant)
                    .into_iter()
                    .collect();
                cells.push(HistoryCell::system(format!("Delegating to {}", args.agent)));
                cells
            }
            _ => event
                .action
                .thought()
                .map(HistoryCell::assistant)
                .into_iter()
                .collect(),
        };
    }

    match record.observation() {
        Some(observation) if observation.tag == ERROR_OBSERVATION => {
            vec![HistoryCell::error(observation.content, None)]
        }
        _ => Vec::new(),
    }
}

pub fn cell_for_chat_error(error: &ChatError) -> HistoryCell {
    HistoryCell::error(error.message.clone(), error.msg_id.clone())
}

#[cfg(test)]
mod tests {
    use serde_json::{Map, json};

    use super::*;

    fn record(value: serde_json::Value) -> EventRecord {
        EventRecord::new(value)
    }

    #[test]
    fn test_user_and_assistant_messages() {
        let user = record(json!({
            "id": 1, "source": "user", "message": "fix it", "timestamp": "t",
            "action": "message", "args": {"content": "fix it"}
        }));
        assert_eq!(cells_for_event(&user), vec![HistoryCell::user("fix it")]);

        let agent = record(json!({
            "id": 2, "source": "agent", "message": "On it", "timestamp": "t",
            "action": "message", "args": {"thought": "internal"}
        }));
        assert_eq!(cells_for_event(&agent), vec![HistoryCell::assistant("On it")]);
    }

    #[test]
    fn test_command_shows_only_thought() {
        let run = record(json!({
            "id": 3, "source": "agent", "message": "Running", "timestamp": "t",
            "action": "run", "args": {"command": "ls", "thought": "List files"}
        }));
        assert_eq!(cells_for_event(&run), vec![HistoryCell::assistant("List files")]);

        let silent = record(json!({
            "id": 4, "source": "agent", "action": "run", "args": {"command": "ls"}
        }));
        assert!(cells_for_event(&silent).is_empty());
    }

    #[test]
    fn test_finish_and_error_observation() {
        let finish = record(json!({
            "id": 5, "source": "agent", "action": "finish", "args": {"outputs": {}}
        }));
        assert_eq!(
            cells_for_event(&finish),
            vec![HistoryCell::system("Task finished")]
        );

        let error = record(json!({
            "id": 6, "source": "agent", "observation": "error", "content": "boom"
        }));
        assert_eq!(cells_for_event(&error), vec![HistoryCell::error("boom", None)]);
    }

    #[test]
    fn test_unknown_records_are_skipped() {
        assert!(cells_for_event(&record(json!({"status_update": true}))).is_empty());
    }

    #[test]
    fn test_chat_error_cell() {
        let error = ChatError {
            message: "Agent crashed".to_string(),
            source: "websocket",
            msg_id: Some("X".to_string()),
            metadata: Map::new(),
        };
        assert_eq!(
            cell_for_chat_error(&error),
            HistoryCell::error("Agent crashed", Some("X".to_string()))
        );
    }
}
