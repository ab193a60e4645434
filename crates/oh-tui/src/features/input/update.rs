//! Key handling for the prompt input.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use oh_types::Action;

use super::state::InputState;
use crate::effects::UiEffect;

/// Handles a key aimed at the prompt. Enter submits the prompt as a user
/// message action (or `/conversation ID` to switch); Ctrl+C and Ctrl+D on an
/// empty prompt quit.
pub fn handle_main_key(input: &mut InputState, key: KeyEvent) -> Vec<UiEffect> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('c') if ctrl => {
            if input.is_empty() {
                vec![UiEffect::Quit]
            } else {
                input.clear();
                vec![]
            }
        }
        KeyCode::Char('d') if ctrl && input.is_empty() => vec![UiEffect::Quit],
        KeyCode::Char('u') if ctrl => {
            input.clear();
            vec![]
        }
        KeyCode::Char('a') if ctrl => {
            input.move_home();
            vec![]
        }
        KeyCode::Char('e') if ctrl => {
            input.move_end();
            vec![]
        }
        KeyCode::Char(ch) if !ctrl => {
            input.insert_char(ch);
            vec![]
        }
        KeyCode::Enter if key.modifiers.contains(KeyModifiers::SHIFT) => {
            input.insert_char('\n');
            vec![]
        }
        KeyCode::Enter => match input.take_submission() {
            Some(text) => vec![submission_effect(text)],
            None => vec![],
        },
        KeyCode::Esc => {
            input.clear();
            vec![]
        }
        KeyCode::Backspace => {
            input.backspace();
            vec![]
        }
        KeyCode::Delete => {
            input.delete();
            vec![]
        }
        KeyCode::Left => {
            input.move_left();
            vec![]
        }
        KeyCode::Right => {
            input.move_right();
            vec![]
        }
        KeyCode::Home => {
            input.move_home();
            vec![]
        }
        KeyCode::End => {
            input.move_end();
            vec![]
        }
        KeyCode::Up => {
            input.history_prev();
            vec![]
        }
        KeyCode::Down => {
            input.history_next();
            vec![]
        }
        _ => vec![],
    }
}

/// Prefix of the command that switches to another conversation.
const SWITCH_COMMAND: &str = "/conversation";

fn submission_effect(text: String) -> UiEffect {
    if let Some(rest) = text.strip_prefix(SWITCH_COMMAND)
        && (rest.is_empty() || rest.starts_with(char::is_whitespace))
    {
        return UiEffect::SwitchConversation(rest.trim().to_string());
    }
    UiEffect::SendAction(Action::user_message(text).to_payload())
}

/// Inserts pasted text at the cursor.
pub fn handle_paste(input: &mut InputState, text: &str) {
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
    input.insert_str(&normalized);
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(ch: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(ch), KeyModifiers::CONTROL)
    }

    #[test]
    fn test_enter_sends_user_message() {
        let mut input = InputState::new();
        for ch in "hi".chars() {
            handle_main_key(&mut input, key(KeyCode::Char(ch)));
        }
        let effects = handle_main_key(&mut input, key(KeyCode::Enter));
        assert!(matches!(
            effects.as_slice(),
            [UiEffect::SendAction(payload)]
                if *payload == json!({"action": "message", "args": {"content": "hi", "image_urls": []}})
        ));
        assert!(input.is_empty());
    }

    #[test]
    fn test_conversation_command_switches() {
        assert_eq!(
            submission_effect("/conversation  abc ".trim().to_string()),
            UiEffect::SwitchConversation("abc".to_string())
        );
        assert!(matches!(
            submission_effect("/conversations are fun".to_string()),
            UiEffect::SendAction(_)
        ));
    }

    #[test]
    fn test_ctrl_c_clears_then_quits() {
        let mut input = InputState::new();
        handle_main_key(&mut input, key(KeyCode::Char('x')));
        assert!(handle_main_key(&mut input, ctrl('c')).is_empty());
        assert!(input.is_empty());
        assert!(matches!(
            handle_main_key(&mut input, ctrl('c')).as_slice(),
            [UiEffect::Quit]
        ));
    }

    #[test]
    fn test_paste_normalizes_newlines() {
        let mut input = InputState::new();
        handle_paste(&mut input, "a\r\nb\rc");
        assert_eq!(input.text(), "a\nb\nc");
    }
}
