//! Action schema.
//!
//! Actions are operations initiated by the user or the agent. On the wire an
//! action is an object tagged by `source` and `action`, with kind-specific
//! fields under `args`:
//!
//! ```json
//! {"id": 7, "source": "agent", "message": "Running command: ls",
//!  "timestamp": "...", "action": "run", "args": {"command": "ls", "thought": ""}}
//! ```
//!
//! The union is closed: a `(source, action)` pair not listed here decodes to
//! `None` and is ignored by callers.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::event::EventSource;

/// The `action` tag values understood by this client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Message,
    Run,
    RunIpython,
    Read,
    Write,
    Edit,
    Finish,
    Delegate,
    Browse,
    BrowseInteractive,
    Reject,
}

impl ActionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::Message => "message",
            ActionKind::Run => "run",
            ActionKind::RunIpython => "run_ipython",
            ActionKind::Read => "read",
            ActionKind::Write => "write",
            ActionKind::Edit => "edit",
            ActionKind::Finish => "finish",
            ActionKind::Delegate => "delegate",
            ActionKind::Browse => "browse",
            ActionKind::BrowseInteractive => "browse_interactive",
            ActionKind::Reject => "reject",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Some(match tag {
            "message" => ActionKind::Message,
            "run" => ActionKind::Run,
            "run_ipython" => ActionKind::RunIpython,
            "read" => ActionKind::Read,
            "write" => ActionKind::Write,
            "edit" => ActionKind::Edit,
            "finish" => ActionKind::Finish,
            "delegate" => ActionKind::Delegate,
            "browse" => ActionKind::Browse,
            "browse_interactive" => ActionKind::BrowseInteractive,
            "reject" => ActionKind::Reject,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserMessageArgs {
    pub content: String,
    pub image_urls: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantMessageArgs {
    pub thought: String,
    pub image_urls: Vec<String>,
    pub wait_for_response: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandArgs {
    pub command: String,
    pub thought: String,
    pub hidden: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmation_state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_risk: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IPythonArgs {
    pub code: String,
    pub thought: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kernel_init_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmation_state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_risk: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileReadArgs {
    pub path: String,
    pub thought: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view_range: Option<Vec<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impl_source: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileWriteArgs {
    pub path: String,
    pub content: String,
    pub thought: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileEditArgs {
    pub path: String,
    pub thought: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_str: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_str: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insert_line: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impl_source: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinishArgs {
    pub outputs: Map<String, Value>,
    pub thought: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DelegateArgs {
    pub agent: String,
    pub inputs: Map<String, Value>,
    pub thought: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowseArgs {
    pub url: String,
    pub thought: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowseInteractiveArgs {
    pub browser_actions: String,
    pub thought: String,
    pub browsergym_send_msg_to_user: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RejectArgs {
    pub thought: String,
}

/// A user- or agent-initiated operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    UserMessage(UserMessageArgs),
    AssistantMessage(AssistantMessageArgs),
    Command(CommandArgs),
    IPython(IPythonArgs),
    FileRead(FileReadArgs),
    FileWrite(FileWriteArgs),
    FileEdit(FileEditArgs),
    Finish(FinishArgs),
    Delegate(DelegateArgs),
    Browse(BrowseArgs),
    BrowseInteractive(BrowseInteractiveArgs),
    Reject(RejectArgs),
}

fn decode<T: DeserializeOwned>(args: Value) -> Option<T> {
    // Absent args behave like an empty object.
    let args = if args.is_null() {
        Value::Object(Map::new())
    } else {
        args
    };
    serde_json::from_value(args).ok()
}

fn encode<T: Serialize>(args: &T) -> Value {
    serde_json::to_value(args).unwrap_or_else(|_| Value::Object(Map::new()))
}

impl Action {
    /// Builds a user chat message.
    pub fn user_message(content: impl Into<String>) -> Self {
        Action::UserMessage(UserMessageArgs {
            content: content.into(),
            image_urls: Vec::new(),
        })
    }

    /// Decodes an action from its `(source, action)` key and raw args.
    pub fn decode(source: EventSource, tag: &str, args: Value) -> Option<Self> {
        let kind = ActionKind::from_tag(tag)?;
        match (source, kind) {
            (EventSource::User, ActionKind::Message) => decode(args).map(Action::UserMessage),
            (EventSource::Agent, ActionKind::Message) => {
                decode(args).map(Action::AssistantMessage)
            }
            (EventSource::Agent, ActionKind::Run) => decode(args).map(Action::Command),
            (EventSource::Agent, ActionKind::RunIpython) => decode(args).map(Action::IPython),
            (EventSource::Agent, ActionKind::Read) => decode(args).map(Action::FileRead),
            (EventSource::Agent, ActionKind::Write) => decode(args).map(Action::FileWrite),
            (EventSource::Agent, ActionKind::Edit) => decode(args).map(Action::FileEdit),
            (EventSource::Agent, ActionKind::Finish) => decode(args).map(Action::Finish),
            (EventSource::Agent, ActionKind::Delegate) => decode(args).map(Action::Delegate),
            (EventSource::Agent, ActionKind::Browse) => decode(args).map(Action::Browse),
            (EventSource::Agent, ActionKind::BrowseInteractive) => {
                decode(args).map(Action::BrowseInteractive)
            }
            (EventSource::Agent, ActionKind::Reject) => decode(args).map(Action::Reject),
            _ => None,
        }
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            Action::UserMessage(_) | Action::AssistantMessage(_) => ActionKind::Message,
            Action::Command(_) => ActionKind::Run,
            Action::IPython(_) => ActionKind::RunIpython,
            Action::FileRead(_) => ActionKind::Read,
            Action::FileWrite(_) => ActionKind::Write,
            Action::FileEdit(_) => ActionKind::Edit,
            Action::Finish(_) => ActionKind::Finish,
            Action::Delegate(_) => ActionKind::Delegate,
            Action::Browse(_) => ActionKind::Browse,
            Action::BrowseInteractive(_) => ActionKind::BrowseInteractive,
            Action::Reject(_) => ActionKind::Reject,
        }
    }

    pub fn source(&self) -> EventSource {
        match self {
            Action::UserMessage(_) => EventSource::User,
            _ => EventSource::Agent,
        }
    }

    /// The agent's reasoning attached to the action, if any.
    pub fn thought(&self) -> Option<&str> {
        let thought = match self {
            Action::UserMessage(_) => return None,
            Action::AssistantMessage(a) => &a.thought,
            Action::Command(a) => &a.thought,
            Action::IPython(a) => &a.thought,
            Action::FileRead(a) => &a.thought,
            Action::FileWrite(a) => &a.thought,
            Action::FileEdit(a) => &a.thought,
            Action::Finish(a) => &a.thought,
            Action::Delegate(a) => &a.thought,
            Action::Browse(a) => &a.thought,
            Action::BrowseInteractive(a) => &a.thought,
            Action::Reject(a) => &a.thought,
        };
        let thought = thought.trim();
        (!thought.is_empty()).then_some(thought)
    }

    /// Serializes the kind-specific fields.
    pub fn args(&self) -> Value {
        match self {
            Action::UserMessage(a) => encode(a),
            Action::AssistantMessage(a) => encode(a),
            Action::Command(a) => encode(a),
            Action::IPython(a) => encode(a),
            Action::FileRead(a) => encode(a),
            Action::FileWrite(a) => encode(a),
            Action::FileEdit(a) => encode(a),
            Action::Finish(a) => encode(a),
            Action::Delegate(a) => encode(a),
            Action::Browse(a) => encode(a),
            Action::BrowseInteractive(a) => encode(a),
            Action::Reject(a) => encode(a),
        }
    }

    /// Outbound payload for `oh_action`: `{"action": ..., "args": {...}}`.
    pub fn to_payload(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("action".into(), Value::String(self.kind().as_str().into()));
        obj.insert("args".into(), self.args());
        Value::Object(obj)
    }
}

/// An action together with its event envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionEvent {
    pub id: Option<i64>,
    pub message: String,
    pub timestamp: Option<String>,
    pub action: Action,
}

#[derive(Deserialize)]
struct RawActionEvent {
    #[serde(default)]
    id: Option<Value>,
    source: EventSource,
    action: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(default)]
    args: Value,
}

impl ActionEvent {
    /// Decodes an action event from a raw record. Returns `None` for
    /// observations, unknown kinds and malformed payloads.
    pub fn from_value(value: &Value) -> Option<Self> {
        let raw = RawActionEvent::deserialize(value).ok()?;
        let action = Action::decode(raw.source, &raw.action, raw.args)?;
        let id = match raw.id {
            Some(Value::Number(n)) => n.as_i64(),
            Some(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        };
        Some(Self {
            id,
            message: raw.message,
            timestamp: raw.timestamp,
            action,
        })
    }

    pub fn source(&self) -> EventSource {
        self.action.source()
    }

    /// Re-encodes the envelope with the same field names it was read from.
    pub fn to_value(&self) -> Value {
        let mut obj = Map::new();
        if let Some(id) = self.id {
            obj.insert("id".into(), Value::from(id));
        }
        obj.insert(
            "source".into(),
            Value::String(self.source().as_str().into()),
        );
        obj.insert("message".into(), Value::String(self.message.clone()));
        if let Some(ts) = &self.timestamp {
            obj.insert("timestamp".into(), Value::String(ts.clone()));
        }
        obj.insert(
            "action".into(),
            Value::String(self.action.kind().as_str().into()),
        );
        obj.insert("args".into(), self.action.args());
        Value::Object(obj)
    }
}
