//! Wire schema shared by the OH client crates.
//!
//! - `event`: opaque event records as delivered by the backend stream
//! - `action`: the closed action union keyed by `(source, action)`

pub mod action;
pub mod event;

pub use action::{Action, ActionEvent, ActionKind};
pub use event::{EventRecord, EventSource, Observation};
