//! Conversation flow: state machine, events, and the engine driving them.

pub mod engine;
pub mod event;
pub mod state;

pub use engine::FlowEngine;
pub use event::Event;
pub use state::FlowState;

/// Chat identity of the user an event came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRef {
    /// Stable user identifier (numeric chat user id as a string).
    pub id: String,
    pub username: Option<String>,
    pub full_name: Option<String>,
}

impl UserRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: None,
            full_name: None,
        }
    }

    /// "@handle", full name, or the raw id — for lead summaries.
    pub fn display(&self) -> String {
        match (&self.username, &self.full_name) {
            (Some(u), Some(n)) => format!("@{u} | {n}"),
            (Some(u), None) => format!("@{u}"),
            (None, Some(n)) => n.clone(),
            (None, None) => self.id.clone(),
        }
    }
}
