//! UI-agnostic conversation types
//!
//! Shared between the client core, the terminal front end and the `ask` command.

/// A single conversational turn as rendered in a bubble
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub text: String,
    pub role: Role,
}

/// Who produced a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Human,
    Ai,
}

impl Message {
    pub fn human(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            role: Role::Human,
        }
    }

    pub fn ai(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            role: Role::Ai,
        }
    }
}
