//! Diagnostics produced by parsing and evaluation.
//!
//! Malformed input never raises out of `parse`; diagnostics are queued on the
//! calculator and drained by the caller.
use strum::{Display, EnumIs};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIs)]
pub enum MessageKind {
    Information,
    Warning,
    Error,
}

/// One queued diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    kind: MessageKind,
    text: String,
}

impl Message {
    pub fn new(kind: MessageKind, text: impl Into<String>) -> Message {
        Message {
            kind,
            text: text.into(),
        }
    }

    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl std::fmt::Display for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.text)
    }
}
