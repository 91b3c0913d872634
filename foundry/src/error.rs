//! Commands rejected at the interface boundary.

use thiserror::Error;

use crate::core::types::Status;

/// A command the session refused. Rejections never change session state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// `submit_intent` with empty or whitespace-only text.
    #[error("intent must not be empty")]
    EmptyIntent,
    /// `request_revision` with empty or whitespace-only feedback.
    #[error("revision feedback must not be empty")]
    EmptyFeedback,
    /// `begin_processing` before an intent was submitted.
    #[error("no intent submitted")]
    MissingIntent,
    /// `edit_draft` with an empty title or section.
    #[error("edited draft has empty fields: {}", .fields.join(", "))]
    BlankDraft { fields: Vec<&'static str> },
    /// The command is not accepted in the current status.
    #[error("{command} is not allowed while session is {}", .status.as_str())]
    InvalidStatus {
        command: &'static str,
        status: Status,
    },
}
