//! Error types specific to APDU responses

use super::status::StatusWord;

/// A status word that the caller did not accept
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Status error {status}: {}", describe(.message, .status))]
pub struct StatusError {
    /// Status word that caused the error
    pub status: StatusWord,
    /// Optional error message, defaults to the ISO description
    pub message: Option<&'static str>,
}

impl StatusError {
    /// Create a new status error
    pub const fn new(status: StatusWord) -> Self {
        Self {
            status,
            message: None,
        }
    }

    /// Create a new status error with a message
    pub const fn with_message(status: StatusWord, message: &'static str) -> Self {
        Self {
            status,
            message: Some(message),
        }
    }
}

fn describe(message: &Option<&'static str>, status: &StatusWord) -> &'static str {
    message.unwrap_or(status.description())
}

/// Error for APDU response decoding
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResponseError {
    /// Fewer than the two status bytes were received
    #[error("Incomplete response: {0} byte(s), expected at least 2")]
    Incomplete(usize),

    /// Response data does not have the expected layout
    #[error("Parse error: {0}")]
    Parse(String),

    /// Status error
    #[error(transparent)]
    Status(#[from] StatusError),
}

impl ResponseError {
    /// Create a parse error with a message
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Check if this error carries the given status word
    pub fn has_status(&self, sw: u16) -> bool {
        matches!(self, Self::Status(e) if e.status.to_u16() == sw)
    }
}
