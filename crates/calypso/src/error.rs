//! Error types for Calypso transactions

use bytes::Bytes;
use calypso_apdu_core::{CommandError, ResponseError, StatusWord, TransportError};
use thiserror::Error;

/// Result type for Calypso operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for Calypso operations
#[derive(Debug, Error)]
pub enum Error {
    /// Builder precondition violated, nothing was sent
    #[error("Inconsistent command: {0}")]
    InconsistentCommand(String),

    /// Response frame or payload does not have the expected layout
    #[error("Malformed response: {0}")]
    MalformedResponse(#[from] ResponseError),

    /// Status word absent from the command's status table
    #[error("{command}: unexpected status {status}")]
    UnexpectedStatus {
        /// Command name
        command: &'static str,
        /// Status word returned by the card
        status: StatusWord,
        /// Raw response, status word included
        response: Bytes,
    },

    /// Known failure status returned by the card
    #[error("{command}: {message} ({status})")]
    CommandFailed {
        /// Command name
        command: &'static str,
        /// Status word returned by the card
        status: StatusWord,
        /// Meaning of the status word for this command
        message: &'static str,
    },

    /// No ATR or AID match during selection
    #[error("Selection did not match the card")]
    SelectionMismatch,

    /// Application type byte outside every known revision range
    #[error("Unknown revision for application type {0:#04X}")]
    UnknownRevision(u8),

    /// Operation issued out of the session state machine order
    #[error("Session protocol error: {0}")]
    SessionProtocol(&'static str),

    /// The SAM rejected the card's session signature
    #[error("Card session signature rejected by the SAM")]
    SecurityAuthenticationFailure,

    /// Failure reported by the reader collaborator
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// FCI returned by the card cannot be decoded
    #[error("Invalid FCI: {0}")]
    InvalidFci(String),

    /// ATR filter is not a valid regular expression
    #[error("Invalid ATR regex: {0}")]
    InvalidAtrRegex(#[from] regex::Error),
}

impl Error {
    /// Create an inconsistent command error
    pub fn inconsistent(message: impl Into<String>) -> Self {
        Self::InconsistentCommand(message.into())
    }

    /// Create a malformed response error from a payload layout problem
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse(ResponseError::parse(message))
    }

    /// Whether the session integrity can no longer be trusted
    pub const fn is_security_failure(&self) -> bool {
        matches!(self, Self::SecurityAuthenticationFailure)
    }

    /// Status word carried by a card-side failure
    pub const fn status(&self) -> Option<StatusWord> {
        match self {
            Self::UnexpectedStatus { status, .. } | Self::CommandFailed { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }
}

impl From<CommandError> for Error {
    fn from(error: CommandError) -> Self {
        Self::InconsistentCommand(error.to_string())
    }
}

impl From<iso7816_tlv::TlvError> for Error {
    fn from(error: iso7816_tlv::TlvError) -> Self {
        Self::InvalidFci(error.to_string())
    }
}
