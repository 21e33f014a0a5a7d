//! Error types specific to card transport

/// Transport error type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// Connection error
    #[error("Failed to connect to card")]
    Connection,

    /// No card present in the reader
    #[error("No card present")]
    NoCard,

    /// Transmission error
    #[error("Failed to transmit data")]
    Transmission,

    /// Reader driver error (with code)
    #[error("Driver error code: {0}")]
    Driver(i32),

    /// Timeout error
    #[error("Operation timed out")]
    Timeout,

    /// Other error with message
    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Create a general other error
    pub fn other<S: Into<String>>(message: S) -> Self {
        Self::Other(message.into())
    }

    /// Whether the card is gone and the channel cannot be reused
    pub const fn is_card_lost(&self) -> bool {
        matches!(self, Self::Connection | Self::NoCard)
    }
}
