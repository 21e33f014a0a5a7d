//! Error types specific to APDU commands

/// Error raised while building an APDU command frame
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    /// Command frame shorter than the 4 byte header, or inconsistent Lc
    #[error("Invalid command length: {0}")]
    InvalidLength(usize),

    /// Data field does not fit in a short APDU
    #[error("Data too long: {0} bytes (max {1})")]
    DataTooLong(usize, usize),
}

impl CommandError {
    /// Create a data too long error
    pub const fn data_too_long(actual: usize, max: usize) -> Self {
        Self::DataTooLong(actual, max)
    }
}
