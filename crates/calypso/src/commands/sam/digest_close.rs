//! DIGEST CLOSE command
//!
//! Ends the digest and returns the terminal session signature.

use bytes::Bytes;
use calypso_apdu_core::{Command, Response};

use crate::{
    Error, Result,
    commands::CommandKind,
    constants::ins,
    revision::SamRevision,
};

/// DIGEST CLOSE
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DigestClose {
    revision: SamRevision,
    expected_length: u8,
}

impl DigestClose {
    /// Create the command for a 4 or 8 byte signature
    pub fn new(revision: SamRevision, expected_length: u8) -> Result<Self> {
        if expected_length != 4 && expected_length != 8 {
            return Err(Error::inconsistent(format!(
                "signature length must be 4 or 8, got {expected_length}"
            )));
        }
        Ok(Self {
            revision,
            expected_length,
        })
    }

    /// Encode the frame
    pub const fn build(&self) -> Command {
        Command::new_with_le(
            self.revision.cla(),
            ins::DIGEST_CLOSE,
            0x00,
            0x00,
            self.expected_length,
        )
    }

    /// Decode the terminal signature
    pub fn parse(&self, response: &Response) -> Result<Bytes> {
        CommandKind::DigestClose.descriptor().check(response, &[])?;
        let signature = response.payload_bytes();
        if signature.len() != usize::from(self.expected_length) {
            return Err(Error::malformed(format!(
                "expected a {} byte signature, got {}",
                self.expected_length,
                signature.len()
            )));
        }
        Ok(signature)
    }
}
