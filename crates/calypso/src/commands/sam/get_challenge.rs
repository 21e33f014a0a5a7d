//! GET CHALLENGE command
//!
//! The SAM challenge becomes the terminal challenge of Open Secure Session.

use bytes::Bytes;
use calypso_apdu_core::{Command, Response};

use crate::{
    Error, Result,
    commands::CommandKind,
    constants::ins,
    revision::SamRevision,
};

/// GET CHALLENGE
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GetChallenge {
    revision: SamRevision,
    length: u8,
}

impl GetChallenge {
    /// Create the command for a 4 or 8 byte challenge
    pub fn new(revision: SamRevision, length: u8) -> Result<Self> {
        if length != 4 && length != 8 {
            return Err(Error::inconsistent(format!(
                "challenge length must be 4 or 8, got {length}"
            )));
        }
        Ok(Self { revision, length })
    }

    /// Encode the frame
    pub const fn build(&self) -> Command {
        Command::new_with_le(self.revision.cla(), ins::GET_CHALLENGE, 0x00, 0x00, self.length)
    }

    /// Decode the challenge
    pub fn parse(&self, response: &Response) -> Result<Bytes> {
        CommandKind::GetChallenge.descriptor().check(response, &[])?;
        let challenge = response.payload_bytes();
        if challenge.len() != usize::from(self.length) {
            return Err(Error::malformed(format!(
                "expected a {} byte challenge, got {}",
                self.length,
                challenge.len()
            )));
        }
        Ok(challenge)
    }
}
