//! DIGEST AUTHENTICATE command
//!
//! Asks the SAM to check the card signature against its own digest.

use bytes::Bytes;
use calypso_apdu_core::{Command, Response};

use crate::{
    Result,
    commands::{CommandKind, check_length},
    constants::ins,
    revision::SamRevision,
};

/// DIGEST AUTHENTICATE
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestAuthenticate {
    revision: SamRevision,
    signature: Bytes,
}

impl DigestAuthenticate {
    /// Create the command with the 4 or 8 byte card signature
    pub fn new(revision: SamRevision, signature: impl Into<Bytes>) -> Result<Self> {
        let signature = signature.into();
        check_length("card signature", &signature, &[4, 8])?;
        Ok(Self {
            revision,
            signature,
        })
    }

    /// Encode the frame
    pub fn build(&self) -> Result<Command> {
        Ok(Command::new_with_data(
            self.revision.cla(),
            ins::DIGEST_AUTHENTICATE,
            0x00,
            0x00,
            self.signature.clone(),
        )?)
    }

    /// Check the response, any failure meaning the signature was rejected
    pub fn parse(&self, response: &Response) -> Result<()> {
        CommandKind::DigestAuthenticate.descriptor().check(response, &[])
    }
}
