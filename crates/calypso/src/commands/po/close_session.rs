//! CLOSE SECURE SESSION command
//!
//! Carries the terminal signature and returns the low part of the card
//! signature, preceded by any postponed data. The abort form has no data at
//! all and closes the session without committing anything.

use bytes::Bytes;
use calypso_apdu_core::{Command, Response};

use crate::{
    Error, Result,
    commands::{CommandKind, check_length},
    constants::ins,
    revision::PoRevision,
};

/// Length of the card signature returned on close
pub const CARD_SIGNATURE_LENGTH: usize = 4;

/// CLOSE SECURE SESSION
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseSession {
    revision: PoRevision,
    ratification_requested: bool,
    signature: Option<Bytes>,
}

impl CloseSession {
    /// Create the closing command with the terminal signature (4 or 8 bytes)
    pub fn new(
        revision: PoRevision,
        ratification_requested: bool,
        signature: impl Into<Bytes>,
    ) -> Result<Self> {
        let signature = signature.into();
        check_length("terminal signature", &signature, &[4, 8])?;
        Ok(Self {
            revision,
            ratification_requested,
            signature: Some(signature),
        })
    }

    /// Create the abort form
    pub const fn abort(revision: PoRevision) -> Self {
        Self {
            revision,
            ratification_requested: false,
            signature: None,
        }
    }

    /// Whether this is the abort form
    pub const fn is_abort(&self) -> bool {
        self.signature.is_none()
    }

    /// Encode the frame
    pub fn build(&self) -> Result<Command> {
        let cla = self.revision.cla();
        match &self.signature {
            Some(signature) => {
                let p1 = if self.ratification_requested { 0x80 } else { 0x00 };
                Ok(Command::new_with_data(
                    cla,
                    ins::CLOSE_SESSION,
                    p1,
                    0x00,
                    signature.clone(),
                )?)
            }
            None => Ok(Command::new(cla, ins::CLOSE_SESSION, 0x00, 0x00)),
        }
    }

    /// Decode the response
    pub fn parse(&self, response: &Response) -> Result<CloseSessionResponse> {
        CommandKind::CloseSession.descriptor().check(response, &[])?;
        let data = response.payload_bytes();

        match data.len() {
            0 if self.is_abort() => Ok(CloseSessionResponse::default()),
            n if n < CARD_SIGNATURE_LENGTH => Err(Error::malformed(format!(
                "Close Secure Session response of {n} bytes"
            ))),
            n => {
                let split = n - CARD_SIGNATURE_LENGTH;
                Ok(CloseSessionResponse {
                    postponed_data: data.slice(..split),
                    signature_lo: data.slice(split..),
                })
            }
        }
    }
}

/// Decoded CLOSE SECURE SESSION response
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CloseSessionResponse {
    /// Low part of the card signature, empty for an abort
    pub signature_lo: Bytes,
    /// Data whose commit the card deferred until close
    pub postponed_data: Bytes,
}
