//! DIGEST UPDATE and DIGEST UPDATE MULTIPLE commands
//!
//! Feed the SAM digest with the exchanged PO frames, one frame per DIGEST
//! UPDATE or several `len || data` blocks per DIGEST UPDATE MULTIPLE.

use bytes::{BufMut, Bytes, BytesMut};
use calypso_apdu_core::{Command, MAX_DATA_LENGTH, Response};

use crate::{
    Error, Result,
    commands::CommandKind,
    constants::ins,
    revision::SamRevision,
};

/// DIGEST UPDATE
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestUpdate {
    revision: SamRevision,
    encrypted: bool,
    data: Bytes,
}

impl DigestUpdate {
    /// Create the command with 1 to 255 bytes of data
    pub fn new(revision: SamRevision, encrypted: bool, data: impl Into<Bytes>) -> Result<Self> {
        let data = data.into();
        if data.is_empty() || data.len() > MAX_DATA_LENGTH {
            return Err(Error::inconsistent(format!(
                "digest data must be 1..=255 bytes, got {}",
                data.len()
            )));
        }
        Ok(Self {
            revision,
            encrypted,
            data,
        })
    }

    /// Digested bytes
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Encode the frame
    pub fn build(&self) -> Result<Command> {
        let p2 = if self.encrypted { 0x80 } else { 0x00 };
        Ok(Command::new_with_data(
            self.revision.cla(),
            ins::DIGEST_UPDATE,
            0x00,
            p2,
            self.data.clone(),
        )?)
    }

    /// Check the response
    pub fn parse(&self, response: &Response) -> Result<()> {
        CommandKind::DigestUpdate.descriptor().check(response, &[])
    }
}

/// DIGEST UPDATE MULTIPLE
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestUpdateMultiple {
    revision: SamRevision,
    data: Bytes,
}

impl DigestUpdateMultiple {
    /// Size of the encoded data field for these parts
    pub fn encoded_length<B: AsRef<[u8]>>(parts: &[B]) -> usize {
        parts.iter().map(|part| 1 + part.as_ref().len()).sum()
    }

    /// Create the command from the byte strings to digest, in order
    pub fn new<B: AsRef<[u8]>>(revision: SamRevision, parts: &[B]) -> Result<Self> {
        if parts.is_empty() {
            return Err(Error::inconsistent("nothing to digest"));
        }
        let length = Self::encoded_length(parts);
        if length > MAX_DATA_LENGTH {
            return Err(Error::inconsistent(format!(
                "digest update multiple data too long: {length} bytes"
            )));
        }

        let mut data = BytesMut::with_capacity(length);
        for part in parts {
            let part = part.as_ref();
            if part.is_empty() {
                return Err(Error::inconsistent("empty digest block"));
            }
            // bounded by the total length check above
            data.put_u8(part.len() as u8);
            data.put_slice(part);
        }

        Ok(Self {
            revision,
            data: data.freeze(),
        })
    }

    /// Encode the frame
    pub fn build(&self) -> Result<Command> {
        Ok(Command::new_with_data(
            self.revision.cla(),
            ins::DIGEST_UPDATE,
            0x80,
            0x00,
            self.data.clone(),
        )?)
    }

    /// Check the response
    pub fn parse(&self, response: &Response) -> Result<()> {
        CommandKind::DigestUpdateMultiple.descriptor().check(response, &[])
    }
}
