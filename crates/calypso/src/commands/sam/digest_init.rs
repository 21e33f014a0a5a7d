//! DIGEST INIT command
//!
//! Starts the SAM digest with the work key and the Open Secure Session
//! response data.

use bytes::{BufMut, Bytes, BytesMut};
use calypso_apdu_core::{Command, MAX_DATA_LENGTH, Response};

use crate::{
    Error, Result,
    commands::CommandKind,
    constants::ins,
    revision::SamRevision,
};

/// P2 value announcing a KIF/KVC prefix in the data field
const P2_KIF_KVC: u8 = 0xFF;

/// Reference of the work key used by the SAM
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkKey {
    /// Key identified by its KIF and KVC
    Kif {
        /// Key identifier
        kif: u8,
        /// Key version
        kvc: u8,
    },
    /// Key stored at this record number of the SAM key file
    Record(u8),
}

/// DIGEST INIT
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestInit {
    revision: SamRevision,
    verification_mode: bool,
    rev3_2_mode: bool,
    key: WorkKey,
    data: Bytes,
}

impl DigestInit {
    /// Create the command
    pub fn new(
        revision: SamRevision,
        verification_mode: bool,
        rev3_2_mode: bool,
        key: WorkKey,
        data: impl Into<Bytes>,
    ) -> Result<Self> {
        let data = data.into();
        if data.is_empty() {
            return Err(Error::inconsistent("digest init data is empty"));
        }
        let prefix = match key {
            WorkKey::Kif { .. } => 2,
            WorkKey::Record(0 | P2_KIF_KVC) => {
                return Err(Error::inconsistent("work key record number out of range"));
            }
            WorkKey::Record(_) => 0,
        };
        if prefix + data.len() > MAX_DATA_LENGTH {
            return Err(Error::inconsistent(format!(
                "digest init data too long: {} bytes",
                data.len()
            )));
        }
        Ok(Self {
            revision,
            verification_mode,
            rev3_2_mode,
            key,
            data,
        })
    }

    /// Encode the frame
    pub fn build(&self) -> Result<Command> {
        let mut p1 = 0x00;
        if self.verification_mode {
            p1 |= 0x01;
        }
        if self.rev3_2_mode {
            p1 |= 0x02;
        }

        let (p2, data) = match self.key {
            WorkKey::Kif { kif, kvc } => {
                let mut data = BytesMut::with_capacity(2 + self.data.len());
                data.put_u8(kif);
                data.put_u8(kvc);
                data.put_slice(&self.data);
                (P2_KIF_KVC, data.freeze())
            }
            WorkKey::Record(record) => (record, self.data.clone()),
        };

        Ok(Command::new_with_data(
            self.revision.cla(),
            ins::DIGEST_INIT,
            p1,
            p2,
            data,
        )?)
    }

    /// Check the response
    pub fn parse(&self, response: &Response) -> Result<()> {
        CommandKind::DigestInit.descriptor().check(response, &[])
    }
}
