//! APPEND RECORD command

use bytes::Bytes;
use calypso_apdu_core::{Command, Response};

use crate::{
    Error, Result,
    commands::{CommandKind, po::update_record::check_record_data},
    constants::{MAX_SFI, ins},
    revision::PoRevision,
};

/// APPEND RECORD, writes a new first record of a cyclic EF
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendRecord {
    revision: PoRevision,
    sfi: u8,
    data: Bytes,
}

impl AppendRecord {
    /// Create the command, SFI 0 targets the current EF
    pub fn new(revision: PoRevision, sfi: u8, data: impl Into<Bytes>) -> Result<Self> {
        let data = data.into();
        if sfi > MAX_SFI {
            return Err(Error::inconsistent(format!("SFI {sfi:#04X} out of range")));
        }
        check_record_data(&data)?;
        Ok(Self {
            revision,
            sfi,
            data,
        })
    }

    /// Encode the frame
    pub fn build(&self) -> Result<Command> {
        let p2 = if self.sfi == 0 { 0x00 } else { self.sfi << 3 };
        Ok(Command::new_with_data(
            self.revision.cla(),
            ins::APPEND_RECORD,
            0x00,
            p2,
            self.data.clone(),
        )?)
    }

    /// Check the response
    pub fn parse(&self, response: &Response) -> Result<()> {
        CommandKind::AppendRecord.descriptor().check(response, &[])
    }
}
