//! READ RECORD(S) command

use std::collections::BTreeMap;

use bytes::Bytes;
use calypso_apdu_core::{Command, Response};

use crate::{
    Error, Result,
    commands::CommandKind,
    constants::{MAX_SFI, ins},
    revision::PoRevision,
};

/// Record contents keyed by record number
pub type Records = BTreeMap<u8, Bytes>;

/// How many records a READ RECORD(S) returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadMode {
    /// Only the requested record
    OneRecord,
    /// The requested record and every following one, as far as Le allows
    MultipleRecords,
}

impl ReadMode {
    const fn p2_flag(self) -> u8 {
        match self {
            Self::OneRecord => 0x04,
            Self::MultipleRecords => 0x05,
        }
    }
}

/// READ RECORD(S)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadRecords {
    revision: PoRevision,
    sfi: u8,
    record_number: u8,
    mode: ReadMode,
    expected_length: u8,
}

impl ReadRecords {
    /// Create the command
    ///
    /// SFI 0 reads the current EF. `expected_length` 0 lets the card return
    /// the whole record(s).
    pub fn new(
        revision: PoRevision,
        sfi: u8,
        record_number: u8,
        mode: ReadMode,
        expected_length: u8,
    ) -> Result<Self> {
        if record_number < 1 {
            return Err(Error::inconsistent("record number must be at least 1"));
        }
        if sfi > MAX_SFI {
            return Err(Error::inconsistent(format!("SFI {sfi:#04X} out of range")));
        }
        Ok(Self {
            revision,
            sfi,
            record_number,
            mode,
            expected_length,
        })
    }

    /// First record read
    pub const fn record_number(&self) -> u8 {
        self.record_number
    }

    /// Encode the frame
    pub const fn build(&self) -> Command {
        Command::new_with_le(
            self.revision.cla(),
            ins::READ_RECORDS,
            self.record_number,
            (self.sfi << 3) | self.mode.p2_flag(),
            self.expected_length,
        )
    }

    /// Decode the response into record contents
    pub fn parse(&self, response: &Response) -> Result<Records> {
        CommandKind::ReadRecords.descriptor().check(response, &[])?;
        let payload = response.payload_bytes();

        match self.mode {
            ReadMode::OneRecord => Ok(Records::from([(self.record_number, payload)])),
            ReadMode::MultipleRecords => parse_multiple(&payload),
        }
    }
}

/// Split a `rec(1) len(1) data(len)` sequence
fn parse_multiple(payload: &Bytes) -> Result<Records> {
    let mut records = Records::new();
    let mut offset = 0;

    while offset < payload.len() {
        let header = payload.get(offset..offset + 2).ok_or_else(|| {
            Error::malformed(format!("truncated record header at offset {offset}"))
        })?;
        let (number, length) = (header[0], usize::from(header[1]));
        let start = offset + 2;
        let end = start + length;
        if end > payload.len() {
            return Err(Error::malformed(format!(
                "record {number} announces {length} bytes, {} left",
                payload.len() - start
            )));
        }
        records.insert(number, payload.slice(start..end));
        offset = end;
    }

    Ok(records)
}
