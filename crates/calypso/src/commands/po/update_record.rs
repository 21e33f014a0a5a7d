//! UPDATE RECORD and WRITE RECORD commands
//!
//! Both address a record of a linear or cyclic EF the same way. UPDATE
//! replaces the record, WRITE ORs the new data into it.

use bytes::Bytes;
use calypso_apdu_core::{Command, Response};

use crate::{
    Error, Result,
    commands::CommandKind,
    constants::{MAX_SFI, ins},
    revision::PoRevision,
};

/// P2 addressing a record of an EF, SFI 0 being the current EF
pub(crate) const fn record_p2(sfi: u8) -> u8 {
    if sfi == 0 { 0x04 } else { (sfi << 3) + 4 }
}

pub(crate) fn check_record_data(data: &[u8]) -> Result<()> {
    if data.is_empty() || data.len() > calypso_apdu_core::MAX_DATA_LENGTH {
        return Err(Error::inconsistent(format!(
            "record data must be 1..=255 bytes, got {}",
            data.len()
        )));
    }
    Ok(())
}

fn check_record_address(sfi: u8, record_number: u8) -> Result<()> {
    if record_number < 1 {
        return Err(Error::inconsistent("record number must be at least 1"));
    }
    if sfi > MAX_SFI {
        return Err(Error::inconsistent(format!("SFI {sfi:#04X} out of range")));
    }
    Ok(())
}

/// UPDATE RECORD
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateRecord {
    revision: PoRevision,
    sfi: u8,
    record_number: u8,
    data: Bytes,
}

impl UpdateRecord {
    /// Create the command
    pub fn new(
        revision: PoRevision,
        sfi: u8,
        record_number: u8,
        data: impl Into<Bytes>,
    ) -> Result<Self> {
        let data = data.into();
        check_record_address(sfi, record_number)?;
        check_record_data(&data)?;
        Ok(Self {
            revision,
            sfi,
            record_number,
            data,
        })
    }

    /// Encode the frame
    pub fn build(&self) -> Result<Command> {
        Ok(Command::new_with_data(
            self.revision.cla(),
            ins::UPDATE_RECORD,
            self.record_number,
            record_p2(self.sfi),
            self.data.clone(),
        )?)
    }

    /// Check the response
    pub fn parse(&self, response: &Response) -> Result<()> {
        CommandKind::UpdateRecord.descriptor().check(response, &[])
    }
}

/// WRITE RECORD
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteRecord {
    revision: PoRevision,
    sfi: u8,
    record_number: u8,
    data: Bytes,
}

impl WriteRecord {
    /// Create the command
    pub fn new(
        revision: PoRevision,
        sfi: u8,
        record_number: u8,
        data: impl Into<Bytes>,
    ) -> Result<Self> {
        let data = data.into();
        check_record_address(sfi, record_number)?;
        check_record_data(&data)?;
        Ok(Self {
            revision,
            sfi,
            record_number,
            data,
        })
    }

    /// Encode the frame
    pub fn build(&self) -> Result<Command> {
        Ok(Command::new_with_data(
            self.revision.cla(),
            ins::WRITE_RECORD,
            self.record_number,
            record_p2(self.sfi),
            self.data.clone(),
        )?)
    }

    /// Check the response
    pub fn parse(&self, response: &Response) -> Result<()> {
        CommandKind::WriteRecord.descriptor().check(response, &[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn test_update_encoding() {
        let command =
            UpdateRecord::new(PoRevision::Rev3_1, 0x08, 1, hex!("00112233").to_vec()).unwrap();
        assert_eq!(
            command.build().unwrap().to_bytes().as_ref(),
            hex!("00DC01440400112233")
        );

        let current_ef =
            UpdateRecord::new(PoRevision::Rev3_1, 0, 2, hex!("AA").to_vec()).unwrap();
        assert_eq!(current_ef.build().unwrap().to_bytes().as_ref(), hex!("00DC020401AA"));
    }

    #[test]
    fn test_revisions_differ_only_in_cla() {
        for (sfi, record) in [(0u8, 1u8), (1, 1), (0x07, 4), (0x1E, 255)] {
            let data = hex!("0102030405").to_vec();
            let legacy = UpdateRecord::new(PoRevision::Rev2_4, sfi, record, data.clone())
                .unwrap()
                .build()
                .unwrap()
                .to_bytes();
            let modern = UpdateRecord::new(PoRevision::Rev3_2, sfi, record, data)
                .unwrap()
                .build()
                .unwrap()
                .to_bytes();
            assert_eq!(legacy[0], 0x94);
            assert_eq!(modern[0], 0x00);
            assert_eq!(legacy[1..], modern[1..]);
        }
    }

    #[test]
    fn test_record_zero_is_rejected() {
        assert!(matches!(
            UpdateRecord::new(PoRevision::Rev3_1, 0x08, 0, hex!("00").to_vec()),
            Err(Error::InconsistentCommand(_))
        ));
        assert!(matches!(
            WriteRecord::new(PoRevision::Rev3_1, 0x08, 0, hex!("00").to_vec()),
            Err(Error::InconsistentCommand(_))
        ));
    }

    #[test]
    fn test_data_bounds() {
        assert!(UpdateRecord::new(PoRevision::Rev3_1, 1, 1, Vec::new()).is_err());
        assert!(UpdateRecord::new(PoRevision::Rev3_1, 1, 1, vec![0u8; 255]).is_ok());
        assert!(UpdateRecord::new(PoRevision::Rev3_1, 1, 1, vec![0u8; 256]).is_err());
    }

    #[test]
    fn test_write_encoding_and_status() {
        let command = WriteRecord::new(PoRevision::Rev2_4, 0x1A, 3, hex!("F0").to_vec()).unwrap();
        assert_eq!(command.build().unwrap().to_bytes().as_ref(), hex!("94D203D401F0"));
        assert!(command.parse(&Response::error(0x9000)).is_ok());
        assert!(matches!(
            command.parse(&Response::error(0x6400)),
            Err(Error::CommandFailed { .. })
        ));
    }
}
