//! OPEN SECURE SESSION command
//!
//! The frame and the response layout both depend on the PO revision:
//!
//! | revision | P1                        | P2            | data                 |
//! |----------|---------------------------|---------------|----------------------|
//! | 2.4      | `0x80 + rec * 8 + key`    | `sfi * 8`     | challenge (4)        |
//! | 3.1      | `rec * 8 + key`           | `sfi * 8 + 1` | challenge (4)        |
//! | 3.2      | `rec * 8 + key`           | `sfi * 8 + 2` | `00` challenge (8)   |

use bytes::{BufMut, Bytes, BytesMut};
use calypso_apdu_core::{Command, Response};

use crate::{
    Error, Result,
    commands::{CommandKind, check_length, take},
    constants::{MAX_OPEN_SESSION_RECORD, ins},
    revision::PoRevision,
};

/// Largest record number a 2.4 PO accepts, P1 bit 7 being fixed
const MAX_REV2_4_RECORD: u8 = 15;

/// OPEN SECURE SESSION
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenSession {
    revision: PoRevision,
    key_index: u8,
    sfi: u8,
    record_number: u8,
    challenge: Bytes,
}

impl OpenSession {
    /// Create the command
    ///
    /// `record_number` 0 opens the session without reading a record.
    pub fn new(
        revision: PoRevision,
        key_index: u8,
        sfi: u8,
        record_number: u8,
        challenge: impl Into<Bytes>,
    ) -> Result<Self> {
        let challenge = challenge.into();
        if !(1..=3).contains(&key_index) {
            return Err(Error::inconsistent(format!(
                "key index must be 1, 2 or 3, got {key_index}"
            )));
        }
        let max_record = match revision {
            PoRevision::Rev2_4 => MAX_REV2_4_RECORD,
            PoRevision::Rev3_1 | PoRevision::Rev3_2 => MAX_OPEN_SESSION_RECORD,
        };
        if record_number > max_record {
            return Err(Error::inconsistent(format!(
                "record number {record_number} out of range 0..={max_record}"
            )));
        }
        if sfi > 31 {
            return Err(Error::inconsistent(format!("SFI {sfi:#04X} out of range")));
        }
        check_length("terminal challenge", &challenge, &[revision.challenge_length()])?;

        Ok(Self {
            revision,
            key_index,
            sfi,
            record_number,
            challenge,
        })
    }

    /// PO revision the frame is built for
    pub const fn revision(&self) -> PoRevision {
        self.revision
    }

    /// Record read by the card when opening, 0 for none
    pub const fn record_number(&self) -> u8 {
        self.record_number
    }

    /// Encode the frame
    pub fn build(&self) -> Result<Command> {
        let selector = self.record_number * 8 + self.key_index;
        let cla = self.revision.cla();

        let command = match self.revision {
            PoRevision::Rev2_4 => Command::new_with_data_and_le(
                cla,
                ins::OPEN_SESSION,
                0x80 + selector,
                self.sfi * 8,
                self.challenge.clone(),
                0x00,
            )?,
            PoRevision::Rev3_1 => Command::new_with_data_and_le(
                cla,
                ins::OPEN_SESSION,
                selector,
                self.sfi * 8 + 1,
                self.challenge.clone(),
                0x00,
            )?,
            PoRevision::Rev3_2 => {
                let mut data = BytesMut::with_capacity(1 + self.challenge.len());
                data.put_u8(0x00);
                data.put_slice(&self.challenge);
                Command::new_with_data_and_le(
                    cla,
                    ins::OPEN_SESSION,
                    selector,
                    self.sfi * 8 + 2,
                    data.freeze(),
                    0x00,
                )?
            }
        };
        Ok(command)
    }

    /// Decode the response
    pub fn parse(&self, response: &Response) -> Result<OpenSessionResponse> {
        CommandKind::OpenSession.descriptor().check(response, &[])?;
        OpenSessionResponse::decode(self.revision, response.payload_bytes())
    }
}

/// Decoded OPEN SECURE SESSION response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenSessionResponse {
    /// Transaction counter value
    pub transaction_counter: u32,
    /// Card challenge: counter followed by the card random
    pub card_challenge: Bytes,
    /// Whether the previous session was ratified
    pub previous_session_ratified: bool,
    /// Work key identifier, absent on 2.4 POs
    pub kif: Option<u8>,
    /// Work key version
    pub kvc: u8,
    /// Record read while opening, empty when none
    pub record_data: Bytes,
    /// Raw response data, fed to Digest Init
    pub data: Bytes,
}

impl OpenSessionResponse {
    fn decode(revision: PoRevision, data: Bytes) -> Result<Self> {
        let counter = |bytes: [u8; 3]| u32::from_be_bytes([0, bytes[0], bytes[1], bytes[2]]);

        let response = match revision {
            PoRevision::Rev2_4 => {
                let ratified = match data.len() {
                    5 | 34 => true,
                    7 | 36 => false,
                    n => {
                        return Err(Error::malformed(format!(
                            "Open Secure Session 2.4 response of {n} bytes"
                        )));
                    }
                };
                let [kvc] = take::<1>(&data, 0)?;
                let record_offset = if ratified { 5 } else { 7 };
                let record_data = if data.len() > record_offset {
                    data.slice(record_offset..)
                } else {
                    Bytes::new()
                };
                Self {
                    transaction_counter: counter(take(&data, 1)?),
                    card_challenge: data.slice(1..5),
                    previous_session_ratified: ratified,
                    kif: None,
                    kvc,
                    record_data,
                    data,
                }
            }
            PoRevision::Rev3_1 => {
                let [ratification, kif, kvc, length] = take::<4>(&data, 4)?;
                Self {
                    transaction_counter: counter(take(&data, 0)?),
                    card_challenge: data.slice(0..4),
                    previous_session_ratified: ratification == 0x00,
                    kif: Some(kif),
                    kvc,
                    record_data: record(&data, 8, length)?,
                    data,
                }
            }
            PoRevision::Rev3_2 => {
                let [flags, kif, kvc, length] = take::<4>(&data, 8)?;
                Self {
                    transaction_counter: counter(take(&data, 0)?),
                    card_challenge: data.slice(0..8),
                    previous_session_ratified: flags & 0x01 == 0,
                    kif: Some(kif),
                    kvc,
                    record_data: record(&data, 12, length)?,
                    data,
                }
            }
        };
        Ok(response)
    }
}

fn record(data: &Bytes, offset: usize, length: u8) -> Result<Bytes> {
    let end = offset + usize::from(length);
    if data.len() != end {
        return Err(Error::malformed(format!(
            "record length {length} inconsistent with {} response bytes",
            data.len()
        )));
    }
    Ok(data.slice(offset..end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn test_encoding_per_revision() {
        let rev2 = OpenSession::new(PoRevision::Rev2_4, 3, 0x07, 1, hex!("C1C2C3C4").to_vec())
            .unwrap();
        assert_eq!(rev2.build().unwrap().to_bytes().as_ref(), hex!("948A8B3804C1C2C3C400"));

        let rev31 = OpenSession::new(PoRevision::Rev3_1, 3, 0x07, 1, hex!("C1C2C3C4").to_vec())
            .unwrap();
        assert_eq!(rev31.build().unwrap().to_bytes().as_ref(), hex!("008A0B3904C1C2C3C400"));

        let rev32 = OpenSession::new(
            PoRevision::Rev3_2,
            1,
            0x07,
            1,
            hex!("C1C2C3C4C5C6C7C8").to_vec(),
        )
        .unwrap();
        assert_eq!(
            rev32.build().unwrap().to_bytes().as_ref(),
            hex!("008A093A0900C1C2C3C4C5C6C7C800")
        );
    }

    #[test]
    fn test_validation() {
        let challenge = hex!("00112233").to_vec();
        assert!(OpenSession::new(PoRevision::Rev3_1, 0, 1, 1, challenge.clone()).is_err());
        assert!(OpenSession::new(PoRevision::Rev3_1, 4, 1, 1, challenge.clone()).is_err());
        assert!(OpenSession::new(PoRevision::Rev3_1, 1, 1, 32, challenge.clone()).is_err());
        assert!(OpenSession::new(PoRevision::Rev2_4, 1, 1, 16, challenge.clone()).is_err());
        assert!(OpenSession::new(PoRevision::Rev3_2, 1, 1, 1, challenge.clone()).is_err());
        assert!(matches!(
            OpenSession::new(PoRevision::Rev3_1, 1, 32, 1, challenge),
            Err(Error::InconsistentCommand(_))
        ));
    }

    #[test]
    fn test_parse_rev2_4() {
        let command =
            OpenSession::new(PoRevision::Rev2_4, 1, 0x07, 0, hex!("01020304").to_vec()).unwrap();

        let ratified = command
            .parse(&Response::from_bytes(&hex!("7900000A559000")).unwrap())
            .unwrap();
        assert_eq!(ratified.kvc, 0x79);
        assert_eq!(ratified.kif, None);
        assert_eq!(ratified.transaction_counter, 0x0A);
        assert_eq!(ratified.card_challenge.as_ref(), hex!("00000A55"));
        assert!(ratified.previous_session_ratified);
        assert!(ratified.record_data.is_empty());

        let pending = command
            .parse(&Response::from_bytes(&hex!("7900000A5500009000")).unwrap())
            .unwrap();
        assert!(!pending.previous_session_ratified);

        assert!(matches!(
            command.parse(&Response::from_bytes(&hex!("7900000A55009000")).unwrap()),
            Err(Error::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_parse_rev3_1_with_record() {
        let command =
            OpenSession::new(PoRevision::Rev3_1, 3, 0x07, 1, hex!("01020304").to_vec()).unwrap();
        let response =
            Response::from_bytes(&hex!("03082A10 01 30 79 03 AABBCC 9000")).unwrap();
        let parsed = command.parse(&response).unwrap();

        assert_eq!(parsed.transaction_counter, 0x03082A);
        assert_eq!(parsed.card_challenge.as_ref(), hex!("03082A10"));
        assert!(!parsed.previous_session_ratified);
        assert_eq!(parsed.kif, Some(0x30));
        assert_eq!(parsed.kvc, 0x79);
        assert_eq!(parsed.record_data.as_ref(), hex!("AABBCC"));
        assert_eq!(parsed.data.as_ref(), hex!("03082A1001307903AABBCC"));
    }

    #[test]
    fn test_parse_rev3_2() {
        let command = OpenSession::new(
            PoRevision::Rev3_2,
            2,
            0x07,
            0,
            hex!("0102030405060708").to_vec(),
        )
        .unwrap();
        let response = Response::from_bytes(&hex!("000010 A1A2A3A4A5 00 27 79 00 9000")).unwrap();
        let parsed = command.parse(&response).unwrap();

        assert_eq!(parsed.card_challenge.as_ref(), hex!("000010A1A2A3A4A5"));
        assert!(parsed.previous_session_ratified);
        assert_eq!(parsed.kif, Some(0x27));
        assert!(parsed.record_data.is_empty());
    }

    #[test]
    fn test_parse_failure_status() {
        let command =
            OpenSession::new(PoRevision::Rev3_1, 1, 0x07, 1, hex!("01020304").to_vec()).unwrap();
        assert!(matches!(
            command.parse(&Response::error(0x6A81)),
            Err(Error::CommandFailed { message: "Wrong key index", .. })
        ));
    }
}
