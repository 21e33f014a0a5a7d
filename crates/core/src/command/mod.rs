//! APDU command frames
//!
//! A [`Command`] is the ISO/IEC 7816-4 short command frame
//! `CLA INS P1 P2 [Lc DATA...] [Le]`. The framing "case" follows from which
//! optional parts are present:
//!
//! | data | Le  | frame                         |
//! |------|-----|-------------------------------|
//! | no   | no  | `CLA INS P1 P2`               |
//! | no   | yes | `CLA INS P1 P2 Le`            |
//! | yes  | no  | `CLA INS P1 P2 Lc DATA`       |
//! | yes  | yes | `CLA INS P1 P2 Lc DATA Le`    |

pub mod error;

use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};

pub use error::CommandError;

/// Expected length type for APDU commands
pub type ExpectedLength = u8;

/// Largest data field a short APDU can carry
pub const MAX_DATA_LENGTH: usize = 255;

/// Immutable APDU command frame
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Command {
    cla: u8,
    ins: u8,
    p1: u8,
    p2: u8,
    data: Option<Bytes>,
    le: Option<ExpectedLength>,
}

impl Command {
    /// Create a new command with just the header bytes
    pub const fn new(cla: u8, ins: u8, p1: u8, p2: u8) -> Self {
        Self {
            cla,
            ins,
            p1,
            p2,
            data: None,
            le: None,
        }
    }

    /// Create a new command with expected response length (Le)
    pub const fn new_with_le(cla: u8, ins: u8, p1: u8, p2: u8, le: ExpectedLength) -> Self {
        Self {
            cla,
            ins,
            p1,
            p2,
            data: None,
            le: Some(le),
        }
    }

    /// Create a new command with a data field
    pub fn new_with_data<T: Into<Bytes>>(
        cla: u8,
        ins: u8,
        p1: u8,
        p2: u8,
        data: T,
    ) -> Result<Self, CommandError> {
        Self::new(cla, ins, p1, p2).with_data(data)
    }

    /// Create a new command with both a data field and an expected length
    pub fn new_with_data_and_le<T: Into<Bytes>>(
        cla: u8,
        ins: u8,
        p1: u8,
        p2: u8,
        data: T,
        le: ExpectedLength,
    ) -> Result<Self, CommandError> {
        Ok(Self::new(cla, ins, p1, p2).with_data(data)?.with_le(le))
    }

    /// Set the data field
    ///
    /// An empty buffer means "no data": no Lc byte is encoded.
    pub fn with_data<T: Into<Bytes>>(mut self, data: T) -> Result<Self, CommandError> {
        let data = data.into();
        if data.len() > MAX_DATA_LENGTH {
            return Err(CommandError::data_too_long(data.len(), MAX_DATA_LENGTH));
        }
        self.data = (!data.is_empty()).then_some(data);
        Ok(self)
    }

    /// Set the expected length field
    pub const fn with_le(mut self, le: ExpectedLength) -> Self {
        self.le = Some(le);
        self
    }

    /// Command class (CLA)
    pub const fn class(&self) -> u8 {
        self.cla
    }

    /// Instruction code (INS)
    pub const fn instruction(&self) -> u8 {
        self.ins
    }

    /// First parameter (P1)
    pub const fn p1(&self) -> u8 {
        self.p1
    }

    /// Second parameter (P2)
    pub const fn p2(&self) -> u8 {
        self.p2
    }

    /// Command payload data, if any
    pub fn data(&self) -> Option<&[u8]> {
        self.data.as_deref()
    }

    /// Expected response length, if any
    pub const fn expected_length(&self) -> Option<ExpectedLength> {
        self.le
    }

    /// Length of the serialized frame
    pub fn command_length(&self) -> usize {
        4 + self.data.as_ref().map_or(0, |data| 1 + data.len()) + usize::from(self.le.is_some())
    }

    /// Serialize to raw APDU bytes
    pub fn to_bytes(&self) -> Bytes {
        let mut buffer = BytesMut::with_capacity(self.command_length());

        buffer.put_u8(self.cla);
        buffer.put_u8(self.ins);
        buffer.put_u8(self.p1);
        buffer.put_u8(self.p2);

        if let Some(data) = &self.data {
            // with_data keeps the length within a single byte
            buffer.put_u8(data.len() as u8);
            buffer.put_slice(data);
        }

        if let Some(le) = self.le {
            buffer.put_u8(le);
        }

        buffer.freeze()
    }

    /// Parse a command from raw bytes
    pub fn from_bytes(raw: &[u8]) -> Result<Self, CommandError> {
        let [cla, ins, p1, p2, body @ ..] = raw else {
            return Err(CommandError::InvalidLength(raw.len()));
        };

        let command = Self::new(*cla, *ins, *p1, *p2);

        match body {
            [] => Ok(command),
            [le] => Ok(command.with_le(*le)),
            [lc, rest @ ..] => {
                let lc = usize::from(*lc);
                match rest.len() {
                    n if n == lc => command.with_data(Bytes::copy_from_slice(rest)),
                    n if n == lc + 1 => Ok(command
                        .with_data(Bytes::copy_from_slice(&rest[..lc]))?
                        .with_le(rest[lc])),
                    _ => Err(CommandError::InvalidLength(raw.len())),
                }
            }
        }
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("cla", &format_args!("{:#04X}", self.cla))
            .field("ins", &format_args!("{:#04X}", self.ins))
            .field("p1", &format_args!("{:#04X}", self.p1))
            .field("p2", &format_args!("{:#04X}", self.p2))
            .field("data", &self.data.as_ref().map(hex::encode_upper))
            .field("le", &self.le)
            .finish()
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode_upper(self.to_bytes()))
    }
}

impl From<&Command> for Bytes {
    fn from(command: &Command) -> Self {
        command.to_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn test_command_serialization() {
        let aid = hex!("315449432E494341");
        let cmd = Command::new_with_data_and_le(0x00, 0xA4, 0x04, 0x00, aid.to_vec(), 0).unwrap();
        assert_eq!(cmd.to_bytes().as_ref(), hex!("00A4040008315449432E49434100"));
    }

    #[test]
    fn test_all_cases() {
        let case1 = Command::new(0x00, 0x8E, 0x00, 0x00);
        assert_eq!(case1.to_bytes().as_ref(), hex!("008E0000"));

        let case2 = Command::new_with_le(0x94, 0xCA, 0x00, 0x6F, 0x00);
        assert_eq!(case2.to_bytes().as_ref(), hex!("94CA006F00"));

        let case3 = Command::new_with_data(0x00, 0xDC, 0x01, 0x0C, hex!("0102").to_vec()).unwrap();
        assert_eq!(case3.to_bytes().as_ref(), hex!("00DC010C020102"));

        let case4 =
            Command::new_with_data_and_le(0x00, 0x8A, 0x0B, 0x39, hex!("AABBCCDD").to_vec(), 0)
                .unwrap();
        assert_eq!(case4.to_bytes().as_ref(), hex!("008A0B3904AABBCCDD00"));
    }

    #[test]
    fn test_command_length() {
        assert_eq!(Command::new(0x00, 0xB0, 0x00, 0x00).command_length(), 4);
        assert_eq!(Command::new_with_le(0x00, 0xB0, 0x00, 0x00, 0xFF).command_length(), 5);

        let cmd = Command::new_with_data(0x00, 0xD6, 0x00, 0x00, vec![1, 2, 3]).unwrap();
        assert_eq!(cmd.command_length(), 8);
        assert_eq!(cmd.with_le(0).command_length(), 9);
    }

    #[test]
    fn test_data_limit() {
        assert!(Command::new_with_data(0x80, 0x8C, 0x00, 0x00, vec![0u8; 255]).is_ok());
        assert_eq!(
            Command::new_with_data(0x80, 0x8C, 0x00, 0x00, vec![0u8; 256]),
            Err(CommandError::DataTooLong(256, 255))
        );
    }

    #[test]
    fn test_empty_data_is_no_data() {
        let cmd = Command::new_with_data(0x00, 0x8E, 0x00, 0x00, Vec::new()).unwrap();
        assert_eq!(cmd.data(), None);
        assert_eq!(cmd.to_bytes().as_ref(), hex!("008E0000"));
    }

    #[test]
    fn test_command_from_bytes() {
        let cmd = Command::from_bytes(&hex!("00A40400")).unwrap();
        assert_eq!(cmd, Command::new(0x00, 0xA4, 0x04, 0x00));

        let cmd = Command::from_bytes(&hex!("00A4040003010203")).unwrap();
        assert_eq!(cmd.data(), Some(hex!("010203").as_ref()));
        assert_eq!(cmd.expected_length(), None);

        let cmd = Command::from_bytes(&hex!("00A4040003010203FF")).unwrap();
        assert_eq!(cmd.data(), Some(hex!("010203").as_ref()));
        assert_eq!(cmd.expected_length(), Some(0xFF));

        let cmd = Command::from_bytes(&hex!("00B2010C00")).unwrap();
        assert_eq!(cmd.data(), None);
        assert_eq!(cmd.expected_length(), Some(0));

        assert!(Command::from_bytes(&hex!("00B201")).is_err());
        assert!(Command::from_bytes(&hex!("00A404000501")).is_err());
    }

    #[test]
    fn test_display_is_hex() {
        let cmd = Command::new_with_le(0x00, 0xCA, 0x00, 0x6F, 0x00);
        assert_eq!(cmd.to_string(), "00CA006F00");
    }
}
