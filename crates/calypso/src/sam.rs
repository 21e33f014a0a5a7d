//! Calypso SAM identification from its ATR
//!
//! A SAM ATR ends with `80 5A xx 80 <type> 20 xx xx <serial(4)> 82 90 00`.

use std::fmt;

use bytes::Bytes;

use crate::{Error, Result, revision::SamRevision};

/// Shortest ATR carrying the SAM historical bytes
const MIN_SAM_ATR_LENGTH: usize = 19;

/// A Calypso SAM in a reader
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalypsoSam {
    atr: Bytes,
    revision: SamRevision,
    serial_number: [u8; 4],
}

impl CalypsoSam {
    /// Decode the SAM ATR
    pub fn from_atr(atr: impl Into<Bytes>) -> Result<Self> {
        let atr = atr.into();
        let len = atr.len();
        if len < MIN_SAM_ATR_LENGTH {
            return Err(Error::malformed(format!("SAM ATR of {len} bytes")));
        }

        let revision = SamRevision::from_application_type(atr[len - 11])?;
        let mut serial_number = [0u8; 4];
        serial_number.copy_from_slice(&atr[len - 7..len - 3]);

        Ok(Self {
            atr,
            revision,
            serial_number,
        })
    }

    /// ATR of the SAM
    pub fn atr(&self) -> &[u8] {
        &self.atr
    }

    /// Resolved SAM revision
    pub const fn revision(&self) -> SamRevision {
        self.revision
    }

    /// SAM serial number
    pub const fn serial_number(&self) -> &[u8; 4] {
        &self.serial_number
    }
}

impl fmt::Display for CalypsoSam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SAM {} serial {}",
            self.revision,
            hex::encode_upper(self.serial_number)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn test_from_atr() {
        let sam = CalypsoSam::from_atr(hex!("3B3F9600805A2A80C120050311223344829000").to_vec())
            .unwrap();
        assert_eq!(sam.revision(), SamRevision::C1);
        assert_eq!(sam.serial_number(), &hex!("11223344"));
        assert_eq!(sam.to_string(), "SAM C1 serial 11223344");

        let s1d = CalypsoSam::from_atr(hex!("3B3F9600805A2A80D320050399887766829000").to_vec())
            .unwrap();
        assert_eq!(s1d.revision(), SamRevision::S1D);
    }

    #[test]
    fn test_invalid_atr() {
        assert!(matches!(
            CalypsoSam::from_atr(hex!("3B8880010000000000718100").to_vec()),
            Err(Error::MalformedResponse(_))
        ));
        assert!(matches!(
            CalypsoSam::from_atr(hex!("3B3F9600805A2A80B020050311223344829000").to_vec()),
            Err(Error::UnknownRevision(0xB0))
        ));
    }
}
