//! PO and SAM revisions
//!
//! The revision decides the class byte of every command, and for Open
//! Secure Session the whole layout of the frame and of the response.

use derive_more::Display;

use crate::{Error, Result, constants::cla};

/// Calypso PO revision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum PoRevision {
    /// Revision 2.4
    #[display("2.4")]
    Rev2_4,
    /// Revision 3.1
    #[display("3.1")]
    Rev3_1,
    /// Revision 3.2
    #[display("3.2")]
    Rev3_2,
}

impl PoRevision {
    /// Resolve the revision from the FCI application type byte
    ///
    /// `0x01..=0x1F` is 2.4 and `0x20..=0x7F` is 3.x, with bit 3 selecting
    /// 3.2. Zero and the `0x80..` range are reserved.
    pub const fn classify(application_type: u8) -> Result<Self> {
        match application_type {
            0x01..=0x1F => Ok(Self::Rev2_4),
            0x20..=0x7F if application_type & 0x08 != 0 => Ok(Self::Rev3_2),
            0x20..=0x7F => Ok(Self::Rev3_1),
            _ => Err(Error::UnknownRevision(application_type)),
        }
    }

    /// Class byte of every PO command for this revision
    pub const fn cla(self) -> u8 {
        match self {
            Self::Rev2_4 => cla::CALYPSO_LEGACY,
            Self::Rev3_1 | Self::Rev3_2 => cla::ISO7816,
        }
    }

    /// Length of the terminal challenge sent in Open Secure Session
    pub const fn challenge_length(self) -> usize {
        match self {
            Self::Rev3_2 => 8,
            Self::Rev2_4 | Self::Rev3_1 => 4,
        }
    }
}

/// Calypso SAM revision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum SamRevision {
    /// C1 SAM
    #[display("C1")]
    C1,
    /// S1E SAM
    #[display("S1E")]
    S1E,
    /// S1D SAM (D0 to DF application types)
    #[display("S1D")]
    S1D,
    /// Any SAM, used for ATR filtering before the revision is known
    #[display("ANY")]
    Any,
}

impl SamRevision {
    /// Resolve the revision from the application type byte of the SAM ATR
    pub const fn from_application_type(application_type: u8) -> Result<Self> {
        match application_type {
            0xC1 => Ok(Self::C1),
            0xE1 => Ok(Self::S1E),
            0xD0..=0xDF => Ok(Self::S1D),
            _ => Err(Error::UnknownRevision(application_type)),
        }
    }

    /// Class byte of every SAM command for this revision
    pub const fn cla(self) -> u8 {
        match self {
            Self::S1D => cla::CALYPSO_LEGACY,
            Self::C1 | Self::S1E | Self::Any => cla::SAM,
        }
    }

    /// Application type pattern of the SAM ATR, `?` being any hex digit
    pub const fn application_type_mask(self) -> &'static str {
        match self {
            Self::C1 => "C1",
            Self::S1E => "E1",
            Self::S1D => "D?",
            Self::Any => "??",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_boundaries() {
        assert_eq!(PoRevision::classify(0x01).unwrap(), PoRevision::Rev2_4);
        assert_eq!(PoRevision::classify(0x1F).unwrap(), PoRevision::Rev2_4);
        assert_eq!(PoRevision::classify(0x20).unwrap(), PoRevision::Rev3_1);
        assert_eq!(PoRevision::classify(0x27).unwrap(), PoRevision::Rev3_1);
        assert_eq!(PoRevision::classify(0x28).unwrap(), PoRevision::Rev3_2);
        assert_eq!(PoRevision::classify(0x7F).unwrap(), PoRevision::Rev3_2);
    }

    #[test]
    fn test_classify_is_total() {
        for byte in 0..=u8::MAX {
            let known = PoRevision::classify(byte).is_ok();
            assert_eq!(known, (0x01..=0x7F).contains(&byte), "byte {byte:#04X}");
        }
        assert!(matches!(
            PoRevision::classify(0x00),
            Err(Error::UnknownRevision(0x00))
        ));
        assert!(matches!(
            PoRevision::classify(0x80),
            Err(Error::UnknownRevision(0x80))
        ));
    }

    #[test]
    fn test_po_cla() {
        assert_eq!(PoRevision::Rev2_4.cla(), 0x94);
        assert_eq!(PoRevision::Rev3_1.cla(), 0x00);
        assert_eq!(PoRevision::Rev3_2.cla(), 0x00);
        assert_eq!(PoRevision::Rev3_2.to_string(), "3.2");
    }

    #[test]
    fn test_sam_revision() {
        assert_eq!(SamRevision::from_application_type(0xC1).unwrap(), SamRevision::C1);
        assert_eq!(SamRevision::from_application_type(0xE1).unwrap(), SamRevision::S1E);
        assert_eq!(SamRevision::from_application_type(0xD7).unwrap(), SamRevision::S1D);
        assert!(SamRevision::from_application_type(0xB0).is_err());

        assert_eq!(SamRevision::S1D.cla(), 0x94);
        assert_eq!(SamRevision::C1.cla(), 0x80);
        assert_eq!(SamRevision::Any.cla(), 0x80);
        assert_eq!(SamRevision::S1D.application_type_mask(), "D?");
    }
}
