//! SELECT DIVERSIFIER command
//!
//! Gives the SAM the PO serial number so it derives the card keys.

use bytes::Bytes;
use calypso_apdu_core::{Command, Response};

use crate::{
    Result,
    commands::{CommandKind, check_length},
    constants::ins,
    revision::SamRevision,
};

/// SELECT DIVERSIFIER
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectDiversifier {
    revision: SamRevision,
    diversifier: Bytes,
}

impl SelectDiversifier {
    /// Create the command with a 4 or 8 byte diversifier
    pub fn new(revision: SamRevision, diversifier: impl Into<Bytes>) -> Result<Self> {
        let diversifier = diversifier.into();
        check_length("diversifier", &diversifier, &[4, 8])?;
        Ok(Self {
            revision,
            diversifier,
        })
    }

    /// Encode the frame
    pub fn build(&self) -> Result<Command> {
        Ok(Command::new_with_data(
            self.revision.cla(),
            ins::SELECT_DIVERSIFIER,
            0x00,
            0x00,
            self.diversifier.clone(),
        )?)
    }

    /// Check the response
    pub fn parse(&self, response: &Response) -> Result<()> {
        CommandKind::SelectDiversifier.descriptor().check(response, &[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn test_encoding() {
        let command =
            SelectDiversifier::new(SamRevision::C1, hex!("0000000011223344").to_vec()).unwrap();
        assert_eq!(
            command.build().unwrap().to_bytes().as_ref(),
            hex!("80140000080000000011223344")
        );
        assert!(SelectDiversifier::new(SamRevision::C1, hex!("001122").to_vec()).is_err());
    }
}
