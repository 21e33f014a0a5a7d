//! Ratification frame
//!
//! A READ RECORD with record 0 that the card usually rejects with `6B00`.
//! Receiving any command after a contactless close is what ratifies the
//! session, so `6B00` counts as success.

use calypso_apdu_core::{Command, Response};

use crate::{Result, commands::CommandKind, constants::ins, revision::PoRevision};

/// Ratification command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ratification {
    revision: PoRevision,
}

impl Ratification {
    /// Create the command
    pub const fn new(revision: PoRevision) -> Self {
        Self { revision }
    }

    /// Encode the frame
    pub const fn build(&self) -> Command {
        Command::new_with_le(self.revision.cla(), ins::READ_RECORDS, 0x00, 0x00, 0x00)
    }

    /// Check the response
    pub fn parse(&self, response: &Response) -> Result<()> {
        CommandKind::Ratification.descriptor().check(response, &[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn test_ratification() {
        let command = Ratification::new(PoRevision::Rev3_1);
        assert_eq!(command.build().to_bytes().as_ref(), hex!("00B2000000"));
        assert!(command.parse(&Response::error(0x6B00)).is_ok());
        assert!(command.parse(&Response::error(0x9000)).is_ok());
        assert!(command.parse(&Response::error(0x6A82)).is_err());
    }
}
