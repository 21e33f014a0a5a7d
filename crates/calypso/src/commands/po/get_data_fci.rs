//! GET DATA command for the PO FCI
//!
//! Returns the FCI of the currently selected application. Used when the
//! application was selected by ATR rather than by AID.

use bytes::Bytes;
use calypso_apdu_core::{Command, Response};

use crate::{
    Result,
    commands::CommandKind,
    constants::{FCI_DATA_TAG, ins},
    revision::PoRevision,
};

/// GET DATA (FCI)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GetDataFci {
    revision: PoRevision,
}

impl GetDataFci {
    /// Create the command for a PO revision
    pub const fn new(revision: PoRevision) -> Self {
        Self { revision }
    }

    /// Encode the frame
    pub const fn build(&self) -> Command {
        let [p1, p2] = FCI_DATA_TAG.to_be_bytes();
        Command::new_with_le(self.revision.cla(), ins::GET_DATA, p1, p2, 0x00)
    }

    /// Decode the response into the raw FCI
    pub fn parse(&self, response: &Response) -> Result<Bytes> {
        CommandKind::GetDataFci.descriptor().check(response, &[])?;
        Ok(response.payload_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn test_encoding_per_revision() {
        assert_eq!(
            GetDataFci::new(PoRevision::Rev2_4).build().to_bytes().as_ref(),
            hex!("94CA006F00")
        );
        assert_eq!(
            GetDataFci::new(PoRevision::Rev3_1).build().to_bytes().as_ref(),
            hex!("00CA006F00")
        );
        assert_eq!(
            GetDataFci::new(PoRevision::Rev3_2).build().to_bytes().as_ref(),
            hex!("00CA006F00")
        );
    }

    #[test]
    fn test_invalidated_df_still_returns_fci() {
        let command = GetDataFci::new(PoRevision::Rev3_1);
        let response = Response::from_bytes(&hex!("6F006283")).unwrap();
        assert_eq!(command.parse(&response).unwrap().as_ref(), hex!("6F00"));

        let missing = Response::error(0x6A88);
        assert!(command.parse(&missing).is_err());
    }
}
