//! SAM digest session
//!
//! The SAM computes the session MAC over everything exchanged with the PO.
//! [`DigestSession`] only frames and sequences the SAM commands feeding it:
//!
//! 1. SELECT DIVERSIFIER with the PO serial number
//! 2. DIGEST INIT with the work key and the Open Secure Session response
//! 3. DIGEST UPDATE (or DIGEST UPDATE MULTIPLE) for every exchange
//! 4. DIGEST CLOSE for the terminal signature
//! 5. DIGEST AUTHENTICATE with the card signature

use bytes::Bytes;
use calypso_apdu_core::CardTransport;
use tracing::{debug, trace};

use crate::{
    Result,
    commands::{
        CommandKind,
        sam::{
            DigestAuthenticate, DigestClose, DigestInit, DigestUpdate, DigestUpdateMultiple,
            SamCommand, SamResponse, SelectDiversifier, WorkKey,
        },
        transmit,
    },
    revision::SamRevision,
};

/// Send a SAM command and decode its response
pub(crate) fn exchange<S: CardTransport>(sam: &mut S, command: SamCommand) -> Result<SamResponse> {
    let frame = command.build()?;
    let (_, response) = transmit(sam, &frame)?;
    command.parse(&response)
}

/// Digest state held by the terminal for one secure session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestSession {
    revision: SamRevision,
    diversifier: Bytes,
    key: WorkKey,
    encrypted: bool,
    log: Vec<Bytes>,
    final_signature: Option<Bytes>,
}

impl DigestSession {
    /// Select the diversifier and initialize the digest
    ///
    /// `rev3_2_mode` is set when the PO is a revision 3.2 card.
    pub fn init<S: CardTransport>(
        sam: &mut S,
        revision: SamRevision,
        rev3_2_mode: bool,
        diversifier: impl Into<Bytes>,
        key: WorkKey,
        open_session_data: impl Into<Bytes>,
        encrypted: bool,
    ) -> Result<Self> {
        let diversifier = diversifier.into();
        let open_session_data = open_session_data.into();

        let select = SelectDiversifier::new(revision, diversifier.clone())?;
        let init = DigestInit::new(revision, false, rev3_2_mode, key, open_session_data.clone())?;

        exchange(sam, select.into())?;
        exchange(sam, init.into())?;
        debug!(
            diversifier = %hex::encode_upper(&diversifier),
            ?key,
            "Digest initialized"
        );

        Ok(Self {
            revision,
            diversifier,
            key,
            encrypted,
            log: vec![open_session_data],
            final_signature: None,
        })
    }

    /// Feed one byte string to the digest
    pub fn update<S: CardTransport>(&mut self, sam: &mut S, data: impl Into<Bytes>) -> Result<()> {
        let command = DigestUpdate::new(self.revision, self.encrypted, data)?;
        let data = Bytes::copy_from_slice(command.data());
        exchange(sam, command.into())?;
        trace!(length = data.len(), "Digest updated");
        self.log.push(data);
        Ok(())
    }

    /// Feed several byte strings with a single DIGEST UPDATE MULTIPLE
    pub fn update_multiple<S: CardTransport>(&mut self, sam: &mut S, parts: &[Bytes]) -> Result<()> {
        let command = DigestUpdateMultiple::new(self.revision, parts)?;
        exchange(sam, command.into())?;
        trace!(parts = parts.len(), "Digest updated");
        self.log.extend(parts.iter().cloned());
        Ok(())
    }

    /// Close the digest and return the terminal signature
    pub fn close<S: CardTransport>(&mut self, sam: &mut S, length: u8) -> Result<Bytes> {
        let command = DigestClose::new(self.revision, length)?;
        let (_, response) = transmit(sam, &command.build())?;
        let signature = command.parse(&response)?;
        self.final_signature = Some(signature.clone());
        Ok(signature)
    }

    /// Have the SAM check the card signature
    ///
    /// Any non-success status means the signature was rejected. Transport
    /// failures and invalid signature lengths are still errors.
    pub fn authenticate<S: CardTransport>(
        &mut self,
        sam: &mut S,
        card_signature: impl Into<Bytes>,
    ) -> Result<bool> {
        let command = DigestAuthenticate::new(self.revision, card_signature)?;
        let (_, response) = transmit(sam, &command.build()?)?;
        let accepted = CommandKind::DigestAuthenticate
            .descriptor()
            .is_successful(response.status());
        debug!(accepted, status = %response.status(), "Card signature checked");
        Ok(accepted)
    }

    /// SAM revision the frames are built for
    pub const fn revision(&self) -> SamRevision {
        self.revision
    }

    /// Diversifier selected in the SAM
    pub fn diversifier(&self) -> &[u8] {
        &self.diversifier
    }

    /// Work key reference
    pub const fn key(&self) -> WorkKey {
        self.key
    }

    /// Every byte string fed to the digest, in order, Digest Init data first
    pub fn log(&self) -> &[Bytes] {
        &self.log
    }

    /// Number of bytes fed after Digest Init
    pub fn updated_length(&self) -> usize {
        self.log.iter().skip(1).map(Bytes::len).sum()
    }

    /// Terminal signature, once the digest is closed
    pub fn final_signature(&self) -> Option<&[u8]> {
        self.final_signature.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use calypso_apdu_core::TransportError;
    use hex_literal::hex;

    #[derive(Debug, Default)]
    struct ScriptedSam {
        responses: Vec<Bytes>,
        commands: Vec<Bytes>,
    }

    impl ScriptedSam {
        fn replying(responses: &[&[u8]]) -> Self {
            Self {
                responses: responses.iter().map(|r| Bytes::copy_from_slice(r)).collect(),
                commands: Vec::new(),
            }
        }
    }

    impl CardTransport for ScriptedSam {
        fn do_transmit_raw(&mut self, command: &[u8]) -> std::result::Result<Bytes, TransportError> {
            self.commands.push(Bytes::copy_from_slice(command));
            if self.responses.is_empty() {
                return Err(TransportError::Transmission);
            }
            Ok(self.responses.remove(0))
        }

        fn atr(&self) -> Bytes {
            Bytes::new()
        }

        fn is_connected(&self) -> bool {
            true
        }

        fn close_channel(&mut self) -> std::result::Result<(), TransportError> {
            Ok(())
        }

        fn reset(&mut self) -> std::result::Result<(), TransportError> {
            Ok(())
        }
    }

    const OK: &[u8] = &hex!("9000");

    fn init(sam: &mut ScriptedSam) -> DigestSession {
        DigestSession::init(
            sam,
            SamRevision::C1,
            false,
            hex!("0000000011223344").to_vec(),
            WorkKey::Kif { kif: 0x30, kvc: 0x79 },
            hex!("0307D00500003079").to_vec(),
            false,
        )
        .unwrap()
    }

    #[test]
    fn test_init_sequence() {
        let mut sam = ScriptedSam::replying(&[OK, OK]);
        let digest = init(&mut sam);
        assert_eq!(sam.commands[0].as_ref(), hex!("80140000080000000011223344"));
        assert_eq!(sam.commands[1].as_ref(), hex!("808A00FF0A30790307D00500003079"));
        assert_eq!(digest.log().len(), 1);
        assert_eq!(digest.updated_length(), 0);
    }

    #[test]
    fn test_update_and_close() {
        let mut sam = ScriptedSam::replying(&[OK, OK, OK, OK, &hex!("A1A2A3A49000")]);
        let mut digest = init(&mut sam);

        digest.update(&mut sam, hex!("00B2010C00").to_vec()).unwrap();
        digest
            .update_multiple(
                &mut sam,
                &[Bytes::from_static(&hex!("00B2020C00")), Bytes::from_static(&hex!("9000"))],
            )
            .unwrap();
        assert_eq!(sam.commands[2].as_ref(), hex!("808C00000500B2010C00"));
        assert_eq!(sam.commands[3].as_ref(), hex!("808C8000090500B2020C00029000"));
        assert_eq!(digest.updated_length(), 12);

        let signature = digest.close(&mut sam, 4).unwrap();
        assert_eq!(sam.commands[4].as_ref(), hex!("808E000004"));
        assert_eq!(signature.as_ref(), hex!("A1A2A3A4"));
        assert_eq!(digest.final_signature(), Some(hex!("A1A2A3A4").as_ref()));
    }

    #[test]
    fn test_authenticate() {
        let mut sam = ScriptedSam::replying(&[OK, OK, OK, &hex!("6988")]);
        let mut digest = init(&mut sam);
        assert!(digest.authenticate(&mut sam, hex!("01020304").to_vec()).unwrap());
        assert!(!digest.authenticate(&mut sam, hex!("01020304").to_vec()).unwrap());
        assert!(matches!(
            digest.authenticate(&mut sam, hex!("010203").to_vec()),
            Err(Error::InconsistentCommand(_))
        ));
        assert_eq!(sam.commands.len(), 4);
    }

    #[test]
    fn test_init_failure() {
        let mut sam = ScriptedSam::replying(&[OK, &hex!("6A83")]);
        let result = DigestSession::init(
            &mut sam,
            SamRevision::C1,
            true,
            hex!("11223344").to_vec(),
            WorkKey::Record(0x0C),
            hex!("030490980030791D01").to_vec(),
            false,
        );
        assert_eq!(sam.commands[1].as_ref(), hex!("808A020C09030490980030791D01"));
        assert!(result.is_err());
    }
}
