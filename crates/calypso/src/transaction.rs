//! Secure transaction between a terminal, a PO and a SAM
//!
//! [`PoTransaction`] owns the PO and SAM channels for its whole lifetime
//! (pass `&mut transport` to keep using a channel afterwards). While a
//! session is open, every PO exchange is fed to the SAM digest so the
//! closing signatures cover the whole transaction.

use bytes::Bytes;
use calypso_apdu_core::{CardTransport, MAX_DATA_LENGTH};
use tracing::{debug, instrument, warn};

use crate::{
    Error, Result,
    commands::{
        PoCommand, PoResponse, transmit,
        po::{CloseSession, CloseSessionResponse, OpenSession, OpenSessionResponse, Ratification},
        sam::{DigestUpdateMultiple, GetChallenge, GiveRandom, SamResponse, WorkKey},
    },
    config::{AccessLevel, CommunicationMode, DigestUpdateMode, SessionConfig},
    constants::kif,
    digest::{DigestSession, exchange},
    fci::CalypsoPo,
    revision::PoRevision,
    sam::CalypsoSam,
    session::{Exchange, SecureSession, SessionFailure, SessionState},
};

/// Transaction with a PO, secured by a SAM
#[derive(Debug)]
pub struct PoTransaction<P: CardTransport, S: CardTransport> {
    po: P,
    sam: S,
    calypso_po: CalypsoPo,
    calypso_sam: CalypsoSam,
    config: SessionConfig,
    session: SecureSession,
    digest: Option<DigestSession>,
}

impl<P: CardTransport, S: CardTransport> PoTransaction<P, S> {
    /// Create a transaction on a selected PO and an identified SAM
    pub fn new(
        po: P,
        calypso_po: CalypsoPo,
        sam: S,
        calypso_sam: CalypsoSam,
        config: SessionConfig,
    ) -> Self {
        Self {
            po,
            sam,
            calypso_po,
            calypso_sam,
            config,
            session: SecureSession::default(),
            digest: None,
        }
    }

    /// The selected PO
    pub const fn calypso_po(&self) -> &CalypsoPo {
        &self.calypso_po
    }

    /// The SAM securing the transaction
    pub const fn calypso_sam(&self) -> &CalypsoSam {
        &self.calypso_sam
    }

    /// Session configuration
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Session state and data
    pub const fn session(&self) -> &SecureSession {
        &self.session
    }

    /// SAM digest, once the session is opened
    pub const fn digest(&self) -> Option<&DigestSession> {
        self.digest.as_ref()
    }

    fn revision(&self) -> PoRevision {
        self.calypso_po.revision()
    }

    /// Open a secure session
    ///
    /// `record_number` 0 opens without reading a record. On success the
    /// decoded Open Secure Session response is returned, with the record
    /// read by the PO if any.
    #[instrument(skip(self), fields(revision = %self.revision()))]
    pub fn open_session(
        &mut self,
        access_level: AccessLevel,
        sfi: u8,
        record_number: u8,
    ) -> Result<OpenSessionResponse> {
        match self.session.state {
            SessionState::NotOpen => {}
            SessionState::Open => return Err(Error::SessionProtocol("session already open")),
            SessionState::Closed => return Err(Error::SessionProtocol("session already closed")),
        }

        let revision = self.revision();
        let sam_revision = self.calypso_sam.revision();
        let challenge_length = revision.challenge_length();

        // Reject inconsistent parameters before the SAM is involved
        OpenSession::new(
            revision,
            access_level.key_index(),
            sfi,
            record_number,
            vec![0u8; challenge_length],
        )?;

        let get_challenge = GetChallenge::new(sam_revision, challenge_length as u8)?;
        let terminal_challenge = match exchange(&mut self.sam, get_challenge.into())? {
            SamResponse::Challenge(challenge) => challenge,
            _ => return Err(Error::malformed("Get Challenge returned no challenge")),
        };

        let open = OpenSession::new(
            revision,
            access_level.key_index(),
            sfi,
            record_number,
            terminal_challenge.clone(),
        )?;
        let (_, response) = transmit(&mut self.po, &open.build()?)?;
        let opened = open.parse(&response)?;

        // The PO is in session from here on, failures close it
        let key = match self.config.work_key_record(access_level) {
            Some(record) => WorkKey::Record(record),
            None => WorkKey::Kif {
                kif: opened
                    .kif
                    .filter(|&value| value != kif::UNDEFINED)
                    .unwrap_or_else(|| self.config.default_kif(access_level)),
                kvc: opened.kvc,
            },
        };
        let digest = DigestSession::init(
            &mut self.sam,
            sam_revision,
            revision == PoRevision::Rev3_2,
            Bytes::copy_from_slice(&**self.calypso_po.serial_number()),
            key,
            opened.data.clone(),
            self.config.encrypted_digest,
        );
        let digest = match digest {
            Ok(digest) => digest,
            Err(e) => {
                warn!(error = %e, "SAM failed to initialize the session digest");
                self.session.fail(SessionFailure::DigestFailed);
                return Err(e);
            }
        };

        self.digest = Some(digest);
        self.session = SecureSession {
            state: SessionState::Open,
            revision: Some(revision),
            terminal_challenge,
            card_challenge: opened.card_challenge.clone(),
            transaction_counter: Some(opened.transaction_counter),
            previous_session_ratified: opened.previous_session_ratified,
            ..Default::default()
        };
        debug!(
            counter = opened.transaction_counter,
            previous_ratified = opened.previous_session_ratified,
            "Secure session opened"
        );
        Ok(opened)
    }

    /// Send PO commands, digesting them when a session is open
    ///
    /// Responses come back in command order. A failing command stops the
    /// batch and returns its error; an open session stays open.
    #[instrument(skip_all, fields(count = commands.len(), state = %self.session.state))]
    pub fn process_po_commands(&mut self, commands: &[PoCommand]) -> Result<Vec<PoResponse>> {
        if commands.iter().any(PoCommand::is_session_control) {
            return Err(Error::SessionProtocol(
                "secure session commands go through open_session and close_session",
            ));
        }
        match self.session.state {
            SessionState::Closed => {
                return Err(Error::SessionProtocol("session already closed"));
            }
            SessionState::Open if !commands.iter().all(PoCommand::is_session_compatible) => {
                return Err(Error::SessionProtocol("command not allowed in a secure session"));
            }
            SessionState::Open | SessionState::NotOpen => {}
        }

        let frames = commands
            .iter()
            .map(PoCommand::build)
            .collect::<Result<Vec<_>>>()?;

        // Each command frame must fit one Digest Update
        if self.session.is_open() {
            let oversized = commands
                .iter()
                .zip(&frames)
                .find(|(_, frame)| frame.command_length() > MAX_DATA_LENGTH);
            if let Some((command, frame)) = oversized {
                return Err(Error::inconsistent(format!(
                    "{} frame of {} bytes is too long to digest, at most {MAX_DATA_LENGTH}",
                    command.kind(),
                    frame.command_length()
                )));
            }
        }

        let mut responses = Vec::with_capacity(commands.len());
        for (command, frame) in commands.iter().zip(&frames) {
            let (raw, response) = transmit(&mut self.po, frame)?;
            if self.session.is_open() {
                self.digest_exchange(frame.to_bytes(), raw)?;
            }
            responses.push(command.parse(&response)?);
        }
        Ok(responses)
    }

    /// Feed one exchange to the SAM, command first
    fn digest_exchange(&mut self, command: Bytes, response: Bytes) -> Result<()> {
        let Some(digest) = self.digest.as_mut() else {
            return Err(Error::SessionProtocol("no digest in progress"));
        };

        let parts = [command, response];
        let multiple = self.config.digest_update_mode == DigestUpdateMode::Multiple
            && DigestUpdateMultiple::encoded_length(&parts) <= MAX_DATA_LENGTH;
        let result = if multiple {
            digest.update_multiple(&mut self.sam, &parts)
        } else {
            parts
                .iter()
                .try_for_each(|part| digest.update(&mut self.sam, part.clone()))
        };

        if let Err(e) = result {
            warn!(error = %e, "SAM failed to update the session digest");
            self.session.fail(SessionFailure::DigestFailed);
            return Err(e);
        }

        let [command, response] = parts;
        self.session.exchanges.push(Exchange { command, response });
        Ok(())
    }

    /// Close the secure session
    ///
    /// With `ratification_requested` the PO defers ratification; over a
    /// contactless link a ratification frame is sent after the closing.
    /// Any failure closes the session with a [`SessionFailure`].
    #[instrument(skip(self))]
    pub fn close_session(&mut self, ratification_requested: bool) -> Result<CloseSessionResponse> {
        if !self.session.is_open() {
            return Err(Error::SessionProtocol("no open session to close"));
        }
        self.session.ratification_requested = ratification_requested;

        match self.try_close(ratification_requested) {
            Ok(response) => {
                self.session.state = SessionState::Closed;
                debug!(ratified = self.session.ratified, "Secure session closed");
                Ok(response)
            }
            Err(e) if e.is_security_failure() => {
                warn!("Card session signature rejected by the SAM");
                self.session.fail(SessionFailure::AuthenticationFailed);
                Err(e)
            }
            Err(e) => {
                warn!(error = %e, "Secure session closing failed");
                self.session.fail(SessionFailure::CloseFailed);
                Err(e)
            }
        }
    }

    fn try_close(&mut self, ratification_requested: bool) -> Result<CloseSessionResponse> {
        let revision = self.revision();
        let Some(digest) = self.digest.as_mut() else {
            return Err(Error::SessionProtocol("no digest in progress"));
        };

        let signature = digest.close(&mut self.sam, self.config.signature_length.length())?;
        self.session.terminal_signature = signature.clone();

        let close = CloseSession::new(revision, ratification_requested, signature)?;
        let (_, response) = transmit(&mut self.po, &close.build()?)?;
        let closing = close.parse(&response)?;
        self.session.record_closing(&closing);

        if !digest.authenticate(&mut self.sam, closing.signature_lo.clone())? {
            return Err(Error::SecurityAuthenticationFailure);
        }

        self.session.ratified = match (ratification_requested, self.config.communication_mode) {
            (true, CommunicationMode::Contactless) => self.ratify(),
            _ => true,
        };
        Ok(closing)
    }

    /// Send the ratification frame, reporting whether the PO accepted it
    fn ratify(&mut self) -> bool {
        let ratification = Ratification::new(self.revision());
        let result = transmit(&mut self.po, &ratification.build())
            .and_then(|(_, response)| ratification.parse(&response));
        match result {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Ratification failed");
                false
            }
        }
    }

    /// Abort the open secure session
    ///
    /// The session ends `Closed` with [`SessionFailure::Aborted`] whatever
    /// the PO answers.
    #[instrument(skip(self))]
    pub fn abort_session(&mut self) -> Result<()> {
        if !self.session.is_open() {
            return Err(Error::SessionProtocol("no open session to abort"));
        }
        self.session.fail(SessionFailure::Aborted);
        debug!("Secure session aborted");

        let abort = CloseSession::abort(self.revision());
        let (_, response) = transmit(&mut self.po, &abort.build()?)?;
        abort.parse(&response).map(|_| ())
    }

    /// Give a fresh random to the SAM and return it
    pub fn give_random_to_sam(&mut self) -> Result<[u8; 8]> {
        let command = GiveRandom::with_random(self.calypso_sam.revision());
        let random = *command.random();
        exchange(&mut self.sam, command.into())?;
        Ok(random)
    }
}

impl<P: CardTransport, S: CardTransport> Drop for PoTransaction<P, S> {
    fn drop(&mut self) {
        if self.session.is_open() {
            warn!("Transaction dropped with a secure session still open");
        }
    }
}
