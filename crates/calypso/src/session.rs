//! Secure session data
//!
//! A session moves `NotOpen -> Open -> Closed` and never goes back. A
//! session that could not close properly still ends `Closed`, with a
//! [`SessionFailure`] recording why.

use bytes::Bytes;
use derive_more::Display;

use crate::{commands::po::CloseSessionResponse, revision::PoRevision};

/// Secure session state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display)]
pub enum SessionState {
    /// No session opened yet
    #[default]
    #[display("not open")]
    NotOpen,
    /// Session opened, exchanges are digested
    #[display("open")]
    Open,
    /// Session closed, successfully or not
    #[display("closed")]
    Closed,
}

/// Why a session ended without a verified closing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum SessionFailure {
    /// The terminal aborted the session
    #[display("aborted")]
    Aborted,
    /// The SAM rejected the card signature
    #[display("card signature rejected")]
    AuthenticationFailed,
    /// The SAM failed to initialize or update the digest
    #[display("digest failure")]
    DigestFailed,
    /// A closing step failed before the card signature could be checked
    #[display("close failure")]
    CloseFailed,
}

/// One digested exchange with the PO
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    /// Raw command frame
    pub command: Bytes,
    /// Raw response frame, status word included
    pub response: Bytes,
}

/// State and data of one secure session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecureSession {
    pub(crate) state: SessionState,
    pub(crate) revision: Option<PoRevision>,
    pub(crate) terminal_challenge: Bytes,
    pub(crate) card_challenge: Bytes,
    pub(crate) transaction_counter: Option<u32>,
    pub(crate) previous_session_ratified: bool,
    pub(crate) ratification_requested: bool,
    pub(crate) ratified: bool,
    pub(crate) exchanges: Vec<Exchange>,
    pub(crate) terminal_signature: Bytes,
    pub(crate) card_signature_lo: Bytes,
    pub(crate) postponed_data: Bytes,
    pub(crate) failure: Option<SessionFailure>,
}

impl SecureSession {
    /// Current state
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Whether the session is open
    pub fn is_open(&self) -> bool {
        self.state == SessionState::Open
    }

    /// PO revision the session was opened with
    pub const fn revision(&self) -> Option<PoRevision> {
        self.revision
    }

    /// Challenge the SAM generated for Open Secure Session
    pub fn terminal_challenge(&self) -> &[u8] {
        &self.terminal_challenge
    }

    /// Challenge returned by the PO
    pub fn card_challenge(&self) -> &[u8] {
        &self.card_challenge
    }

    /// PO transaction counter read at opening
    pub const fn transaction_counter(&self) -> Option<u32> {
        self.transaction_counter
    }

    /// Whether the PO reported the previous session as ratified
    pub const fn previous_session_ratified(&self) -> bool {
        self.previous_session_ratified
    }

    /// Whether the closing asked for a deferred ratification
    pub const fn ratification_requested(&self) -> bool {
        self.ratification_requested
    }

    /// Whether the session is known to be ratified
    pub const fn ratified(&self) -> bool {
        self.ratified
    }

    /// Exchanges digested while open, in transmission order
    pub fn exchanges(&self) -> &[Exchange] {
        &self.exchanges
    }

    /// Terminal signature sent in Close Secure Session
    pub fn terminal_signature(&self) -> &[u8] {
        &self.terminal_signature
    }

    /// Card signature returned by Close Secure Session
    pub fn card_signature_lo(&self) -> &[u8] {
        &self.card_signature_lo
    }

    /// Data the PO postponed to the closing
    pub fn postponed_data(&self) -> &[u8] {
        &self.postponed_data
    }

    /// Why the session ended without a verified closing, if it did
    pub const fn failure(&self) -> Option<SessionFailure> {
        self.failure
    }

    /// Whether the session ended with a verified card signature
    pub fn is_successful(&self) -> bool {
        self.state == SessionState::Closed && self.failure.is_none()
    }

    pub(crate) fn record_closing(&mut self, response: &CloseSessionResponse) {
        self.card_signature_lo = response.signature_lo.clone();
        self.postponed_data = response.postponed_data.clone();
    }

    pub(crate) fn fail(&mut self, failure: SessionFailure) {
        self.state = SessionState::Closed;
        self.failure = Some(failure);
    }
}
