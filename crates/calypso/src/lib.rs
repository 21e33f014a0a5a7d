//! Calypso terminal transactions
//!
//! This crate drives a Calypso card (PO) and a Secure Access Module (SAM)
//! over any [`CardTransport`]:
//!
//! - the command catalog builds byte-exact, revision dependent frames and
//!   decodes their responses
//! - the selector identifies a card by ATR or by AID
//! - [`PoTransaction`] runs the secure session, chaining every PO exchange
//!   into the SAM digest and checking the card signature at closure
//!
//! The main entry point is [`PoTransaction`].
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![forbid(unsafe_code)]
#![warn(missing_docs, rustdoc::missing_crate_level_docs)]

pub mod commands;
pub mod config;
pub mod constants;
pub mod digest;
pub mod error;
pub mod fci;
pub mod revision;
pub mod sam;
pub mod selector;
pub mod session;
pub mod transaction;

pub use calypso_apdu_core::{CardTransport, Command, Response, StatusWord, TransportError};

pub use commands::{CommandKind, PoCommand, PoResponse, SamCommand, SamResponse};
pub use config::{AccessLevel, CommunicationMode, DigestUpdateMode, SessionConfig, SignatureLength};
pub use digest::DigestSession;
pub use error::{Error, Result};
pub use fci::{CalypsoPo, SerialNumber, StartupInfo};
pub use revision::{PoRevision, SamRevision};
pub use sam::CalypsoSam;
pub use selector::{
    AidSelector, AtrFilter, ChannelState, SelectionOutcome, SelectionRequest, SelectionTarget,
};
pub use session::{Exchange, SecureSession, SessionFailure, SessionState};
pub use transaction::PoTransaction;

/// Prelude module containing commonly used traits and types
pub mod prelude {
    pub use crate::{
        AccessLevel, CalypsoPo, CalypsoSam, CardTransport, Error, PoCommand, PoRevision,
        PoTransaction, Result, SamRevision, SelectionRequest, SelectionTarget, SessionConfig,
        SessionState,
        commands::po::{
            AppendRecord, ChangeCounter, CounterDirection, ReadMode, ReadRecords, UpdateRecord,
            WriteRecord,
        },
    };
}
