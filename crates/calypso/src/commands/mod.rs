//! Calypso command catalog
//!
//! Every command the terminal can send is one variant of [`PoCommand`] or
//! [`SamCommand`]. Each variant carries a typed parameter struct whose
//! constructor validates the parameters, so an inconsistent command is
//! rejected before anything reaches a card. Responses go back through the
//! same enum, which checks the status word against the command's own status
//! table and decodes the payload.

pub mod po;
pub mod sam;
pub mod select;

use std::fmt;

use bytes::Bytes;
use calypso_apdu_core::{CardTransport, Command, Response, StatusWord};
use tracing::{Level, debug, info, warn};

use crate::{Error, Result};

pub use po::{PoCommand, PoResponse};
pub use sam::{SamCommand, SamResponse};
pub use select::{FileOccurrence, SelectApplication};

/// Closed set of command kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    /// ISO SELECT by AID
    SelectApplication,
    /// PO GET DATA (FCI)
    GetDataFci,
    /// PO OPEN SECURE SESSION
    OpenSession,
    /// PO READ RECORD(S)
    ReadRecords,
    /// PO UPDATE RECORD
    UpdateRecord,
    /// PO WRITE RECORD
    WriteRecord,
    /// PO APPEND RECORD
    AppendRecord,
    /// PO INCREASE
    Increase,
    /// PO DECREASE
    Decrease,
    /// PO CLOSE SECURE SESSION
    CloseSession,
    /// PO ratification frame
    Ratification,
    /// Caller supplied PO command
    Custom,
    /// SAM SELECT DIVERSIFIER
    SelectDiversifier,
    /// SAM GET CHALLENGE
    GetChallenge,
    /// SAM DIGEST INIT
    DigestInit,
    /// SAM DIGEST UPDATE
    DigestUpdate,
    /// SAM DIGEST UPDATE MULTIPLE
    DigestUpdateMultiple,
    /// SAM DIGEST CLOSE
    DigestClose,
    /// SAM DIGEST AUTHENTICATE
    DigestAuthenticate,
    /// SAM GIVE RANDOM
    GiveRandom,
}

impl CommandKind {
    /// Human readable name, used in logs and errors
    pub const fn name(self) -> &'static str {
        match self {
            Self::SelectApplication => "Select Application",
            Self::GetDataFci => "Get Data FCI",
            Self::OpenSession => "Open Secure Session",
            Self::ReadRecords => "Read Records",
            Self::UpdateRecord => "Update Record",
            Self::WriteRecord => "Write Record",
            Self::AppendRecord => "Append Record",
            Self::Increase => "Increase",
            Self::Decrease => "Decrease",
            Self::CloseSession => "Close Secure Session",
            Self::Ratification => "Ratification",
            Self::Custom => "Custom",
            Self::SelectDiversifier => "Select Diversifier",
            Self::GetChallenge => "Get Challenge",
            Self::DigestInit => "Digest Init",
            Self::DigestUpdate => "Digest Update",
            Self::DigestUpdateMultiple => "Digest Update Multiple",
            Self::DigestClose => "Digest Close",
            Self::DigestAuthenticate => "Digest Authenticate",
            Self::GiveRandom => "Give Random",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One row of a command status table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusEntry {
    /// Status word
    pub status: StatusWord,
    /// Whether the command succeeded
    pub successful: bool,
    /// Meaning of the status word for this command
    pub message: &'static str,
}

const fn ok(sw: u16, message: &'static str) -> StatusEntry {
    StatusEntry {
        status: StatusWord::from_u16(sw),
        successful: true,
        message,
    }
}

const fn fail(sw: u16, message: &'static str) -> StatusEntry {
    StatusEntry {
        status: StatusWord::from_u16(sw),
        successful: false,
        message,
    }
}

/// Static description of a command kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandDescriptor {
    /// Command kind
    pub kind: CommandKind,
    /// Human readable name
    pub name: &'static str,
    /// Instruction byte
    pub instruction: u8,
    /// Known status words
    pub status_table: &'static [StatusEntry],
}

impl CommandDescriptor {
    /// Look up a status word in the table
    pub fn lookup(&self, status: StatusWord) -> Option<&'static StatusEntry> {
        self.status_table.iter().find(|entry| entry.status == status)
    }

    /// Map the response status word through the status table
    ///
    /// `extra_success` lists status words the caller also accepts.
    pub fn check(&self, response: &Response, extra_success: &[StatusWord]) -> Result<()> {
        let status = response.status();
        if extra_success.contains(&status) {
            return Ok(());
        }
        match self.lookup(status) {
            Some(entry) if entry.successful => Ok(()),
            Some(entry) => {
                log_failure(self.name, status, entry.message);
                Err(Error::CommandFailed {
                    command: self.name,
                    status,
                    message: entry.message,
                })
            }
            None => {
                log_failure(self.name, status, status.description());
                Err(Error::UnexpectedStatus {
                    command: self.name,
                    status,
                    response: response.to_bytes(),
                })
            }
        }
    }

    /// Whether the status word is successful for this command
    pub fn is_successful(&self, status: StatusWord) -> bool {
        self.lookup(status).is_some_and(|entry| entry.successful)
    }
}

fn log_failure(command: &str, status: StatusWord, message: &str) {
    let level = status.tracing_level();
    if level == Level::WARN {
        warn!(command, %status, message, "Command failed");
    } else if level == Level::INFO {
        info!(command, %status, message, "Command failed");
    } else {
        debug!(command, %status, message, "Command failed");
    }
}

macro_rules! descriptor {
    ($kind:ident, $ins:expr, [$($entry:expr),* $(,)?]) => {
        CommandDescriptor {
            kind: CommandKind::$kind,
            name: CommandKind::$kind.name(),
            instruction: $ins,
            status_table: &[$($entry),*],
        }
    };
}

mod tables {
    use super::{CommandDescriptor, CommandKind, fail, ok};
    use crate::constants::ins;

    pub(super) static SELECT_APPLICATION: CommandDescriptor = descriptor!(SelectApplication, ins::SELECT, [
        ok(0x9000, "Successful execution"),
        fail(0x6283, "Selected application invalidated"),
        fail(0x6A82, "Application not found"),
        fail(0x6A86, "Incorrect P1 or P2"),
        fail(0x6700, "Lc value not supported"),
    ]);

    pub(super) static GET_DATA_FCI: CommandDescriptor = descriptor!(GetDataFci, ins::GET_DATA, [
        ok(0x9000, "Successful execution"),
        ok(0x6283, "Successful execution, FCI request and DF is invalidated"),
        fail(0x6A88, "Data object not found"),
        fail(0x6B00, "P1 or P2 value not supported"),
    ]);

    pub(super) static OPEN_SESSION: CommandDescriptor = descriptor!(OpenSession, ins::OPEN_SESSION, [
        ok(0x9000, "Successful execution"),
        fail(0x6700, "Lc value not supported"),
        fail(0x6900, "Transaction counter is 0"),
        fail(0x6981, "Command forbidden, read requested and current EF is a binary file"),
        fail(0x6982, "Security conditions not fulfilled"),
        fail(0x6985, "Access forbidden, never access mode or session already opened"),
        fail(0x6986, "Command not allowed, read requested and no current EF"),
        fail(0x6A81, "Wrong key index"),
        fail(0x6A82, "File not found"),
        fail(0x6A83, "Record not found"),
        fail(0x6B00, "P1 or P2 value not supported"),
    ]);

    pub(super) static READ_RECORDS: CommandDescriptor = descriptor!(ReadRecords, ins::READ_RECORDS, [
        ok(0x9000, "Successful execution"),
        fail(0x6981, "Command forbidden on binary files"),
        fail(0x6982, "Security conditions not fulfilled"),
        fail(0x6985, "Access forbidden"),
        fail(0x6986, "Command not allowed, no current EF"),
        fail(0x6A82, "File not found"),
        fail(0x6A83, "Record not found"),
        fail(0x6B00, "P2 value not supported"),
    ]);

    pub(super) static UPDATE_RECORD: CommandDescriptor = descriptor!(UpdateRecord, ins::UPDATE_RECORD, [
        ok(0x9000, "Successful execution"),
        fail(0x6400, "Too many modifications in session"),
        fail(0x6700, "Lc value not supported"),
        fail(0x6981, "Command forbidden on cyclic or binary files"),
        fail(0x6982, "Security conditions not fulfilled"),
        fail(0x6985, "Access forbidden"),
        fail(0x6986, "Command not allowed, no current EF"),
        fail(0x6A82, "File not found"),
        fail(0x6A83, "Record not found"),
        fail(0x6B00, "P1 or P2 value not supported"),
    ]);

    pub(super) static WRITE_RECORD: CommandDescriptor = descriptor!(WriteRecord, ins::WRITE_RECORD, [
        ok(0x9000, "Successful execution"),
        fail(0x6400, "Too many modifications in session"),
        fail(0x6700, "Lc value not supported"),
        fail(0x6981, "Command forbidden on cyclic or binary files"),
        fail(0x6982, "Security conditions not fulfilled"),
        fail(0x6985, "Access forbidden"),
        fail(0x6986, "Command not allowed, no current EF"),
        fail(0x6A82, "File not found"),
        fail(0x6A83, "Record not found"),
        fail(0x6B00, "P1 or P2 value not supported"),
    ]);

    pub(super) static APPEND_RECORD: CommandDescriptor = descriptor!(AppendRecord, ins::APPEND_RECORD, [
        ok(0x9000, "Successful execution"),
        fail(0x6400, "Too many modifications in session"),
        fail(0x6700, "Lc value not supported"),
        fail(0x6981, "Command forbidden, not a cyclic file"),
        fail(0x6982, "Security conditions not fulfilled"),
        fail(0x6985, "Access forbidden"),
        fail(0x6986, "Command not allowed, no current EF"),
        fail(0x6A82, "File not found"),
        fail(0x6B00, "P1 or P2 value not supported"),
    ]);

    pub(super) static INCREASE: CommandDescriptor = descriptor!(Increase, ins::INCREASE, [
        ok(0x9000, "Successful execution"),
        fail(0x6400, "Too many modifications in session"),
        fail(0x6700, "Lc value not supported"),
        fail(0x6981, "Command forbidden, not a counters file"),
        fail(0x6982, "Security conditions not fulfilled"),
        fail(0x6985, "Access forbidden"),
        fail(0x6986, "Command not allowed, no current EF"),
        fail(0x6A80, "Overflow error"),
        fail(0x6A82, "File not found"),
        fail(0x6A83, "Counter not found"),
        fail(0x6B00, "P1 or P2 value not supported"),
    ]);

    pub(super) static DECREASE: CommandDescriptor = descriptor!(Decrease, ins::DECREASE, [
        ok(0x9000, "Successful execution"),
        fail(0x6400, "Too many modifications in session"),
        fail(0x6700, "Lc value not supported"),
        fail(0x6981, "Command forbidden, not a counters file"),
        fail(0x6982, "Security conditions not fulfilled"),
        fail(0x6985, "Access forbidden"),
        fail(0x6986, "Command not allowed, no current EF"),
        fail(0x6A80, "Underflow error"),
        fail(0x6A82, "File not found"),
        fail(0x6A83, "Counter not found"),
        fail(0x6B00, "P1 or P2 value not supported"),
    ]);

    pub(super) static CLOSE_SESSION: CommandDescriptor = descriptor!(CloseSession, ins::CLOSE_SESSION, [
        ok(0x9000, "Successful execution"),
        fail(0x6700, "Lc signature not supported"),
        fail(0x6985, "No session was opened"),
        fail(0x6988, "Incorrect signature"),
        fail(0x6B00, "P1 or P2 value not supported"),
    ]);

    pub(super) static RATIFICATION: CommandDescriptor = descriptor!(Ratification, ins::READ_RECORDS, [
        ok(0x9000, "Successful execution"),
        ok(0x6B00, "Ratified, frame rejected by the card"),
    ]);

    pub(super) static CUSTOM: CommandDescriptor = descriptor!(Custom, 0x00, [
        ok(0x9000, "Successful execution"),
    ]);

    pub(super) static SELECT_DIVERSIFIER: CommandDescriptor = descriptor!(SelectDiversifier, ins::SELECT_DIVERSIFIER, [
        ok(0x9000, "Successful execution"),
        fail(0x6700, "Incorrect Lc"),
        fail(0x6985, "Preconditions not satisfied, a session is running"),
    ]);

    pub(super) static GET_CHALLENGE: CommandDescriptor = descriptor!(GetChallenge, ins::GET_CHALLENGE, [
        ok(0x9000, "Successful execution"),
        fail(0x6700, "Incorrect Le"),
        fail(0x6B00, "Incorrect P1 or P2"),
    ]);

    pub(super) static DIGEST_INIT: CommandDescriptor = descriptor!(DigestInit, ins::DIGEST_INIT, [
        ok(0x9000, "Successful execution"),
        fail(0x6700, "Incorrect Lc"),
        fail(0x6900, "An event counter cannot be incremented"),
        fail(0x6985, "Preconditions not satisfied"),
        fail(0x6A00, "Incorrect P1 or P2"),
        fail(0x6A83, "Record not found, ciphering key not found"),
    ]);

    pub(super) static DIGEST_UPDATE: CommandDescriptor = descriptor!(DigestUpdate, ins::DIGEST_UPDATE, [
        ok(0x9000, "Successful execution"),
        fail(0x6700, "Incorrect Lc"),
        fail(0x6985, "Preconditions not satisfied, no session running"),
        fail(0x6B00, "Incorrect P1 or P2"),
    ]);

    pub(super) static DIGEST_UPDATE_MULTIPLE: CommandDescriptor = descriptor!(DigestUpdateMultiple, ins::DIGEST_UPDATE, [
        ok(0x9000, "Successful execution"),
        fail(0x6700, "Incorrect Lc"),
        fail(0x6985, "Preconditions not satisfied, no session running"),
        fail(0x6A80, "Incorrect value in the incoming data"),
        fail(0x6B00, "Incorrect P1"),
    ]);

    pub(super) static DIGEST_CLOSE: CommandDescriptor = descriptor!(DigestClose, ins::DIGEST_CLOSE, [
        ok(0x9000, "Successful execution"),
        fail(0x6700, "Incorrect Le"),
        fail(0x6985, "Preconditions not satisfied, no session running"),
    ]);

    pub(super) static DIGEST_AUTHENTICATE: CommandDescriptor = descriptor!(DigestAuthenticate, ins::DIGEST_AUTHENTICATE, [
        ok(0x9000, "Successful execution"),
        fail(0x6700, "Incorrect Lc"),
        fail(0x6985, "Preconditions not satisfied, no session running"),
        fail(0x6988, "Incorrect signature"),
    ]);

    pub(super) static GIVE_RANDOM: CommandDescriptor = descriptor!(GiveRandom, ins::GIVE_RANDOM, [
        ok(0x9000, "Successful execution"),
        fail(0x6700, "Incorrect Lc"),
    ]);

    /// Table lookup by kind
    pub(super) fn of(kind: CommandKind) -> &'static CommandDescriptor {
        match kind {
            CommandKind::SelectApplication => &SELECT_APPLICATION,
            CommandKind::GetDataFci => &GET_DATA_FCI,
            CommandKind::OpenSession => &OPEN_SESSION,
            CommandKind::ReadRecords => &READ_RECORDS,
            CommandKind::UpdateRecord => &UPDATE_RECORD,
            CommandKind::WriteRecord => &WRITE_RECORD,
            CommandKind::AppendRecord => &APPEND_RECORD,
            CommandKind::Increase => &INCREASE,
            CommandKind::Decrease => &DECREASE,
            CommandKind::CloseSession => &CLOSE_SESSION,
            CommandKind::Ratification => &RATIFICATION,
            CommandKind::Custom => &CUSTOM,
            CommandKind::SelectDiversifier => &SELECT_DIVERSIFIER,
            CommandKind::GetChallenge => &GET_CHALLENGE,
            CommandKind::DigestInit => &DIGEST_INIT,
            CommandKind::DigestUpdate => &DIGEST_UPDATE,
            CommandKind::DigestUpdateMultiple => &DIGEST_UPDATE_MULTIPLE,
            CommandKind::DigestClose => &DIGEST_CLOSE,
            CommandKind::DigestAuthenticate => &DIGEST_AUTHENTICATE,
            CommandKind::GiveRandom => &GIVE_RANDOM,
        }
    }
}

impl CommandKind {
    /// Static descriptor of this kind
    pub fn descriptor(self) -> &'static CommandDescriptor {
        tables::of(self)
    }
}

/// Check that a byte field has one of the allowed lengths
pub(crate) fn check_length(field: &str, value: &[u8], allowed: &[usize]) -> Result<()> {
    if allowed.contains(&value.len()) {
        Ok(())
    } else {
        Err(Error::inconsistent(format!(
            "{field} must be {allowed:?} bytes long, got {}",
            value.len()
        )))
    }
}

/// Copy a fixed size slice out of a response payload
pub(crate) fn take<const N: usize>(payload: &[u8], offset: usize) -> Result<[u8; N]> {
    payload
        .get(offset..offset + N)
        .and_then(|slice| slice.try_into().ok())
        .ok_or_else(|| {
            Error::malformed(format!(
                "expected {N} bytes at offset {offset}, payload is {} bytes",
                payload.len()
            ))
        })
}

/// Send one frame and decode the response frame
///
/// Returns the raw response, status word included, next to the decoded one.
pub(crate) fn transmit<T: CardTransport>(
    transport: &mut T,
    command: &Command,
) -> Result<(Bytes, Response)> {
    let raw = transport.transmit_raw(&command.to_bytes())?;
    let response = Response::from_bytes(&raw)?;
    Ok((raw, response))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_table_lookup() {
        let descriptor = CommandKind::ReadRecords.descriptor();
        assert_eq!(descriptor.kind, CommandKind::ReadRecords);
        assert_eq!(descriptor.instruction, 0xB2);
        assert!(descriptor.check(&Response::success(Bytes::new()), &[]).is_ok());

        let err = descriptor.check(&Response::error(0x6A83), &[]).unwrap_err();
        assert!(matches!(
            err,
            Error::CommandFailed { message: "Record not found", .. }
        ));
        assert_eq!(err.status(), Some(StatusWord::from_u16(0x6A83)));
    }

    #[test]
    fn test_unknown_status_keeps_raw_response() {
        let response = Response::new(Bytes::from_static(&[0x01]), 0x6F00);
        let err = CommandKind::UpdateRecord
            .descriptor()
            .check(&response, &[])
            .unwrap_err();
        match err {
            Error::UnexpectedStatus { command, status, response } => {
                assert_eq!(command, "Update Record");
                assert_eq!(command, CommandKind::UpdateRecord.to_string());
                assert_eq!(status.to_u16(), 0x6F00);
                assert_eq!(response.as_ref(), &[0x01, 0x6F, 0x00]);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_ratification_accepts_wrong_parameters() {
        let descriptor = CommandKind::Ratification.descriptor();
        assert!(descriptor.is_successful(StatusWord::from_u16(0x6B00)));
        assert!(descriptor.is_successful(StatusWord::from_u16(0x9000)));
        assert!(!descriptor.is_successful(StatusWord::from_u16(0x6985)));
    }

    #[test]
    fn test_extra_success_codes() {
        let descriptor = CommandKind::Custom.descriptor();
        let response = Response::error(0x6200);
        assert!(descriptor.check(&response, &[]).is_err());
        assert!(descriptor.check(&response, &[StatusWord::from_u16(0x6200)]).is_ok());
    }

    #[test]
    fn test_take() {
        let payload = [1u8, 2, 3, 4, 5];
        assert_eq!(take::<3>(&payload, 2).unwrap(), [3, 4, 5]);
        assert!(matches!(take::<3>(&payload, 3), Err(Error::MalformedResponse(_))));
    }
}
