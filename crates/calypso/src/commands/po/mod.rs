//! PO (card) commands

pub mod append_record;
pub mod change_counter;
pub mod close_session;
pub mod custom;
pub mod get_data_fci;
pub mod open_session;
pub mod ratification;
pub mod read_records;
pub mod update_record;

use bytes::Bytes;
use calypso_apdu_core::{Command, Response};
use derive_more::From;

use crate::{Result, commands::CommandKind};

pub use append_record::AppendRecord;
pub use change_counter::{ChangeCounter, CounterDirection};
pub use close_session::{CloseSession, CloseSessionResponse};
pub use custom::CustomCommand;
pub use get_data_fci::GetDataFci;
pub use open_session::{OpenSession, OpenSessionResponse};
pub use ratification::Ratification;
pub use read_records::{ReadMode, ReadRecords, Records};
pub use update_record::{UpdateRecord, WriteRecord};

/// Any command the terminal sends to a PO
#[derive(Debug, Clone, PartialEq, Eq, From)]
pub enum PoCommand {
    /// GET DATA (FCI)
    GetDataFci(GetDataFci),
    /// OPEN SECURE SESSION
    OpenSession(OpenSession),
    /// READ RECORD(S)
    ReadRecords(ReadRecords),
    /// UPDATE RECORD
    UpdateRecord(UpdateRecord),
    /// WRITE RECORD
    WriteRecord(WriteRecord),
    /// APPEND RECORD
    AppendRecord(AppendRecord),
    /// INCREASE or DECREASE
    ChangeCounter(ChangeCounter),
    /// CLOSE SECURE SESSION
    CloseSession(CloseSession),
    /// Ratification frame
    Ratification(Ratification),
    /// Caller supplied frame
    Custom(CustomCommand),
}

/// Typed result of a PO command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoResponse {
    /// Raw FCI
    Fci(Bytes),
    /// Open Secure Session data
    OpenSession(OpenSessionResponse),
    /// Record contents
    Records(Records),
    /// New counter value, if returned
    Counter(Option<u32>),
    /// Command without response data
    Completed,
    /// Close Secure Session data
    CloseSession(CloseSessionResponse),
    /// Response of a custom command
    Custom(Response),
}

impl PoCommand {
    /// Command kind
    pub const fn kind(&self) -> CommandKind {
        match self {
            Self::GetDataFci(_) => CommandKind::GetDataFci,
            Self::OpenSession(_) => CommandKind::OpenSession,
            Self::ReadRecords(_) => CommandKind::ReadRecords,
            Self::UpdateRecord(_) => CommandKind::UpdateRecord,
            Self::WriteRecord(_) => CommandKind::WriteRecord,
            Self::AppendRecord(_) => CommandKind::AppendRecord,
            Self::ChangeCounter(command) => command.direction().kind(),
            Self::CloseSession(_) => CommandKind::CloseSession,
            Self::Ratification(_) => CommandKind::Ratification,
            Self::Custom(_) => CommandKind::Custom,
        }
    }

    /// Whether the command may be sent, and digested, in a secure session
    pub const fn is_session_compatible(&self) -> bool {
        match self {
            Self::ReadRecords(_)
            | Self::UpdateRecord(_)
            | Self::WriteRecord(_)
            | Self::AppendRecord(_)
            | Self::ChangeCounter(_) => true,
            Self::Custom(command) => command.is_sendable_in_session(),
            Self::GetDataFci(_)
            | Self::OpenSession(_)
            | Self::CloseSession(_)
            | Self::Ratification(_) => false,
        }
    }

    /// Whether the command opens or closes a secure session
    ///
    /// These frames only go out through the transaction's own session
    /// operations.
    pub const fn is_session_control(&self) -> bool {
        matches!(self, Self::OpenSession(_) | Self::CloseSession(_))
    }

    /// Encode the frame
    pub fn build(&self) -> Result<Command> {
        match self {
            Self::GetDataFci(command) => Ok(command.build()),
            Self::OpenSession(command) => command.build(),
            Self::ReadRecords(command) => Ok(command.build()),
            Self::UpdateRecord(command) => command.build(),
            Self::WriteRecord(command) => command.build(),
            Self::AppendRecord(command) => command.build(),
            Self::ChangeCounter(command) => command.build(),
            Self::CloseSession(command) => command.build(),
            Self::Ratification(command) => Ok(command.build()),
            Self::Custom(command) => Ok(command.build()),
        }
    }

    /// Decode the response of this command
    pub fn parse(&self, response: &Response) -> Result<PoResponse> {
        match self {
            Self::GetDataFci(command) => command.parse(response).map(PoResponse::Fci),
            Self::OpenSession(command) => command.parse(response).map(PoResponse::OpenSession),
            Self::ReadRecords(command) => command.parse(response).map(PoResponse::Records),
            Self::UpdateRecord(command) => command.parse(response).map(|()| PoResponse::Completed),
            Self::WriteRecord(command) => command.parse(response).map(|()| PoResponse::Completed),
            Self::AppendRecord(command) => command.parse(response).map(|()| PoResponse::Completed),
            Self::ChangeCounter(command) => command.parse(response).map(PoResponse::Counter),
            Self::CloseSession(command) => command.parse(response).map(PoResponse::CloseSession),
            Self::Ratification(command) => command.parse(response).map(|()| PoResponse::Completed),
            Self::Custom(command) => command.parse(response).map(PoResponse::Custom),
        }
    }
}

impl PoResponse {
    /// Record contents, if this is a read result
    pub const fn records(&self) -> Option<&Records> {
        match self {
            Self::Records(records) => Some(records),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::revision::PoRevision;
    use hex_literal::hex;

    #[test]
    fn test_dispatch() {
        let command: PoCommand =
            ReadRecords::new(PoRevision::Rev3_1, 0x07, 1, ReadMode::OneRecord, 0)
                .unwrap()
                .into();
        assert_eq!(command.kind(), CommandKind::ReadRecords);
        assert!(command.is_session_compatible());
        assert_eq!(command.build().unwrap().to_bytes().as_ref(), hex!("00B2013C00"));

        let parsed = command
            .parse(&Response::from_bytes(&hex!("AA9000")).unwrap())
            .unwrap();
        assert_eq!(parsed.records().unwrap()[&1].as_ref(), hex!("AA"));
    }

    #[test]
    fn test_session_compatibility() {
        let fci = PoCommand::from(GetDataFci::new(PoRevision::Rev3_1));
        assert!(!fci.is_session_compatible());
        assert!(!fci.is_session_control());

        let custom = CustomCommand::new("raw", Command::new(0x00, 0x20, 0x00, 0x00));
        assert!(!PoCommand::from(custom.clone()).is_session_compatible());
        assert!(PoCommand::from(custom.sendable_in_session()).is_session_compatible());

        let decrease =
            ChangeCounter::new(CounterDirection::Decrease, PoRevision::Rev3_1, 1, 1, 1).unwrap();
        assert_eq!(PoCommand::from(decrease).kind(), CommandKind::Decrease);
    }
}
