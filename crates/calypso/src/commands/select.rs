//! SELECT (by AID) command

use bytes::Bytes;
use calypso_apdu_core::{Command, StatusWord};

use crate::{
    Error, Result,
    commands::CommandKind,
    constants::{cla, ins, select},
};

/// Which application matching the AID prefix to select
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FileOccurrence {
    /// First or only occurrence
    #[default]
    First,
    /// Next occurrence
    Next,
}

impl FileOccurrence {
    const fn p2(self) -> u8 {
        match self {
            Self::First => select::FIRST_OCCURRENCE,
            Self::Next => select::NEXT_OCCURRENCE,
        }
    }
}

/// SELECT APPLICATION
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectApplication {
    aid: Bytes,
    occurrence: FileOccurrence,
}

impl SelectApplication {
    /// Shortest AID
    pub const MIN_AID_LENGTH: usize = 5;
    /// Longest AID
    pub const MAX_AID_LENGTH: usize = 16;

    /// Create the command, the AID being 5 to 16 bytes
    pub fn new(aid: impl Into<Bytes>, occurrence: FileOccurrence) -> Result<Self> {
        let aid = aid.into();
        if !(Self::MIN_AID_LENGTH..=Self::MAX_AID_LENGTH).contains(&aid.len()) {
            return Err(Error::inconsistent(format!(
                "AID must be 5..=16 bytes, got {}",
                aid.len()
            )));
        }
        Ok(Self { aid, occurrence })
    }

    /// Selected AID
    pub fn aid(&self) -> &[u8] {
        &self.aid
    }

    /// Encode the frame
    pub fn build(&self) -> Result<Command> {
        Ok(Command::new_with_data_and_le(
            cla::ISO7816,
            ins::SELECT,
            select::BY_NAME,
            self.occurrence.p2(),
            self.aid.clone(),
            0x00,
        )?)
    }

    /// Whether the status selects the application
    pub fn is_match(status: StatusWord, extra_success: &[StatusWord]) -> bool {
        extra_success.contains(&status)
            || CommandKind::SelectApplication
                .descriptor()
                .is_successful(status)
    }
}
