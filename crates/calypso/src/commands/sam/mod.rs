//! SAM commands

pub mod digest_authenticate;
pub mod digest_close;
pub mod digest_init;
pub mod digest_update;
pub mod get_challenge;
pub mod give_random;
pub mod select_diversifier;

use bytes::Bytes;
use calypso_apdu_core::{Command, Response};
use derive_more::From;

use crate::{Result, commands::CommandKind};

pub use digest_authenticate::DigestAuthenticate;
pub use digest_close::DigestClose;
pub use digest_init::{DigestInit, WorkKey};
pub use digest_update::{DigestUpdate, DigestUpdateMultiple};
pub use get_challenge::GetChallenge;
pub use give_random::GiveRandom;
pub use select_diversifier::SelectDiversifier;

/// Any command the terminal sends to a SAM
#[derive(Debug, Clone, PartialEq, Eq, From)]
pub enum SamCommand {
    /// SELECT DIVERSIFIER
    SelectDiversifier(SelectDiversifier),
    /// GET CHALLENGE
    GetChallenge(GetChallenge),
    /// DIGEST INIT
    DigestInit(DigestInit),
    /// DIGEST UPDATE
    DigestUpdate(DigestUpdate),
    /// DIGEST UPDATE MULTIPLE
    DigestUpdateMultiple(DigestUpdateMultiple),
    /// DIGEST CLOSE
    DigestClose(DigestClose),
    /// DIGEST AUTHENTICATE
    DigestAuthenticate(DigestAuthenticate),
    /// GIVE RANDOM
    GiveRandom(GiveRandom),
}

/// Typed result of a SAM command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SamResponse {
    /// Challenge from GET CHALLENGE
    Challenge(Bytes),
    /// Terminal signature from DIGEST CLOSE
    Signature(Bytes),
    /// Command without response data
    Completed,
}

impl SamCommand {
    /// Command kind
    pub const fn kind(&self) -> CommandKind {
        match self {
            Self::SelectDiversifier(_) => CommandKind::SelectDiversifier,
            Self::GetChallenge(_) => CommandKind::GetChallenge,
            Self::DigestInit(_) => CommandKind::DigestInit,
            Self::DigestUpdate(_) => CommandKind::DigestUpdate,
            Self::DigestUpdateMultiple(_) => CommandKind::DigestUpdateMultiple,
            Self::DigestClose(_) => CommandKind::DigestClose,
            Self::DigestAuthenticate(_) => CommandKind::DigestAuthenticate,
            Self::GiveRandom(_) => CommandKind::GiveRandom,
        }
    }

    /// Encode the frame
    pub fn build(&self) -> Result<Command> {
        match self {
            Self::SelectDiversifier(command) => command.build(),
            Self::GetChallenge(command) => Ok(command.build()),
            Self::DigestInit(command) => command.build(),
            Self::DigestUpdate(command) => command.build(),
            Self::DigestUpdateMultiple(command) => command.build(),
            Self::DigestClose(command) => Ok(command.build()),
            Self::DigestAuthenticate(command) => command.build(),
            Self::GiveRandom(command) => command.build(),
        }
    }

    /// Decode the response of this command
    pub fn parse(&self, response: &Response) -> Result<SamResponse> {
        let completed = |()| SamResponse::Completed;
        match self {
            Self::SelectDiversifier(command) => command.parse(response).map(completed),
            Self::GetChallenge(command) => command.parse(response).map(SamResponse::Challenge),
            Self::DigestInit(command) => command.parse(response).map(completed),
            Self::DigestUpdate(command) => command.parse(response).map(completed),
            Self::DigestUpdateMultiple(command) => command.parse(response).map(completed),
            Self::DigestClose(command) => command.parse(response).map(SamResponse::Signature),
            Self::DigestAuthenticate(command) => command.parse(response).map(completed),
            Self::GiveRandom(command) => command.parse(response).map(completed),
        }
    }
}
