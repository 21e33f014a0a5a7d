//! GIVE RANDOM command
//!
//! Hands the SAM an 8 byte random, typically the PO challenge, before an
//! operation that ciphers data for the card.

use calypso_apdu_core::{Command, Response};
use rand::RngCore;

use crate::{Result, commands::CommandKind, constants::ins, revision::SamRevision};

/// Length of the random given to the SAM
pub const RANDOM_LENGTH: usize = 8;

/// GIVE RANDOM
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GiveRandom {
    revision: SamRevision,
    random: [u8; RANDOM_LENGTH],
}

impl GiveRandom {
    /// Create the command with a caller supplied random
    pub const fn new(revision: SamRevision, random: [u8; RANDOM_LENGTH]) -> Self {
        Self { revision, random }
    }

    /// Create the command with a freshly generated random
    pub fn with_random(revision: SamRevision) -> Self {
        let mut random = [0u8; RANDOM_LENGTH];
        rand::rng().fill_bytes(&mut random);
        Self::new(revision, random)
    }

    /// The random sent to the SAM
    pub const fn random(&self) -> &[u8; RANDOM_LENGTH] {
        &self.random
    }

    /// Encode the frame
    pub fn build(&self) -> Result<Command> {
        Ok(Command::new_with_data(
            self.revision.cla(),
            ins::GIVE_RANDOM,
            0x00,
            0x00,
            self.random.to_vec(),
        )?)
    }

    /// Check the response
    pub fn parse(&self, response: &Response) -> Result<()> {
        CommandKind::GiveRandom.descriptor().check(response, &[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn test_give_random() {
        let command = GiveRandom::new(SamRevision::C1, hex!("0102030405060708"));
        assert_eq!(
            command.build().unwrap().to_bytes().as_ref(),
            hex!("80860000080102030405060708")
        );

        let generated = GiveRandom::with_random(SamRevision::S1D);
        let frame = generated.build().unwrap().to_bytes();
        assert_eq!(frame[..5], hex!("9486000008"));
        assert_eq!(&frame[5..], generated.random());
    }
}
