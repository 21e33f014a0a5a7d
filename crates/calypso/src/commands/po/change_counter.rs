//! INCREASE and DECREASE commands

use calypso_apdu_core::{Command, Response};

use crate::{
    Error, Result,
    commands::{CommandKind, take},
    constants::{MAX_COUNTER_VALUE, MAX_SFI, ins},
    revision::PoRevision,
};

/// Direction of a counter change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterDirection {
    /// INCREASE
    Increase,
    /// DECREASE
    Decrease,
}

impl CounterDirection {
    const fn instruction(self) -> u8 {
        match self {
            Self::Increase => ins::INCREASE,
            Self::Decrease => ins::DECREASE,
        }
    }

    /// Command kind of this direction
    pub const fn kind(self) -> CommandKind {
        match self {
            Self::Increase => CommandKind::Increase,
            Self::Decrease => CommandKind::Decrease,
        }
    }
}

/// INCREASE or DECREASE of a counter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeCounter {
    direction: CounterDirection,
    revision: PoRevision,
    sfi: u8,
    counter_number: u8,
    value: u32,
}

impl ChangeCounter {
    /// Create the command, `value` being a 3 byte unsigned amount
    pub fn new(
        direction: CounterDirection,
        revision: PoRevision,
        sfi: u8,
        counter_number: u8,
        value: u32,
    ) -> Result<Self> {
        if counter_number < 1 {
            return Err(Error::inconsistent("counter number must be at least 1"));
        }
        if sfi > MAX_SFI {
            return Err(Error::inconsistent(format!("SFI {sfi:#04X} out of range")));
        }
        if value > MAX_COUNTER_VALUE {
            return Err(Error::inconsistent(format!(
                "counter value {value:#X} does not fit in 3 bytes"
            )));
        }
        Ok(Self {
            direction,
            revision,
            sfi,
            counter_number,
            value,
        })
    }

    /// Increase or decrease
    pub const fn direction(&self) -> CounterDirection {
        self.direction
    }

    /// Encode the frame
    pub fn build(&self) -> Result<Command> {
        let [_, high, mid, low] = self.value.to_be_bytes();
        Ok(Command::new_with_data_and_le(
            self.revision.cla(),
            self.direction.instruction(),
            self.counter_number,
            self.sfi << 3,
            vec![high, mid, low],
            0x00,
        )?)
    }

    /// Decode the new counter value, absent when the card postponed it
    pub fn parse(&self, response: &Response) -> Result<Option<u32>> {
        self.direction.kind().descriptor().check(response, &[])?;
        let payload = response.payload();
        if payload.is_empty() {
            return Ok(None);
        }
        if payload.len() != 3 {
            return Err(Error::malformed(format!(
                "counter value of {} bytes",
                payload.len()
            )));
        }
        let [high, mid, low] = take::<3>(payload, 0)?;
        Ok(Some(u32::from_be_bytes([0, high, mid, low])))
    }
}
