//! Card selection
//!
//! A [`SelectionRequest`] identifies a card either by matching its ATR
//! against a regular expression or by selecting an application by AID. On a
//! match, the trailing commands of the request are sent right away and
//! their responses returned with the outcome.

use bytes::Bytes;
use calypso_apdu_core::{CardTransport, Command, Response, StatusWord};
use regex::Regex;
use tracing::{debug, instrument, trace};

use crate::{
    Error, Result,
    commands::{FileOccurrence, SelectApplication},
    revision::SamRevision,
};

/// ATR regular expression, matched against the upper case hex ATR
#[derive(Debug, Clone)]
pub struct AtrFilter {
    pattern: String,
    regex: Option<Regex>,
}

impl AtrFilter {
    /// Compile a filter; an empty pattern matches every ATR
    pub fn new(pattern: impl Into<String>) -> Result<Self> {
        let pattern = pattern.into();
        let regex = if pattern.is_empty() {
            None
        } else {
            Some(Regex::new(&format!("^(?:{pattern})$"))?)
        };
        Ok(Self { pattern, regex })
    }

    /// Filter matching the ATR of a Calypso SAM
    ///
    /// Without a serial number any SAM of the revision matches.
    pub fn for_sam(revision: SamRevision, serial_number: Option<&[u8]>) -> Result<Self> {
        let mask = revision.application_type_mask().replace('?', ".");
        let serial = serial_number.map_or_else(|| ".{8}".to_owned(), hex::encode_upper);
        Self::new(format!("3B(.{{6}}|.{{10}})805A..80{mask}20.{{4}}{serial}829000"))
    }

    /// Source pattern
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Whether the ATR matches
    pub fn matches(&self, atr: &[u8]) -> bool {
        self.regex
            .as_ref()
            .is_none_or(|regex| regex.is_match(&hex::encode_upper(atr)))
    }
}

/// AID based selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AidSelector {
    command: SelectApplication,
    successful_status_codes: Vec<StatusWord>,
}

impl AidSelector {
    /// Select the first occurrence of an AID
    pub fn new(aid: impl Into<Bytes>) -> Result<Self> {
        Self::with_occurrence(aid, FileOccurrence::First)
    }

    /// Select a given occurrence of an AID
    pub fn with_occurrence(aid: impl Into<Bytes>, occurrence: FileOccurrence) -> Result<Self> {
        Ok(Self {
            command: SelectApplication::new(aid, occurrence)?,
            successful_status_codes: Vec::new(),
        })
    }

    /// Also accept this status word as a successful selection
    pub fn with_successful_status(mut self, status: impl Into<StatusWord>) -> Self {
        self.successful_status_codes.push(status.into());
        self
    }

    /// AID to select
    pub fn aid(&self) -> &[u8] {
        self.command.aid()
    }
}

/// How a card is identified
#[derive(Debug, Clone)]
pub enum SelectionTarget {
    /// By AID
    Aid(AidSelector),
    /// By ATR
    Atr(AtrFilter),
}

/// Logical channel policy after selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChannelState {
    /// Leave the channel open for a following transaction
    #[default]
    KeepOpen,
    /// Close the channel once the trailing commands are sent
    CloseAfter,
}

/// A selection to run on one card
#[derive(Debug, Clone)]
pub struct SelectionRequest {
    target: SelectionTarget,
    channel_state: ChannelState,
    protocol_flag: Option<String>,
    trailing_commands: Vec<Command>,
}

impl SelectionRequest {
    /// Create a request, keeping the channel open
    pub const fn new(target: SelectionTarget) -> Self {
        Self {
            target,
            channel_state: ChannelState::KeepOpen,
            protocol_flag: None,
            trailing_commands: Vec::new(),
        }
    }

    /// Set the channel policy
    pub const fn with_channel_state(mut self, channel_state: ChannelState) -> Self {
        self.channel_state = channel_state;
        self
    }

    /// Only consider cards the reader reached through this protocol
    pub fn with_protocol_flag(mut self, protocol: impl Into<String>) -> Self {
        self.protocol_flag = Some(protocol.into());
        self
    }

    /// Send this command after a successful selection
    pub fn with_trailing_command(mut self, command: Command) -> Self {
        self.trailing_commands.push(command);
        self
    }

    /// Run the selection on a card
    #[instrument(skip_all, fields(channel_state = ?self.channel_state))]
    pub fn select<T: CardTransport>(&self, transport: &mut T) -> Result<SelectionOutcome> {
        let atr = transport.atr();
        let mut outcome = SelectionOutcome {
            matched: false,
            atr,
            fci: None,
            status: None,
            responses: Vec::new(),
            channel_open: true,
        };

        let protocol_matches = match (&self.protocol_flag, transport.protocol()) {
            (Some(expected), actual) => actual == Some(expected.as_str()),
            (None, _) => true,
        };

        if protocol_matches {
            match &self.target {
                SelectionTarget::Atr(filter) => {
                    outcome.matched = filter.matches(&outcome.atr);
                    trace!(pattern = filter.pattern(), matched = outcome.matched, "ATR filter");
                }
                SelectionTarget::Aid(selector) => {
                    let command = selector.command.build()?;
                    let raw = transport.transmit_raw(&command.to_bytes())?;
                    let response = Response::from_bytes(&raw)?;
                    outcome.matched = SelectApplication::is_match(
                        response.status(),
                        &selector.successful_status_codes,
                    );
                    outcome.status = Some(response.status());
                    outcome.fci = Some(response.payload_bytes());
                }
            }
        } else {
            debug!(expected = ?self.protocol_flag, "Protocol flag mismatch");
        }

        let trailing = if outcome.matched {
            self.send_trailing_commands(transport, &mut outcome.responses)
        } else {
            Ok(())
        };

        // The channel policy holds even when a trailing command failed
        let closed = if !outcome.matched || self.channel_state == ChannelState::CloseAfter {
            transport.close_channel().map(|()| outcome.channel_open = false)
        } else {
            Ok(())
        };
        trailing?;
        closed?;

        debug!(
            matched = outcome.matched,
            status = ?outcome.status,
            channel_open = outcome.channel_open,
            "Selection finished"
        );
        Ok(outcome)
    }

    fn send_trailing_commands<T: CardTransport>(
        &self,
        transport: &mut T,
        responses: &mut Vec<Response>,
    ) -> Result<()> {
        for command in &self.trailing_commands {
            let raw = transport.transmit_raw(&command.to_bytes())?;
            responses.push(Response::from_bytes(&raw)?);
        }
        Ok(())
    }
}

/// Result of a selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionOutcome {
    /// Whether the card matched the request
    pub matched: bool,
    /// ATR of the card
    pub atr: Bytes,
    /// FCI returned by an AID selection
    pub fci: Option<Bytes>,
    /// Status word of an AID selection
    pub status: Option<StatusWord>,
    /// Responses to the trailing commands, in order
    pub responses: Vec<Response>,
    /// Whether the logical channel is still open
    pub channel_open: bool,
}

impl SelectionOutcome {
    /// Turn a miss into [`Error::SelectionMismatch`]
    pub fn require_match(self) -> Result<Self> {
        if self.matched {
            Ok(self)
        } else {
            Err(Error::SelectionMismatch)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    const SAM_C1_ATR: [u8; 19] = hex!("3B3F9600805A2A80C120050311223344829000");

    #[test]
    fn test_empty_filter_matches_all() {
        let filter = AtrFilter::new("").unwrap();
        assert!(filter.matches(&SAM_C1_ATR));
        assert!(filter.matches(&[]));
    }

    #[test]
    fn test_filter_is_full_match() {
        let filter = AtrFilter::new("3B3F").unwrap();
        assert!(!filter.matches(&SAM_C1_ATR));
        let filter = AtrFilter::new("3B3F.*").unwrap();
        assert!(filter.matches(&SAM_C1_ATR));
    }

    #[test]
    fn test_invalid_regex() {
        assert!(matches!(AtrFilter::new("3B(("), Err(Error::InvalidAtrRegex(_))));
    }

    #[test]
    fn test_sam_filter() {
        let any = AtrFilter::for_sam(SamRevision::Any, None).unwrap();
        assert!(any.matches(&SAM_C1_ATR));

        let c1 = AtrFilter::for_sam(SamRevision::C1, Some(&hex!("11223344"))).unwrap();
        assert!(c1.matches(&SAM_C1_ATR));
        assert_eq!(
            c1.pattern(),
            "3B(.{6}|.{10})805A..80C120.{4}11223344829000"
        );

        let other_serial = AtrFilter::for_sam(SamRevision::C1, Some(&hex!("00000000"))).unwrap();
        assert!(!other_serial.matches(&SAM_C1_ATR));

        let s1d = AtrFilter::for_sam(SamRevision::S1D, None).unwrap();
        assert!(!s1d.matches(&SAM_C1_ATR));
        assert!(s1d.matches(&hex!("3B3F9600805A2A80D720050311223344829000")));
    }

    #[test]
    fn test_require_match() {
        let outcome = SelectionOutcome {
            matched: false,
            atr: Bytes::new(),
            fci: None,
            status: None,
            responses: Vec::new(),
            channel_open: false,
        };
        assert!(matches!(outcome.require_match(), Err(Error::SelectionMismatch)));
    }
}
