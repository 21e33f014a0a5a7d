//! Shared test fixtures: a scripted card and log setup

#![allow(dead_code, unreachable_pub)]

use std::collections::VecDeque;

use calypso_transaction::{
    CalypsoPo, CalypsoSam, CardTransport, TransportError,
    fci::{SerialNumber, StartupInfo},
};
use bytes::Bytes;
use hex_literal::hex;
use tracing_subscriber::EnvFilter;

/// Install a test log subscriber, `RUST_LOG` driven
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Card replaying scripted responses and recording every command
#[derive(Debug, Default)]
pub struct ScriptedCard {
    atr: Bytes,
    protocol: Option<String>,
    responses: VecDeque<Bytes>,
    pub commands: Vec<Bytes>,
    pub closed: bool,
}

impl ScriptedCard {
    pub fn new(atr: &[u8]) -> Self {
        Self {
            atr: Bytes::copy_from_slice(atr),
            ..Default::default()
        }
    }

    pub fn with_protocol(mut self, protocol: &str) -> Self {
        self.protocol = Some(protocol.to_owned());
        self
    }

    /// Queue the next response, status word included
    pub fn reply(mut self, response: &[u8]) -> Self {
        self.responses.push_back(Bytes::copy_from_slice(response));
        self
    }

    pub fn pending(&self) -> usize {
        self.responses.len()
    }
}

impl CardTransport for ScriptedCard {
    fn do_transmit_raw(&mut self, command: &[u8]) -> Result<Bytes, TransportError> {
        if self.closed {
            return Err(TransportError::Connection);
        }
        self.commands.push(Bytes::copy_from_slice(command));
        self.responses
            .pop_front()
            .ok_or_else(|| TransportError::other("no scripted response left"))
    }

    fn atr(&self) -> Bytes {
        self.atr.clone()
    }

    fn protocol(&self) -> Option<&str> {
        self.protocol.as_deref()
    }

    fn is_connected(&self) -> bool {
        !self.closed
    }

    fn close_channel(&mut self) -> Result<(), TransportError> {
        self.closed = true;
        Ok(())
    }

    fn reset(&mut self) -> Result<(), TransportError> {
        self.closed = false;
        Ok(())
    }
}

pub const PO_ATR: [u8; 12] = hex!("3B8880010000000000718100");
pub const SAM_ATR: [u8; 19] = hex!("3B3F9600805A2A80C120050311223344829000");
pub const SERIAL: [u8; 8] = hex!("0000000011223344");

/// PO with the given application type
pub fn calypso_po(application_type: u8) -> CalypsoPo {
    CalypsoPo::new(
        hex!("315449432E494341").to_vec(),
        SerialNumber::new(SERIAL),
        StartupInfo::from_bytes([0x0A, 0x3C, application_type, 0x11, 0x32, 0x14, 0x01]),
    )
    .unwrap()
}

pub fn calypso_sam() -> CalypsoSam {
    CalypsoSam::from_atr(SAM_ATR.to_vec()).unwrap()
}
