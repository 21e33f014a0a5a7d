//! Card channel abstraction
//!
//! Reader drivers live outside this crate. A terminal hands each card
//! (PO or SAM) to the transaction layer as a [`CardTransport`]: a
//! synchronous request/response channel plus the few reader facts the
//! selection logic needs.

pub mod error;

use std::fmt;

use bytes::Bytes;
use tracing::{debug, trace};

pub use error::TransportError;

/// Synchronous channel to one card
///
/// Implementations move bytes only. They do not interpret status words
/// and do not issue GET RESPONSE on their own.
pub trait CardTransport: Send + fmt::Debug {
    /// Send raw APDU bytes to the card and return the response bytes
    fn transmit_raw(&mut self, command: &[u8]) -> Result<Bytes, TransportError> {
        trace!(command = %hex::encode_upper(command), "Transmitting raw command");
        let result = self.do_transmit_raw(command);
        match &result {
            Ok(response) => {
                trace!(response = %hex::encode_upper(response), "Received raw response");
            }
            Err(e) => {
                debug!(error = %e, "Transport error during transmission");
            }
        }
        result
    }

    /// Driver specific exchange, wrapped by [`CardTransport::transmit_raw`]
    fn do_transmit_raw(&mut self, command: &[u8]) -> Result<Bytes, TransportError>;

    /// Answer To Reset of the card in the reader
    fn atr(&self) -> Bytes;

    /// Name of the protocol the reader negotiated with the card, if known
    fn protocol(&self) -> Option<&str> {
        None
    }

    /// Check if a card is connected
    fn is_connected(&self) -> bool;

    /// Close the logical channel opened by the last selection
    fn close_channel(&mut self) -> Result<(), TransportError>;

    /// Reset the card connection
    fn reset(&mut self) -> Result<(), TransportError>;
}

impl<T: CardTransport + ?Sized> CardTransport for &mut T {
    fn transmit_raw(&mut self, command: &[u8]) -> Result<Bytes, TransportError> {
        (**self).transmit_raw(command)
    }

    fn do_transmit_raw(&mut self, command: &[u8]) -> Result<Bytes, TransportError> {
        (**self).do_transmit_raw(command)
    }

    fn atr(&self) -> Bytes {
        (**self).atr()
    }

    fn protocol(&self) -> Option<&str> {
        (**self).protocol()
    }

    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }

    fn close_channel(&mut self) -> Result<(), TransportError> {
        (**self).close_channel()
    }

    fn reset(&mut self) -> Result<(), TransportError> {
        (**self).reset()
    }
}

#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub(crate) struct MockTransport {
    pub(crate) responses: Vec<Bytes>,
    pub(crate) commands: Vec<Bytes>,
    pub(crate) closed: bool,
}

#[cfg(test)]
impl CardTransport for MockTransport {
    fn do_transmit_raw(&mut self, command: &[u8]) -> Result<Bytes, TransportError> {
        if self.closed {
            return Err(TransportError::Connection);
        }
        self.commands.push(Bytes::copy_from_slice(command));
        if self.responses.is_empty() {
            return Err(TransportError::Transmission);
        }
        Ok(self.responses.remove(0))
    }

    fn atr(&self) -> Bytes {
        Bytes::from_static(&[0x3B, 0x00])
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
        self.commands.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exchange(transport: &mut impl CardTransport, command: &[u8]) -> Result<Bytes, TransportError> {
        transport.transmit_raw(command)
    }

    #[test]
    fn test_transmit_through_reference() {
        let mut mock = MockTransport {
            responses: vec![Bytes::from_static(&[0x90, 0x00])],
            ..Default::default()
        };

        let response = exchange(&mut &mut mock, &[0x00, 0xB2, 0x00, 0x00, 0x00]).unwrap();
        assert_eq!(response.as_ref(), &[0x90, 0x00]);
        assert_eq!(mock.commands.len(), 1);
        assert_eq!(mock.protocol(), None);
    }

    #[test]
    fn test_closed_channel_fails() {
        let mut mock = MockTransport::default();
        mock.close_channel().unwrap();
        assert!(!mock.is_connected());
        let err = mock.transmit_raw(&[0x00, 0xCA, 0x00, 0x6F, 0x00]).unwrap_err();
        assert!(err.is_card_lost());

        mock.reset().unwrap();
        assert_eq!(
            mock.transmit_raw(&[0x00, 0xCA, 0x00, 0x6F, 0x00]),
            Err(TransportError::Transmission)
        );
    }
}
