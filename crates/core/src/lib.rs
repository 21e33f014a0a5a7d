//! APDU codec and card channel abstraction for Calypso terminals
//!
//! This crate holds the pieces that know nothing about Calypso itself:
//!
//! - [`Command`]: ISO/IEC 7816-4 short command frames
//! - [`Response`] and [`StatusWord`]: response frames
//! - [`CardTransport`]: the synchronous channel a reader driver provides
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![forbid(unsafe_code)]
#![warn(missing_docs, rustdoc::missing_crate_level_docs)]

pub use bytes::{Bytes, BytesMut};

pub mod command;
pub mod response;
pub mod transport;

pub use command::{Command, CommandError, ExpectedLength, MAX_DATA_LENGTH};
pub use response::{Response, ResponseError, StatusError, status::StatusWord};
pub use transport::{CardTransport, TransportError};

/// Prelude module containing commonly used traits and types
pub mod prelude {
    pub use crate::{
        Bytes, BytesMut, CardTransport, Command, CommandError, Response, ResponseError,
        StatusWord, TransportError, response::status::common,
    };
}
