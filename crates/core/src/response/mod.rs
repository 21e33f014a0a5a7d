//! APDU response frames
//!
//! A response is the card's data followed by the two status bytes
//! `SW1 SW2`. Whether a status word means success is decided by the command
//! that was sent, so [`Response`] itself only offers the ISO `90 00` check.

pub mod error;
pub mod status;

use bytes::{BufMut, Bytes, BytesMut};
use tracing::trace;

pub use error::{ResponseError, StatusError};
pub use status::StatusWord;

/// Decoded APDU response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    payload: Bytes,
    status: StatusWord,
}

impl Response {
    /// Create a new response with payload and status
    pub fn new(payload: impl Into<Bytes>, status: impl Into<StatusWord>) -> Self {
        Self {
            payload: payload.into(),
            status: status.into(),
        }
    }

    /// Create a `90 00` response
    pub fn success(payload: impl Into<Bytes>) -> Self {
        Self::new(payload, status::common::SUCCESS)
    }

    /// Create a response carrying only a status word
    pub fn error(status: impl Into<StatusWord>) -> Self {
        Self::new(Bytes::new(), status)
    }

    /// Parse a response from raw bytes, status word last
    pub fn from_bytes(raw: &[u8]) -> Result<Self, ResponseError> {
        let [payload @ .., sw1, sw2] = raw else {
            return Err(ResponseError::Incomplete(raw.len()));
        };

        let status = StatusWord::new(*sw1, *sw2);
        trace!(
            status = %status,
            payload_len = payload.len(),
            "Parsed APDU response"
        );

        Ok(Self {
            payload: Bytes::copy_from_slice(payload),
            status,
        })
    }

    /// Response data without the status word
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Owned response data
    pub fn payload_bytes(&self) -> Bytes {
        self.payload.clone()
    }

    /// Status word
    pub const fn status(&self) -> StatusWord {
        self.status
    }

    /// Whether the status word is `90 00`
    pub const fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Length of the re-encoded frame
    pub fn response_length(&self) -> usize {
        self.payload.len() + 2
    }

    /// Re-encode as `data || SW1 SW2`
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.response_length());
        buf.put_slice(&self.payload);
        buf.put_u8(self.status.sw1);
        buf.put_u8(self.status.sw2);
        buf.freeze()
    }

    /// Payload if the status word is `90 00`
    pub fn into_payload(self) -> Result<Bytes, StatusError> {
        if self.is_success() {
            Ok(self.payload)
        } else {
            Err(StatusError::new(self.status))
        }
    }
}

impl TryFrom<&[u8]> for Response {
    type Error = ResponseError;

    fn try_from(raw: &[u8]) -> Result<Self, ResponseError> {
        Self::from_bytes(raw)
    }
}

impl TryFrom<Bytes> for Response {
    type Error = ResponseError;

    fn try_from(raw: Bytes) -> Result<Self, ResponseError> {
        Self::from_bytes(&raw)
    }
}

impl From<Response> for Bytes {
    fn from(response: Response) -> Self {
        response.to_bytes()
    }
}

impl From<&Response> for Bytes {
    fn from(response: &Response) -> Self {
        response.to_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn test_response_from_bytes() {
        let resp = Response::from_bytes(&hex!("0102039000")).unwrap();
        assert_eq!(resp.payload(), hex!("010203"));
        assert_eq!(resp.status(), StatusWord::new(0x90, 0x00));
        assert!(resp.is_success());

        let resp = Response::from_bytes(&hex!("6B00")).unwrap();
        assert!(resp.payload().is_empty());
        assert_eq!(resp.status().to_u16(), 0x6B00);
        assert!(!resp.is_success());
    }

    #[test]
    fn test_short_response_is_incomplete() {
        assert_eq!(Response::from_bytes(&[]), Err(ResponseError::Incomplete(0)));
        assert_eq!(
            Response::from_bytes(&hex!("90")),
            Err(ResponseError::Incomplete(1))
        );
    }

    #[test]
    fn test_reencode_preserves_frame() {
        let raw = hex!("03082A10A5B16283");
        let resp = Response::from_bytes(&raw).unwrap();
        assert_eq!(resp.response_length(), raw.len());
        assert_eq!(Bytes::from(resp).as_ref(), raw);
    }

    #[test]
    fn test_into_payload() {
        let ok = Response::success(Bytes::from_static(&hex!("AABB")));
        assert_eq!(ok.into_payload().unwrap().as_ref(), hex!("AABB"));

        let err = Response::error(0x6A82).into_payload().unwrap_err();
        assert_eq!(err.status.to_u16(), 0x6A82);
        assert!(ResponseError::from(err).has_status(0x6A82));
    }
}
