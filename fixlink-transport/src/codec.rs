/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/10/26
******************************************************************************/

//! Tokio codec that splits complete FIX frames off a byte stream.
//!
//! A frame is complete once `8=...<SOH>9=N<SOH>`, the `N` body bytes and the
//! `10=XXX<SOH>` trailer have all arrived.

use bytes::BytesMut;
use fixlink_tagvalue::checksum::{calculate_checksum, parse_checksum};
use fixlink_tagvalue::encoder::TRAILER_LEN;
use memchr::memchr;
use thiserror::Error;
use tokio_util::codec::Decoder;

/// Errors that can occur while framing a response.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Stream does not start with a BeginString field.
    #[error("invalid begin string: message must start with 8=")]
    InvalidBeginString,

    /// Second field is not BodyLength.
    #[error("missing body length field (tag 9)")]
    MissingBodyLength,

    /// BodyLength value is not a number.
    #[error("invalid body length value")]
    InvalidBodyLength,

    /// Trailer is not a well-formed `10=XXX` field.
    #[error("malformed checksum trailer")]
    InvalidTrailer,

    /// Checksum mismatch.
    #[error("checksum mismatch: calculated {calculated}, declared {declared}")]
    ChecksumMismatch {
        /// Calculated checksum.
        calculated: u8,
        /// Declared checksum in message.
        declared: u8,
    },

    /// Frame exceeds maximum size.
    #[error("message too large: {size} bytes exceeds maximum {max_size}")]
    MessageTooLarge {
        /// Declared frame size.
        size: usize,
        /// Maximum allowed size.
        max_size: usize,
    },

    /// I/O error.
    #[error("io error: {0}")]
    Io(String),
}

impl From<std::io::Error> for CodecError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// SOH delimiter.
const SOH: u8 = 0x01;

/// Locates complete FIX frames in a receive buffer.
#[derive(Debug, Clone)]
pub struct FixCodec {
    /// Maximum frame size in bytes.
    max_message_size: usize,
}

impl FixCodec {
    /// Creates a new codec with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_message_size: 1024 * 1024, // 1MB
        }
    }

    /// Sets the maximum frame size.
    #[must_use]
    pub const fn with_max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self
    }

    /// Returns the length of the first frame in `src` once it is complete.
    ///
    /// # Returns
    /// `Ok(None)` while more bytes are needed.
    ///
    /// # Errors
    /// Returns `CodecError` if the buffered prefix can never become a frame.
    pub fn frame_length(&self, src: &[u8]) -> Result<Option<usize>, CodecError> {
        if src.len() < 2 {
            return Ok(None);
        }
        if !src.starts_with(b"8=") {
            return Err(CodecError::InvalidBeginString);
        }

        let Some(begin_end) = memchr(SOH, src) else {
            return Ok(None);
        };

        let length_field = &src[begin_end + 1..];
        if length_field.len() < 2 {
            return Ok(None);
        }
        if !length_field.starts_with(b"9=") {
            return Err(CodecError::MissingBodyLength);
        }
        let Some(length_end) = memchr(SOH, length_field) else {
            return Ok(None);
        };

        let body_length: usize = std::str::from_utf8(&length_field[2..length_end])
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or(CodecError::InvalidBodyLength)?;

        let body_start = begin_end + 1 + length_end + 1;
        let too_large = |size| CodecError::MessageTooLarge {
            size,
            max_size: self.max_message_size,
        };
        // BodyLength comes from the peer and may be anywhere up to usize::MAX
        let total = body_start
            .checked_add(body_length)
            .and_then(|n| n.checked_add(TRAILER_LEN))
            .ok_or_else(|| too_large(usize::MAX))?;
        if total > self.max_message_size {
            return Err(too_large(total));
        }

        Ok((src.len() >= total).then_some(total))
    }

    fn check_trailer(frame: &[u8]) -> Result<(), CodecError> {
        let trailer = &frame[frame.len() - TRAILER_LEN..];
        if !trailer.starts_with(b"10=") || trailer[TRAILER_LEN - 1] != SOH {
            return Err(CodecError::InvalidTrailer);
        }

        let declared = parse_checksum(&trailer[3..6]).ok_or(CodecError::InvalidTrailer)?;
        let calculated = calculate_checksum(&frame[..frame.len() - TRAILER_LEN]);
        if calculated != declared {
            return Err(CodecError::ChecksumMismatch {
                calculated,
                declared,
            });
        }
        Ok(())
    }
}

impl Default for FixCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for FixCodec {
    type Item = BytesMut;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let Some(total) = self.frame_length(src)? else {
            return Ok(None);
        };
        Self::check_trailer(&src[..total])?;
        Ok(Some(src.split_to(total)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_fix_message(body: &str) -> Vec<u8> {
        let header = format!("8=FIX.4.4\x019={}\x01", body.len());
        let without_checksum = format!("{}{}", header, body);
        let checksum = calculate_checksum(without_checksum.as_bytes());
        format!("{}10={:03}\x01", without_checksum, checksum).into_bytes()
    }

    #[test]
    fn test_decode_complete_message() {
        let mut codec = FixCodec::new();
        let msg = make_fix_message("35=A\x0134=1\x01");
        let mut buf = BytesMut::from(&msg[..]);

        let frame = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(&frame[..], &msg[..]);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_waits_for_every_fragment() {
        let mut codec = FixCodec::new();
        let msg = make_fix_message("35=W\x01270=1.10500\x01270=1.10520\x01");
        let mut buf = BytesMut::new();

        for chunk in msg.chunks(5) {
            assert!(codec.decode(&mut buf).unwrap().is_none());
            buf.extend_from_slice(chunk);
        }
        assert!(codec.decode(&mut buf).unwrap().is_some());
    }

    #[test]
    fn test_decode_leaves_following_frame() {
        let mut codec = FixCodec::new();
        let first = make_fix_message("35=A\x01");
        let second = make_fix_message("35=0\x01");
        let mut buf = BytesMut::from(&first[..]);
        buf.extend_from_slice(&second);

        assert_eq!(&codec.decode(&mut buf).unwrap().unwrap()[..], &first[..]);
        assert_eq!(&buf[..], &second[..]);
    }

    #[test]
    fn test_decode_invalid_begin_string() {
        let mut codec = FixCodec::new();
        let mut buf = BytesMut::from(&b"9=FIX.4.4\x019=5\x0135=0\x0110=000\x01"[..]);
        assert_eq!(codec.decode(&mut buf), Err(CodecError::InvalidBeginString));
    }

    #[test]
    fn test_decode_checksum_mismatch() {
        let mut codec = FixCodec::new();
        let mut buf = BytesMut::from(&b"8=FIX.4.4\x019=5\x0135=0\x0110=000\x01"[..]);
        assert!(matches!(
            codec.decode(&mut buf),
            Err(CodecError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_decode_out_of_range_checksum() {
        let mut codec = FixCodec::new();
        let mut buf = BytesMut::from(&b"8=FIX.4.4\x019=5\x0135=0\x0110=999\x01"[..]);
        assert_eq!(codec.decode(&mut buf), Err(CodecError::InvalidTrailer));
    }

    #[test]
    fn test_decode_huge_body_length() {
        let mut codec = FixCodec::new();
        let mut buf = BytesMut::from(
            &b"8=FIX.4.4\x019=18446744073709551615\x0135=0\x0110=000\x01"[..],
        );
        assert_eq!(
            codec.decode(&mut buf),
            Err(CodecError::MessageTooLarge {
                size: usize::MAX,
                max_size: 1024 * 1024,
            })
        );
    }

    #[test]
    fn test_decode_too_large() {
        let mut codec = FixCodec::new().with_max_message_size(32);
        let msg = make_fix_message("35=W\x01270=1.10500\x01270=1.10520\x01");
        let mut buf = BytesMut::from(&msg[..]);
        assert!(matches!(
            codec.decode(&mut buf),
            Err(CodecError::MessageTooLarge { max_size: 32, .. })
        ));
    }

    #[test]
    fn test_frame_length_needs_body_length() {
        let codec = FixCodec::new();
        assert_eq!(codec.frame_length(b"8=FIX.4.4\x019=1"), Ok(None));
        assert_eq!(
            codec.frame_length(b"8=FIX.4.4\x01X=1\x01"),
            Err(CodecError::MissingBodyLength)
        );
        assert_eq!(
            codec.frame_length(b"8=FIX.4.4\x019=abc\x01"),
            Err(CodecError::InvalidBodyLength)
        );
    }
}
