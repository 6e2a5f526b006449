/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/10/26
******************************************************************************/

//! FIX message encoder.
//!
//! Messages are built in two steps. [`build_header`] lays out the standard
//! header in front of an already encoded body and prefixes BeginString and
//! BodyLength; [`finalize`] appends the CheckSum trailer. The [`Encoder`]
//! collects body fields and runs both steps.

use crate::checksum::{calculate_checksum, format_checksum};
use bytes::{BufMut, Bytes, BytesMut};
use fixlink_core::field::tags;
use fixlink_core::message::MsgType;
use fixlink_core::types::{SeqNum, Timestamp};

/// SOH (Start of Header) delimiter used in FIX messages.
pub const SOH: u8 = 0x01;

/// Length of the `10=XXX<SOH>` trailer.
pub const TRAILER_LEN: usize = 7;

/// Standard header fields written in front of every message body.
#[derive(Debug, Clone, Copy)]
pub struct StandardHeader<'a> {
    /// BeginString value (e.g. `FIX.4.4`).
    pub begin_string: &'a str,
    /// MsgType (35).
    pub msg_type: &'a MsgType,
    /// SenderCompID (49).
    pub sender_comp_id: &'a str,
    /// TargetCompID (56).
    pub target_comp_id: &'a str,
    /// SenderSubID (50).
    pub sender_sub_id: &'a str,
    /// MsgSeqNum (34).
    pub seq_num: SeqNum,
    /// SendingTime (52).
    pub sending_time: Timestamp,
}

/// Lays out BeginString, BodyLength and the standard header before `body`.
///
/// Header order is 35, 49, 56, 57, 50, 34, 52. The BodyLength value counts
/// every byte from the `35=` field through the end of `body`.
///
/// The sender sub-id is written into TargetSubID (57) as well as
/// SenderSubID (50). The counterparty this client talks to routes on that
/// pair, so the duplication is kept here and only here.
///
/// # Arguments
/// * `header` - The standard header values
/// * `body` - Encoded body fields, each terminated by SOH
#[must_use]
pub fn build_header(header: &StandardHeader<'_>, body: &[u8]) -> BytesMut {
    let mut tail = FieldWriter::with_capacity(96 + body.len());
    tail.put_str(tags::MSG_TYPE, header.msg_type.as_str());
    tail.put_str(tags::SENDER_COMP_ID, header.sender_comp_id);
    tail.put_str(tags::TARGET_COMP_ID, header.target_comp_id);
    tail.put_str(tags::TARGET_SUB_ID, header.sender_sub_id);
    tail.put_str(tags::SENDER_SUB_ID, header.sender_sub_id);
    tail.put_uint(tags::MSG_SEQ_NUM, header.seq_num.value());
    tail.put_str(tags::SENDING_TIME, &header.sending_time.format_secs());
    tail.buf.put_slice(body);

    let mut message = FieldWriter::with_capacity(tail.buf.len() + 32);
    message.put_str(tags::BEGIN_STRING, header.begin_string);
    message.put_uint(tags::BODY_LENGTH, tail.buf.len() as u64);
    message.buf.put_slice(&tail.buf);
    message.buf
}

/// Appends the CheckSum trailer and returns the wire-ready message.
///
/// The checksum is the modulo-256 sum of every byte in `header_and_body`,
/// rendered as three zero-padded digits and followed by one SOH.
#[must_use]
pub fn finalize(mut header_and_body: BytesMut) -> Bytes {
    let checksum = format_checksum(calculate_checksum(&header_and_body));
    header_and_body.reserve(TRAILER_LEN);
    header_and_body.put_slice(b"10=");
    header_and_body.put_slice(&checksum);
    header_and_body.put_u8(SOH);
    header_and_body.freeze()
}

/// FIX message body encoder.
///
/// Collects body fields in order; [`Encoder::finish`] frames them.
#[derive(Debug, Default)]
pub struct Encoder {
    body: FieldWriter,
}

impl Encoder {
    /// Creates an empty encoder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a field with a string value.
    #[inline]
    pub fn put_str(&mut self, tag: u32, value: &str) {
        self.body.put_str(tag, value);
    }

    /// Appends a field with an unsigned integer value.
    #[inline]
    pub fn put_uint(&mut self, tag: u32, value: u64) {
        self.body.put_uint(tag, value);
    }

    /// Appends a field with a single character value.
    #[inline]
    pub fn put_char(&mut self, tag: u32, value: char) {
        let mut buf = [0u8; 4];
        let s = value.encode_utf8(&mut buf);
        self.body.put_str(tag, s);
    }

    /// Returns the encoded body bytes.
    #[inline]
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body.buf
    }

    /// Returns the current body length.
    #[inline]
    #[must_use]
    pub fn body_len(&self) -> usize {
        self.body.buf.len()
    }

    /// Frames the body with `header` and appends the checksum.
    #[must_use]
    pub fn finish(self, header: &StandardHeader<'_>) -> Bytes {
        finalize(build_header(header, &self.body.buf))
    }
}

#[derive(Debug, Default)]
struct FieldWriter {
    buf: BytesMut,
}

impl FieldWriter {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    fn put_str(&mut self, tag: u32, value: &str) {
        let mut tag_buf = itoa::Buffer::new();
        self.buf.put_slice(tag_buf.format(tag).as_bytes());
        self.buf.put_u8(b'=');
        self.buf.put_slice(value.as_bytes());
        self.buf.put_u8(SOH);
    }

    fn put_uint(&mut self, tag: u32, value: u64) {
        let mut buf = itoa::Buffer::new();
        self.put_str(tag, buf.format(value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::parse_checksum;
    use crate::decoder::{fields, get_tag_value};

    fn header(msg_type: &MsgType, seq: u64) -> StandardHeader<'_> {
        StandardHeader {
            begin_string: "FIX.4.4",
            msg_type,
            sender_comp_id: "demo.broker.3000001",
            target_comp_id: "CSERVER",
            sender_sub_id: "QUOTE",
            seq_num: SeqNum::new(seq),
            // 2021-03-04 05:06:07.890 UTC
            sending_time: Timestamp::from_millis(1_614_834_367_890),
        }
    }

    fn declared_body_length(message: &[u8]) -> usize {
        get_tag_value(message, tags::BODY_LENGTH, 0)
            .unwrap()
            .parse()
            .unwrap()
    }

    #[test]
    fn test_heartbeat_is_byte_exact() {
        let msg_type = MsgType::Heartbeat;
        let message = Encoder::new().finish(&header(&msg_type, 1));

        let expected = b"8=FIX.4.4\x019=83\x0135=0\x0149=demo.broker.3000001\x0156=CSERVER\x01\
57=QUOTE\x0150=QUOTE\x0134=1\x0152=20210304-05:06:07\x0110=100\x01";
        assert_eq!(&message[..], &expected[..]);
    }

    #[test]
    fn test_header_field_order() {
        let msg_type = MsgType::Logout;
        let framed = build_header(&header(&msg_type, 7), b"");
        let order: Vec<u32> = fields(&framed).map(|f| f.tag).collect();
        assert_eq!(order, vec![8, 9, 35, 49, 56, 57, 50, 34, 52]);
    }

    #[test]
    fn test_sub_id_fills_both_slots() {
        let msg_type = MsgType::Heartbeat;
        let message = Encoder::new().finish(&header(&msg_type, 1));
        assert_eq!(get_tag_value(&message, tags::TARGET_SUB_ID, 0), Some("QUOTE"));
        assert_eq!(get_tag_value(&message, tags::SENDER_SUB_ID, 0), Some("QUOTE"));
    }

    #[test]
    fn test_body_length_counts_from_msg_type_through_body() {
        let msg_type = MsgType::NewOrderSingle;
        for n in [0usize, 1, 5, 40] {
            let mut encoder = Encoder::new();
            for i in 0..n {
                encoder.put_str(5000 + i as u32, "value");
            }
            encoder.put_str(58, "caf\u{e9} \u{2713}");
            let body_len = encoder.body_len();
            let message = encoder.finish(&header(&msg_type, 3));

            let start = memchr::memmem::find(&message, b"35=").unwrap();
            let end = message.len() - TRAILER_LEN;
            assert_eq!(declared_body_length(&message), end - start);
            assert!(end - start > body_len);
        }
    }

    #[test]
    fn test_checksum_matches_preceding_bytes() {
        let msg_type = MsgType::MarketDataRequest;
        for body in ["", "262=1\x01", "55=1\x01146=1\x01", "58=\u{e9}\u{e9}\u{e9}\x01"] {
            let framed = build_header(&header(&msg_type, 11), body.as_bytes());
            let message = finalize(framed);

            let trailer_at = message.len() - TRAILER_LEN;
            assert_eq!(&message[trailer_at..trailer_at + 3], b"10=");
            assert_eq!(message[message.len() - 1], SOH);

            let sum: u32 = message[..trailer_at].iter().map(|&b| u32::from(b)).sum();
            let declared = parse_checksum(&message[trailer_at + 3..trailer_at + 6]).unwrap();
            assert_eq!(u32::from(declared), sum % 256);
        }
    }

    #[test]
    fn test_encoder_body_fields() {
        let mut encoder = Encoder::new();
        encoder.put_uint(11, 42);
        encoder.put_char(54, '1');
        encoder.put_str(55, "1");
        assert_eq!(encoder.body(), b"11=42\x0154=1\x0155=1\x01");
    }
}
