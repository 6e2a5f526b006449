/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/10/26
******************************************************************************/

//! Field tags and zero-copy field references.
//!
//! This module provides:
//! - [`tags`]: the tag numbers this client sends and reads
//! - [`FieldRef`]: a borrowed `tag=value` pair inside a received buffer

use crate::error::DecodeError;
use std::str::FromStr;

/// Tag numbers used by the quote and trade sessions.
pub mod tags {
    /// BeginString.
    pub const BEGIN_STRING: u32 = 8;
    /// BodyLength.
    pub const BODY_LENGTH: u32 = 9;
    /// CheckSum.
    pub const CHECK_SUM: u32 = 10;
    /// ClOrdID.
    pub const CL_ORD_ID: u32 = 11;
    /// MsgSeqNum.
    pub const MSG_SEQ_NUM: u32 = 34;
    /// MsgType.
    pub const MSG_TYPE: u32 = 35;
    /// OrderQty.
    pub const ORDER_QTY: u32 = 38;
    /// OrdType.
    pub const ORD_TYPE: u32 = 40;
    /// SenderCompID.
    pub const SENDER_COMP_ID: u32 = 49;
    /// SenderSubID.
    pub const SENDER_SUB_ID: u32 = 50;
    /// SendingTime.
    pub const SENDING_TIME: u32 = 52;
    /// Side.
    pub const SIDE: u32 = 54;
    /// Symbol.
    pub const SYMBOL: u32 = 55;
    /// TargetCompID.
    pub const TARGET_COMP_ID: u32 = 56;
    /// TargetSubID.
    pub const TARGET_SUB_ID: u32 = 57;
    /// Text.
    pub const TEXT: u32 = 58;
    /// TimeInForce.
    pub const TIME_IN_FORCE: u32 = 59;
    /// TransactTime.
    pub const TRANSACT_TIME: u32 = 60;
    /// EncryptMethod.
    pub const ENCRYPT_METHOD: u32 = 98;
    /// HeartBtInt.
    pub const HEART_BT_INT: u32 = 108;
    /// NoRelatedSym.
    pub const NO_RELATED_SYM: u32 = 146;
    /// MDReqID.
    pub const MD_REQ_ID: u32 = 262;
    /// SubscriptionRequestType.
    pub const SUBSCRIPTION_REQUEST_TYPE: u32 = 263;
    /// MarketDepth.
    pub const MARKET_DEPTH: u32 = 264;
    /// MDUpdateType.
    pub const MD_UPDATE_TYPE: u32 = 265;
    /// NoMDEntryTypes.
    pub const NO_MD_ENTRY_TYPES: u32 = 267;
    /// NoMDEntries.
    pub const NO_MD_ENTRIES: u32 = 268;
    /// MDEntryType.
    pub const MD_ENTRY_TYPE: u32 = 269;
    /// MDEntryPx.
    pub const MD_ENTRY_PX: u32 = 270;
    /// Username.
    pub const USERNAME: u32 = 553;
    /// Password.
    pub const PASSWORD: u32 = 554;
}

/// Zero-copy reference to a field within a FIX message buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRef<'a> {
    /// The field tag number.
    pub tag: u32,
    /// Reference to the field value bytes (without delimiters).
    pub value: &'a [u8],
}

impl<'a> FieldRef<'a> {
    /// Creates a new field reference.
    ///
    /// # Arguments
    /// * `tag` - The field tag number
    /// * `value` - Reference to the value bytes
    #[inline]
    #[must_use]
    pub const fn new(tag: u32, value: &'a [u8]) -> Self {
        Self { tag, value }
    }

    /// Returns the value as a string slice.
    ///
    /// # Errors
    /// Returns `DecodeError::InvalidUtf8` if the value is not valid UTF-8.
    pub fn as_str(&self) -> Result<&'a str, DecodeError> {
        std::str::from_utf8(self.value).map_err(DecodeError::from)
    }

    /// Parses the value as the specified type.
    ///
    /// # Errors
    /// Returns `DecodeError::InvalidFieldValue` if parsing fails.
    pub fn parse<T: FromStr>(&self) -> Result<T, DecodeError> {
        let s = self.as_str()?;
        s.parse().map_err(|_| DecodeError::InvalidFieldValue {
            tag: self.tag,
            reason: format!("failed to parse '{}' as {}", s, std::any::type_name::<T>()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_ref_as_str() {
        let field = FieldRef::new(tags::MD_ENTRY_PX, b"1.10500");
        assert_eq!(field.as_str().unwrap(), "1.10500");
    }

    #[test]
    fn test_field_ref_parse_float() {
        let field = FieldRef::new(tags::MD_ENTRY_PX, b"1.10520");
        let px: f64 = field.parse().unwrap();
        assert!((px - 1.10520).abs() < f64::EPSILON);
    }

    #[test]
    fn test_field_ref_parse_invalid() {
        let field = FieldRef::new(tags::MD_ENTRY_PX, b"n/a");
        let err = field.parse::<f64>().unwrap_err();
        assert!(matches!(
            err,
            DecodeError::InvalidFieldValue { tag: 270, .. }
        ));
    }

    #[test]
    fn test_field_ref_invalid_utf8() {
        let field = FieldRef::new(tags::TEXT, &[0xff, 0xfe]);
        assert!(matches!(field.as_str(), Err(DecodeError::InvalidUtf8(_))));
    }
}
