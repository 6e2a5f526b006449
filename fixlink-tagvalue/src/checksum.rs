/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/10/26
******************************************************************************/

//! CheckSum (10) handling.
//!
//! The trailer value is the byte sum of everything before `10=`, taken
//! modulo 256 and written as exactly three ASCII digits.

/// Width of the CheckSum value on the wire.
pub const CHECKSUM_WIDTH: usize = 3;

/// Sums `data` modulo 256.
///
/// ```
/// use fixlink_tagvalue::calculate_checksum;
///
/// assert_eq!(calculate_checksum(b"8=FIX.4.4\x019=5\x0135=0\x01"), 163);
/// ```
#[inline]
#[must_use]
pub fn calculate_checksum(data: &[u8]) -> u8 {
    data.iter().fold(0u8, |acc, &b| acc.wrapping_add(b))
}

/// Renders a checksum as three zero-padded digits.
#[inline]
#[must_use]
pub fn format_checksum(checksum: u8) -> [u8; CHECKSUM_WIDTH] {
    [
        b'0' + checksum / 100,
        b'0' + checksum / 10 % 10,
        b'0' + checksum % 10,
    ]
}

/// Reads a CheckSum value.
///
/// Returns `None` unless `bytes` is exactly three ASCII digits naming a
/// value in `0..=255`. `"999"` is rejected, not wrapped.
#[must_use]
pub fn parse_checksum(bytes: &[u8]) -> Option<u8> {
    let digits: &[u8; CHECKSUM_WIDTH] = bytes.try_into().ok()?;
    let mut value: u16 = 0;
    for &digit in digits {
        if !digit.is_ascii_digit() {
            return None;
        }
        value = value * 10 + u16::from(digit - b'0');
    }
    u8::try_from(value).ok()
}
