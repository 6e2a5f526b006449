/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/10/26
******************************************************************************/

//! Zero-copy field lookup over received FIX bytes.
//!
//! Received buffers are not validated as whole messages. The functions here
//! scan for `tag=value<SOH>` fields and return values borrowed from the
//! input. A field only counts when it is terminated by SOH, so padding left
//! in a fixed-size receive buffer can never be matched as a value.
//!
//! MsgType markers are the exception: [`msg_types`] also accepts a `35=`
//! field at the very start of the buffer or cut off at its end, since a
//! single short read may hold nothing else.

use fixlink_core::field::FieldRef;
use fixlink_core::message::MsgType;
use memchr::memchr;

/// SOH (Start of Header) delimiter used in FIX messages.
pub const SOH: u8 = 0x01;

/// Equals sign delimiter between tag and value.
pub const EQUALS: u8 = b'=';

/// Strips trailing NUL padding left by a fixed-capacity read buffer.
#[inline]
#[must_use]
pub fn trim_padding(raw: &[u8]) -> &[u8] {
    let end = raw.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    &raw[..end]
}

/// Returns an iterator over every SOH-terminated field in `raw`.
#[inline]
#[must_use]
pub fn fields(raw: &[u8]) -> Fields<'_> {
    Fields {
        input: raw,
        offset: 0,
    }
}

/// Returns an iterator over the values of `tag`, in message order.
///
/// Only fields that follow a separator are considered, which excludes
/// the leading BeginString field and any text before the first SOH.
/// Values that are not valid UTF-8 are skipped.
#[must_use]
pub fn tag_values(raw: &[u8], tag: u32) -> TagValues<'_> {
    let offset = memchr(SOH, raw).map_or(raw.len(), |pos| pos + 1);
    TagValues {
        fields: Fields { input: raw, offset },
        tag,
    }
}

/// Returns the value of the `occurrence`-th (zero-based) `tag` field.
///
/// # Arguments
/// * `raw` - Received bytes, possibly followed by padding
/// * `tag` - The tag to look for
/// * `occurrence` - Which repetition of the tag to return
///
/// # Returns
/// The value, or `None` if that occurrence does not exist.
#[must_use]
pub fn get_tag_value(raw: &[u8], tag: u32, occurrence: usize) -> Option<&str> {
    tag_values(raw, tag).nth(occurrence)
}

/// Returns an iterator over every MsgType (35) marker in `raw`.
///
/// A marker is `35=` at offset 0 or right after an SOH, running to the next
/// SOH or the end of the unpadded buffer. `135=A` is not a marker.
#[must_use]
pub fn msg_types(raw: &[u8]) -> MsgTypes<'_> {
    MsgTypes {
        input: trim_padding(raw),
        offset: 0,
    }
}

/// Returns true if any MsgType (35) marker in `raw` equals `msg_type`.
#[must_use]
pub fn contains_msg_type(raw: &[u8], msg_type: &MsgType) -> bool {
    msg_types(raw).any(|found| found == *msg_type)
}

/// Renders raw FIX bytes for logs, showing each SOH as ` | `.
#[must_use]
pub fn display_message(raw: &[u8]) -> String {
    String::from_utf8_lossy(trim_padding(raw)).replace('\u{1}', " | ")
}

/// Iterator over SOH-terminated fields.
///
/// Malformed fields (no `=`, non-numeric tag) are skipped rather than
/// ending the scan.
#[derive(Debug, Clone)]
pub struct Fields<'a> {
    input: &'a [u8],
    offset: usize,
}

impl<'a> Iterator for Fields<'a> {
    type Item = FieldRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let remaining = self.input.get(self.offset..)?;
            let soh_pos = memchr(SOH, remaining)?;
            let field = &remaining[..soh_pos];
            self.offset += soh_pos + 1;

            let Some(eq_pos) = memchr(EQUALS, field) else {
                continue;
            };
            if let Some(tag) = parse_tag(&field[..eq_pos]) {
                return Some(FieldRef::new(tag, &field[eq_pos + 1..]));
            }
        }
    }
}

/// Iterator over the values of one tag. See [`tag_values`].
#[derive(Debug, Clone)]
pub struct TagValues<'a> {
    fields: Fields<'a>,
    tag: u32,
}

impl<'a> Iterator for TagValues<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.tag;
        self.fields
            .by_ref()
            .filter(|f| f.tag == tag)
            .find_map(|f| f.as_str().ok())
    }
}

/// Iterator over MsgType markers. See [`msg_types`].
#[derive(Debug, Clone)]
pub struct MsgTypes<'a> {
    input: &'a [u8],
    offset: usize,
}

impl Iterator for MsgTypes<'_> {
    type Item = MsgType;

    fn next(&mut self) -> Option<Self::Item> {
        const MARKER: &[u8] = b"35=";
        loop {
            let remaining = self.input.get(self.offset..)?;
            if remaining.is_empty() {
                return None;
            }
            let end = memchr(SOH, remaining).unwrap_or(remaining.len());
            self.offset += end + 1;

            let Some(value) = remaining[..end].strip_prefix(MARKER) else {
                continue;
            };
            if let Ok(value) = std::str::from_utf8(value)
                && !value.is_empty()
            {
                return value.parse().ok();
            }
        }
    }
}

/// Parses a tag number from ASCII bytes.
#[inline]
fn parse_tag(bytes: &[u8]) -> Option<u32> {
    if bytes.is_empty() || bytes.len() > 10 {
        return None;
    }

    let mut result: u32 = 0;
    for &b in bytes {
        if !b.is_ascii_digit() {
            return None;
        }
        result = result.checked_mul(10)?.checked_add((b - b'0') as u32)?;
    }

    Some(result)
}
