//! ByteRange arithmetic and in-place patching of serialized PDF bytes.
//!
//! A signature dictionary reserves a zero-filled `/Contents` hex string and
//! a fixed-width `/ByteRange` placeholder. Offsets are only known once the
//! document is serialized, so both are patched directly in the byte buffer,
//! keeping every other offset stable.

use crate::domain::constants;
use crate::infra::codec::hex_encode;
use crate::infra::error::{SigningError, SigningResult};

/// The two-span byte coverage of a signature: `[0 b c d]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    /// Offset of the `<` opening the `/Contents` hex string.
    pub contents_start: usize,
    /// Offset just past the closing `>`.
    pub contents_end: usize,
    /// Total file length.
    pub file_len: usize,
}

impl ByteRange {
    #[must_use]
    pub fn as_array(&self) -> [i64; 4] {
        [
            0,
            self.contents_start as i64,
            self.contents_end as i64,
            (self.file_len - self.contents_end) as i64,
        ]
    }

    /// The two spans outside the `/Contents` hex string.
    #[must_use]
    pub fn spans<'a>(&self, bytes: &'a [u8]) -> (&'a [u8], &'a [u8]) {
        (
            &bytes[..self.contents_start],
            &bytes[self.contents_end..],
        )
    }
}

/// Locate the reserved `/Contents` slot: the last `<00...0>` hex run of
/// exactly `2 * capacity` zero digits.
pub fn find_contents_placeholder(bytes: &[u8], capacity: usize) -> SigningResult<ByteRange> {
    let mut pattern = Vec::with_capacity(2 * capacity + 2);
    pattern.push(b'<');
    pattern.resize(2 * capacity + 1, b'0');
    pattern.push(b'>');

    let start = rfind(bytes, &pattern).ok_or_else(|| {
        SigningError::ParseFailure(format!(
            "reserved /Contents placeholder of {capacity} bytes not found"
        ))
    })?;
    Ok(ByteRange {
        contents_start: start,
        contents_end: start + pattern.len(),
        file_len: bytes.len(),
    })
}

/// Replace the `/ByteRange` placeholder values in place, space-padded to the
/// placeholder width so no other offset moves.
pub fn patch_byte_range(bytes: &mut [u8], range: &ByteRange) -> SigningResult<()> {
    let placeholder = format!(
        "{} {} {} {}",
        constants::BYTE_RANGE_PLACEHOLDER[0],
        constants::BYTE_RANGE_PLACEHOLDER[1],
        constants::BYTE_RANGE_PLACEHOLDER[2],
        constants::BYTE_RANGE_PLACEHOLDER[3]
    );
    let position = rfind(bytes, placeholder.as_bytes()).ok_or_else(|| {
        SigningError::ParseFailure("/ByteRange placeholder not found".into())
    })?;

    let values = range.as_array();
    let rendered = format!("{} {} {} {}", values[0], values[1], values[2], values[3]);
    if rendered.len() > placeholder.len() {
        return Err(SigningError::ParseFailure(
            "/ByteRange values exceed the reserved width".into(),
        ));
    }

    let slot = &mut bytes[position..position + placeholder.len()];
    slot.fill(b' ');
    slot[..rendered.len()].copy_from_slice(rendered.as_bytes());
    Ok(())
}

/// Hex-encode `payload` into the reserved slot, zero-padded to capacity.
/// Fails with `SignatureOverflow` when the payload does not fit.
pub fn write_contents(
    bytes: &mut [u8],
    range: &ByteRange,
    payload: &[u8],
    capacity: usize,
) -> SigningResult<()> {
    if payload.len() > capacity {
        return Err(SigningError::SignatureOverflow(format!(
            "signature container is {} bytes but the reserved capacity is {capacity}",
            payload.len()
        )));
    }
    let hex = hex_encode(payload);
    let slot_start = range.contents_start + 1;
    let slot = &mut bytes[slot_start..slot_start + 2 * capacity];
    slot.fill(b'0');
    slot[..hex.len()].copy_from_slice(hex.as_bytes());
    Ok(())
}

/// Last occurrence of `needle` in `haystack`.
fn rfind(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    (0..=haystack.len() - needle.len())
        .rev()
        .find(|&i| &haystack[i..i + needle.len()] == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer_with_placeholder(capacity: usize) -> Vec<u8> {
        let mut bytes = b"%PDF-1.7 /ByteRange [0 9999999999 9999999999 9999999999] /Contents ".to_vec();
        bytes.push(b'<');
        bytes.extend(std::iter::repeat(b'0').take(2 * capacity));
        bytes.push(b'>');
        bytes.extend_from_slice(b" trailer %%EOF\n");
        bytes
    }

    #[test]
    fn placeholder_location_and_sums() {
        let bytes = buffer_with_placeholder(16);
        let range = find_contents_placeholder(&bytes, 16).unwrap();
        assert_eq!(bytes[range.contents_start], b'<');
        assert_eq!(bytes[range.contents_end - 1], b'>');

        let values = range.as_array();
        assert_eq!(values[0] + values[1], range.contents_start as i64);
        assert_eq!(
            values[1] + (range.contents_end - range.contents_start) as i64,
            values[2]
        );
        assert_eq!(values[2] + values[3], bytes.len() as i64);
    }

    #[test]
    fn missing_placeholder_is_an_error() {
        let bytes = b"%PDF-1.7 no placeholder here".to_vec();
        assert!(find_contents_placeholder(&bytes, 16).is_err());
    }

    #[test]
    fn byte_range_patch_keeps_length() {
        let mut bytes = buffer_with_placeholder(16);
        let before = bytes.len();
        let range = find_contents_placeholder(&bytes, 16).unwrap();
        patch_byte_range(&mut bytes, &range).unwrap();
        assert_eq!(bytes.len(), before);
        assert!(!bytes
            .windows(b"9999999999".len())
            .any(|w| w == b"9999999999"));
        let rendered = format!("0 {} {} ", range.contents_start, range.contents_end);
        assert!(bytes
            .windows(rendered.len())
            .any(|w| w == rendered.as_bytes()));
    }

    #[test]
    fn contents_write_pads_and_checks_overflow() {
        let mut bytes = buffer_with_placeholder(8);
        let range = find_contents_placeholder(&bytes, 8).unwrap();

        write_contents(&mut bytes, &range, &[0xAB, 0xCD], 8).unwrap();
        let slot = &bytes[range.contents_start + 1..range.contents_end - 1];
        assert_eq!(&slot[..4], b"abcd");
        assert!(slot[4..].iter().all(|&b| b == b'0'));

        let too_big = vec![0u8; 9];
        assert!(matches!(
            write_contents(&mut bytes, &range, &too_big, 8),
            Err(SigningError::SignatureOverflow(_))
        ));
    }

    #[test]
    fn spans_exclude_contents() {
        let bytes = buffer_with_placeholder(8);
        let range = find_contents_placeholder(&bytes, 8).unwrap();
        let (head, tail) = range.spans(&bytes);
        assert_eq!(head.len() + tail.len() + (2 * 8 + 2), bytes.len());
        assert_eq!(head.last(), Some(&b' '));
        assert_eq!(tail.first(), Some(&b' '));
    }
}
