//! Codec utilities: base64, hex and URL encoding.
//!
//! Pure functions with no state. Hashes travel to the remote signing service
//! as URL-encoded base64; certificates, TSRs and validation data arrive as
//! base64 DER.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::infra::error::{SigningError, SigningResult};

/// Encode bytes as canonical base64 without line breaks.
#[must_use]
pub fn base64_encode(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Decode canonical base64. Fails on non-alphabet characters or bad length.
pub fn base64_decode(input: &str) -> SigningResult<Vec<u8>> {
    STANDARD
        .decode(input.trim())
        .map_err(|e| SigningError::MalformedInput(format!("base64 decode failed: {e}")))
}

/// Encode bytes as lowercase hex.
#[must_use]
pub fn hex_encode(data: &[u8]) -> String {
    hex::encode(data)
}

/// Strict hex decode; rejects odd length and non-hex characters.
pub fn hex_decode(input: &str) -> SigningResult<Vec<u8>> {
    hex::decode(input).map_err(|e| SigningError::MalformedInput(format!("hex decode failed: {e}")))
}

/// Percent-encode per RFC 3986 with the unreserved set `[A-Za-z0-9-_.~]`.
/// Escapes use uppercase hex digits.
#[must_use]
pub fn url_encode(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                escaped.push(byte as char);
            }
            other => {
                escaped.push('%');
                escaped.push_str(&format!("{other:02X}"));
            }
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base64_round_trip() {
        let data: Vec<u8> = (0u8..=255).collect();
        let encoded = base64_encode(&data);
        assert!(!encoded.contains('\n'));
        assert_eq!(base64_decode(&encoded).unwrap(), data);
    }

    #[test]
    fn base64_rejects_non_alphabet() {
        assert!(base64_decode("not*valid*base64!").is_err());
    }

    #[test]
    fn hex_round_trip() {
        let data = [0x00u8, 0x7f, 0x80, 0xff];
        let encoded = hex_encode(&data);
        assert_eq!(encoded, "007f80ff");
        assert_eq!(hex_decode(&encoded).unwrap(), data);
    }

    #[test]
    fn hex_rejects_odd_length() {
        assert!(hex_decode("abc").is_err());
    }

    #[test]
    fn url_encode_unreserved_passthrough() {
        assert_eq!(url_encode("AZaz09-_.~"), "AZaz09-_.~");
    }

    #[test]
    fn url_encode_escapes_base64_specials() {
        // The characters that actually occur in base64 hashes.
        assert_eq!(url_encode("a+b/c="), "a%2Bb%2Fc%3D");
    }

    #[test]
    fn url_encode_uses_uppercase_hex() {
        assert_eq!(url_encode(" "), "%20");
        assert_eq!(url_encode("\n"), "%0A");
    }
}
