//! Minimal DER building and walking primitives.
//!
//! The CMS builder and the TSR/OCSP code assemble their structures from
//! these helpers instead of going through a full ASN.1 compiler; the
//! structures involved are small and fixed. Certificate-level parsing is
//! delegated to `x509-cert`.

use crate::domain::constants;
use crate::infra::error::{SigningError, SigningResult};

/// Encode a definite-form DER length.
#[must_use]
pub fn encode_len(len: usize) -> Vec<u8> {
    if len < 0x80 {
        vec![len as u8]
    } else if len < 0x100 {
        vec![0x81, len as u8]
    } else if len < 0x1_0000 {
        vec![0x82, (len >> 8) as u8, (len & 0xFF) as u8]
    } else {
        vec![
            0x83,
            (len >> 16) as u8,
            ((len >> 8) & 0xFF) as u8,
            (len & 0xFF) as u8,
        ]
    }
}

/// Wrap content bytes in a tag + definite length.
#[must_use]
pub fn tlv(tag: u8, content: &[u8]) -> Vec<u8> {
    let mut out = vec![tag];
    out.extend_from_slice(&encode_len(content.len()));
    out.extend_from_slice(content);
    out
}

/// SEQUENCE over concatenated parts.
#[must_use]
pub fn sequence(parts: &[&[u8]]) -> Vec<u8> {
    let content: Vec<u8> = parts.iter().flat_map(|p| p.iter().copied()).collect();
    tlv(constants::ASN1_SEQUENCE_TAG, &content)
}

/// SET over already-ordered content.
#[must_use]
pub fn set(content: &[u8]) -> Vec<u8> {
    tlv(constants::ASN1_SET_TAG, content)
}

/// OBJECT IDENTIFIER from raw OID content bytes.
#[must_use]
pub fn oid(content: &[u8]) -> Vec<u8> {
    tlv(constants::ASN1_OID_TAG, content)
}

/// INTEGER, inserting a leading zero when the high bit is set.
#[must_use]
pub fn integer(value: &[u8]) -> Vec<u8> {
    if !value.is_empty() && value[0] & 0x80 != 0 {
        let mut padded = vec![0u8];
        padded.extend_from_slice(value);
        tlv(constants::ASN1_INTEGER_TAG, &padded)
    } else {
        tlv(constants::ASN1_INTEGER_TAG, value)
    }
}

/// OCTET STRING.
#[must_use]
pub fn octet_string(content: &[u8]) -> Vec<u8> {
    tlv(constants::ASN1_OCTET_STRING_TAG, content)
}

/// Constructed context-specific wrapper `[n]`.
#[must_use]
pub fn context(tag_number: u8, content: &[u8]) -> Vec<u8> {
    tlv(0xA0 | tag_number, content)
}

/// AlgorithmIdentifier with NULL parameters.
#[must_use]
pub fn algorithm_identifier(oid_content: &[u8]) -> Vec<u8> {
    let oid_der = oid(oid_content);
    sequence(&[&oid_der, constants::ASN1_NULL])
}

/// AlgorithmIdentifier with absent parameters (ECDSA convention).
#[must_use]
pub fn algorithm_identifier_no_params(oid_content: &[u8]) -> Vec<u8> {
    let oid_der = oid(oid_content);
    sequence(&[&oid_der])
}

/// Encode a dotted OID string into its DER content bytes.
pub fn encode_oid_dotted(dotted: &str) -> SigningResult<Vec<u8>> {
    let mut arcs = dotted.split('.').map(|part| {
        part.parse::<u64>()
            .map_err(|_| SigningError::MalformedInput(format!("bad OID component in {dotted}")))
    });
    let first = arcs
        .next()
        .transpose()?
        .ok_or_else(|| SigningError::MalformedInput("empty OID".into()))?;
    let second = arcs
        .next()
        .transpose()?
        .ok_or_else(|| SigningError::MalformedInput(format!("OID {dotted} has one component")))?;
    if first > 2 || (first < 2 && second > 39) {
        return Err(SigningError::MalformedInput(format!(
            "invalid OID root arcs in {dotted}"
        )));
    }

    fn push_base128(out: &mut Vec<u8>, mut value: u64) {
        let mut chunk = vec![(value & 0x7F) as u8];
        value >>= 7;
        while value > 0 {
            chunk.push(((value & 0x7F) | 0x80) as u8);
            value >>= 7;
        }
        chunk.reverse();
        out.extend_from_slice(&chunk);
    }

    let mut out = Vec::new();
    push_base128(&mut out, first * 40 + second);
    for arc in arcs {
        push_base128(&mut out, arc?);
    }
    Ok(out)
}

/// A parsed TLV element: tag, full span, and content span.
#[derive(Debug, Clone, Copy)]
pub struct Tlv<'a> {
    pub tag: u8,
    /// Complete element including tag and length bytes.
    pub raw: &'a [u8],
    /// Content bytes only.
    pub content: &'a [u8],
}

/// Forward-only reader over a DER byte string.
///
/// Definite lengths only; anything indefinite or truncated is a
/// `ParseFailure`.
pub struct DerCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> DerCursor<'a> {
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Whether all bytes have been consumed.
    #[must_use]
    pub fn is_at_end(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Tag of the next element without consuming it.
    pub fn peek_tag(&self) -> SigningResult<u8> {
        self.data
            .get(self.pos)
            .copied()
            .ok_or_else(|| SigningError::ParseFailure("unexpected end of DER input".into()))
    }

    /// Read the next TLV element.
    pub fn read(&mut self) -> SigningResult<Tlv<'a>> {
        let start = self.pos;
        let tag = self.peek_tag()?;
        let (header_len, content_len) = parse_length(&self.data[start + 1..])?;
        let total = 1 + header_len + content_len;
        if start + total > self.data.len() {
            return Err(SigningError::ParseFailure(format!(
                "DER element of {content_len} bytes overruns input"
            )));
        }
        let raw = &self.data[start..start + total];
        let content = &self.data[start + 1 + header_len..start + total];
        self.pos = start + total;
        Ok(Tlv { tag, raw, content })
    }

    /// Read the next element, failing unless it carries the expected tag.
    pub fn expect(&mut self, tag: u8, what: &str) -> SigningResult<Tlv<'a>> {
        let element = self.read()?;
        if element.tag != tag {
            return Err(SigningError::ParseFailure(format!(
                "expected {what} (tag 0x{tag:02x}), found tag 0x{:02x}",
                element.tag
            )));
        }
        Ok(element)
    }

    /// Skip the next element if it carries the given tag.
    pub fn skip_if(&mut self, tag: u8) -> SigningResult<bool> {
        if !self.is_at_end() && self.peek_tag()? == tag {
            self.read()?;
            return Ok(true);
        }
        Ok(false)
    }
}

/// Parse a definite DER length; returns (length-byte count, content length).
fn parse_length(data: &[u8]) -> SigningResult<(usize, usize)> {
    let first = *data
        .first()
        .ok_or_else(|| SigningError::ParseFailure("missing DER length".into()))?;
    if first & 0x80 == 0 {
        return Ok((1, first as usize));
    }
    let count = (first & 0x7F) as usize;
    if count == 0 || count > 4 || data.len() < 1 + count {
        return Err(SigningError::ParseFailure(
            "invalid DER length encoding".into(),
        ));
    }
    let mut len = 0usize;
    for &byte in &data[1..=count] {
        len = (len << 8) | byte as usize;
    }
    Ok((1 + count, len))
}
