//! RFC 3161 TimeStampResp and TimeStampToken domain types.
//!
//! A `TimeStampResp` wraps a PKI status and, when granted, a
//! `TimeStampToken` (a PKCS#7 SignedData `ContentInfo`). The token is what
//! gets embedded into signatures, either as the `id-aa-timeStampToken`
//! unsigned attribute or directly as DocTimeStamp `/Contents`.

use crate::domain::constants;
use crate::domain::der::DerCursor;
use crate::infra::error::{SigningError, SigningResult};

/// PKIStatus granted (RFC 3161 §2.4.2).
const PKI_STATUS_GRANTED: i64 = 0;

/// Parsed `TimeStampResp`.
#[derive(Debug, Clone)]
pub struct TimestampResponse {
    status: i64,
    token: Option<TimestampToken>,
}

impl TimestampResponse {
    /// Parse a DER `TimeStampResp`.
    ///
    /// ```text
    /// TimeStampResp ::= SEQUENCE {
    ///   status          PKIStatusInfo,
    ///   timeStampToken  TimeStampToken OPTIONAL }
    /// ```
    pub fn from_der(der: &[u8]) -> SigningResult<Self> {
        let mut cursor = DerCursor::new(der);
        let outer = cursor.expect(constants::ASN1_SEQUENCE_TAG, "TimeStampResp")?;

        let mut fields = DerCursor::new(outer.content);
        let status_info = fields.expect(constants::ASN1_SEQUENCE_TAG, "PKIStatusInfo")?;

        let mut status_fields = DerCursor::new(status_info.content);
        let status_int = status_fields.expect(constants::ASN1_INTEGER_TAG, "PKIStatus")?;
        let status = decode_small_integer(status_int.content)?;

        let token = if fields.is_at_end() {
            None
        } else {
            let token_tlv = fields.expect(constants::ASN1_SEQUENCE_TAG, "timeStampToken")?;
            Some(TimestampToken::from_der(token_tlv.raw.to_vec())?)
        };

        Ok(Self { status, token })
    }

    #[must_use]
    pub fn status(&self) -> i64 {
        self.status
    }

    #[must_use]
    pub fn is_granted(&self) -> bool {
        self.status == PKI_STATUS_GRANTED
    }

    /// The embedded token regardless of status, when present.
    #[must_use]
    pub fn token(&self) -> Option<&TimestampToken> {
        self.token.as_ref()
    }

    /// The embedded token, failing with `TimestampRejected` when the TSA did
    /// not grant the request and `ParseFailure` when a granted response
    /// carries no token.
    pub fn into_token(self) -> SigningResult<TimestampToken> {
        if !self.is_granted() {
            return Err(SigningError::TimestampRejected(format!(
                "TimeStampResp status {} is not granted",
                self.status
            )));
        }
        self.token.ok_or_else(|| {
            SigningError::ParseFailure("granted TimeStampResp carries no timeStampToken".into())
        })
    }
}

/// A `TimeStampToken`: PKCS#7 SignedData over a TSTInfo.
#[derive(Debug, Clone)]
pub struct TimestampToken {
    der: Vec<u8>,
    message_imprint_hash: Vec<u8>,
}

impl TimestampToken {
    /// Parse and validate a token from its DER `ContentInfo` bytes.
    pub fn from_der(der: Vec<u8>) -> SigningResult<Self> {
        let signed_data = signed_data_content(&der)?;
        let message_imprint_hash = parse_message_imprint(signed_data)?;
        Ok(Self {
            der,
            message_imprint_hash,
        })
    }

    #[must_use]
    pub fn as_der(&self) -> &[u8] {
        &self.der
    }

    #[must_use]
    pub fn into_der(self) -> Vec<u8> {
        self.der
    }

    /// `TSTInfo.messageImprint.hashedMessage`.
    #[must_use]
    pub fn message_imprint_hash(&self) -> &[u8] {
        &self.message_imprint_hash
    }

    /// Raw DER of each certificate embedded in the token's SignedData
    /// certificate set, in encoded order. The TSA signer certificate sits at
    /// index 0 by convention; its issuer, when embedded, at index 1.
    pub fn certificates(&self) -> SigningResult<Vec<Vec<u8>>> {
        let signed_data = signed_data_content(&self.der)?;
        let mut fields = DerCursor::new(signed_data);
        fields.expect(constants::ASN1_INTEGER_TAG, "SignedData.version")?;
        fields.expect(constants::ASN1_SET_TAG, "SignedData.digestAlgorithms")?;
        fields.expect(constants::ASN1_SEQUENCE_TAG, "SignedData.encapContentInfo")?;

        let mut certs = Vec::new();
        if !fields.is_at_end() && fields.peek_tag()? == constants::ASN1_CONTEXT_0_TAG {
            let cert_set = fields.read()?;
            let mut entries = DerCursor::new(cert_set.content);
            while !entries.is_at_end() {
                let cert = entries.expect(constants::ASN1_SEQUENCE_TAG, "Certificate")?;
                certs.push(cert.raw.to_vec());
            }
        }
        Ok(certs)
    }
}

/// Descend through `ContentInfo { id-signedData, [0] { SignedData } }` and
/// return the SignedData SEQUENCE content.
fn signed_data_content(token_der: &[u8]) -> SigningResult<&[u8]> {
    let mut cursor = DerCursor::new(token_der);
    let content_info = cursor.expect(constants::ASN1_SEQUENCE_TAG, "ContentInfo")?;

    let mut fields = DerCursor::new(content_info.content);
    let content_type = fields.expect(constants::ASN1_OID_TAG, "ContentInfo.contentType")?;
    if content_type.content != constants::OID_ID_SIGNED_DATA {
        return Err(SigningError::ParseFailure(
            "timeStampToken contentType is not id-signedData".into(),
        ));
    }

    let explicit = fields.expect(constants::ASN1_CONTEXT_0_TAG, "ContentInfo.content")?;
    let mut inner = DerCursor::new(explicit.content);
    let signed_data = inner.expect(constants::ASN1_SEQUENCE_TAG, "SignedData")?;
    Ok(signed_data.content)
}

/// Walk to `TSTInfo.messageImprint.hashedMessage`.
///
/// The TSTInfo travels as the OCTET STRING eContent of the token's
/// encapContentInfo.
fn parse_message_imprint(signed_data: &[u8]) -> SigningResult<Vec<u8>> {
    let mut fields = DerCursor::new(signed_data);
    fields.expect(constants::ASN1_INTEGER_TAG, "SignedData.version")?;
    fields.expect(constants::ASN1_SET_TAG, "SignedData.digestAlgorithms")?;
    let encap = fields.expect(constants::ASN1_SEQUENCE_TAG, "SignedData.encapContentInfo")?;

    let mut encap_fields = DerCursor::new(encap.content);
    encap_fields.expect(constants::ASN1_OID_TAG, "eContentType")?;
    let econtent_wrapper = encap_fields.expect(constants::ASN1_CONTEXT_0_TAG, "eContent")?;
    let mut econtent_cursor = DerCursor::new(econtent_wrapper.content);
    let tst_octets = econtent_cursor.expect(constants::ASN1_OCTET_STRING_TAG, "TSTInfo octets")?;

    let mut tst_cursor = DerCursor::new(tst_octets.content);
    let tst_info = tst_cursor.expect(constants::ASN1_SEQUENCE_TAG, "TSTInfo")?;

    let mut tst_fields = DerCursor::new(tst_info.content);
    tst_fields.expect(constants::ASN1_INTEGER_TAG, "TSTInfo.version")?;
    tst_fields.expect(constants::ASN1_OID_TAG, "TSTInfo.policy")?;
    let imprint = tst_fields.expect(constants::ASN1_SEQUENCE_TAG, "TSTInfo.messageImprint")?;

    let mut imprint_fields = DerCursor::new(imprint.content);
    imprint_fields.expect(constants::ASN1_SEQUENCE_TAG, "messageImprint.hashAlgorithm")?;
    let hashed = imprint_fields.expect(
        constants::ASN1_OCTET_STRING_TAG,
        "messageImprint.hashedMessage",
    )?;
    Ok(hashed.content.to_vec())
}

fn decode_small_integer(content: &[u8]) -> SigningResult<i64> {
    if content.is_empty() || content.len() > 8 {
        return Err(SigningError::ParseFailure(
            "PKIStatus integer out of range".into(),
        ));
    }
    let mut value: i64 = 0;
    for &byte in content {
        value = (value << 8) | i64::from(byte);
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::der;

    /// TimeStampResp with a given status and no token.
    fn status_only_resp(status: u8) -> Vec<u8> {
        let status_info = der::sequence(&[&der::integer(&[status])]);
        der::sequence(&[&status_info])
    }

    #[test]
    fn parse_rejects_empty() {
        assert!(TimestampResponse::from_der(&[]).is_err());
    }

    #[test]
    fn parse_rejects_non_sequence() {
        assert!(TimestampResponse::from_der(&[0x02, 0x01, 0x00]).is_err());
    }

    #[test]
    fn status_only_response_parses() {
        let resp = TimestampResponse::from_der(&status_only_resp(0)).unwrap();
        assert_eq!(resp.status(), 0);
        assert!(resp.is_granted());
        // Granted but tokenless is a parse failure, not a rejection.
        assert!(matches!(
            resp.into_token(),
            Err(SigningError::ParseFailure(_))
        ));
    }

    #[test]
    fn rejected_status_maps_to_timestamp_rejected() {
        let resp = TimestampResponse::from_der(&status_only_resp(2)).unwrap();
        assert_eq!(resp.status(), 2);
        assert!(!resp.is_granted());
        assert!(matches!(
            resp.into_token(),
            Err(SigningError::TimestampRejected(_))
        ));
    }

    #[test]
    fn token_requires_signed_data_oid() {
        // ContentInfo claiming id-data instead of id-signedData.
        let wrong = der::sequence(&[
            &der::oid(constants::OID_ID_DATA),
            &der::context(0, &der::sequence(&[])),
        ]);
        assert!(TimestampToken::from_der(wrong).is_err());
    }
}
