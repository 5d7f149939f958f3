//! CMS builder tests: attribute construction, state gating and assembly.

mod common;

use chrono::{TimeZone, Utc};
use common::{test_certificate, timestamp_response, CertSpec};
use sha2::{Digest, Sha256};

use pades_signer::domain::der::DerCursor;
use pades_signer::{CmsBuilderParams, CmsSignerContext, CmsStatus, HashAlgorithm, SigningError};

const OID_MESSAGE_DIGEST: &[u8] = &[0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x09, 0x04];
const OID_SIGNING_CERT_V2: &[u8] = &[
    0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x09, 0x10, 0x02, 0x2F,
];
const OID_TIMESTAMP_TOKEN: &[u8] = &[
    0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x09, 0x10, 0x02, 0x0E,
];
const OID_SIGNED_DATA: &[u8] = &[0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x07, 0x02];

fn fixed_params(wrap: bool) -> CmsBuilderParams {
    CmsBuilderParams {
        hashing: HashAlgorithm::Sha256,
        signing_time_utc: Some(Utc.with_ymd_and_hms(2025, 4, 1, 0, 0, 0).unwrap()),
        do_wrap_digest: wrap,
        ..CmsBuilderParams::default()
    }
}

fn new_context(wrap: bool) -> CmsSignerContext {
    let cert = test_certificate(&CertSpec::named("CMS Signer"));
    let chain = vec![test_certificate(&CertSpec::named("CMS Issuer"))];
    CmsSignerContext::new(cert, chain, fixed_params(wrap)).unwrap()
}

/// Collect (oid, first value DER) pairs from an attribute SET.
fn attributes_of(set_der: &[u8]) -> Vec<(Vec<u8>, Vec<u8>)> {
    let mut cursor = DerCursor::new(set_der);
    let set = cursor.expect(0x31, "attribute set").unwrap();
    let mut attrs = Vec::new();
    let mut entries = DerCursor::new(set.content);
    while !entries.is_at_end() {
        let attr = entries.expect(0x30, "attribute").unwrap();
        let mut fields = DerCursor::new(attr.content);
        let oid = fields.expect(0x06, "attrType").unwrap();
        let values = fields.expect(0x31, "attrValues").unwrap();
        let mut value_cursor = DerCursor::new(values.content);
        let value = value_cursor.read().unwrap();
        attrs.push((oid.content.to_vec(), value.raw.to_vec()));
    }
    attrs
}

#[test]
fn wrapped_hash_is_digest_sized() {
    let mut context = new_context(true);
    context.append_data(b"span one").unwrap();
    context.append_data(b"span two").unwrap();
    let hash = context.compute_hash_to_sign().unwrap();
    assert_eq!(hash.len(), 32);
    assert_eq!(context.status(), CmsStatus::ComputedHash);
}

#[test]
fn message_digest_attribute_covers_appended_data() {
    let mut context = new_context(false);
    context.append_data(b"first half ").unwrap();
    context.append_data(b"second half").unwrap();
    let set_der = context.compute_hash_to_sign().unwrap();

    let expected = Sha256::digest(b"first half second half");
    let attrs = attributes_of(&set_der);
    let digest_attr = attrs
        .iter()
        .find(|(oid, _)| oid == OID_MESSAGE_DIGEST)
        .expect("messageDigest attribute present");
    // value is OCTET STRING { digest }
    let mut cursor = DerCursor::new(&digest_attr.1);
    let octets = cursor.expect(0x04, "digest octets").unwrap();
    assert_eq!(octets.content, expected.as_slice());
}

#[test]
fn signing_certificate_v2_present_and_ordering_canonical() {
    let mut context = new_context(false);
    context.append_data(b"payload").unwrap();
    let set_der = context.compute_hash_to_sign().unwrap();

    let attrs = attributes_of(&set_der);
    assert!(attrs.iter().any(|(oid, _)| oid == OID_SIGNING_CERT_V2));

    // DER SET OF ordering: encodings ascend.
    let mut cursor = DerCursor::new(&set_der);
    let set = cursor.expect(0x31, "set").unwrap();
    let mut entries = DerCursor::new(set.content);
    let mut previous: Option<Vec<u8>> = None;
    while !entries.is_at_end() {
        let attr = entries.read().unwrap().raw.to_vec();
        if let Some(prev) = &previous {
            assert!(prev <= &attr, "attributes must be DER-sorted");
        }
        previous = Some(attr);
    }
}

#[test]
fn signed_attributes_lock_after_hash() {
    let mut context = new_context(true);
    context.append_data(b"data").unwrap();
    context.compute_hash_to_sign().unwrap();

    assert!(matches!(
        context.append_data(b"more"),
        Err(SigningError::InvalidState(_))
    ));
    assert!(matches!(
        context.add_attribute("1.2.840.113549.1.9.7", b"pw", true, true),
        Err(SigningError::InvalidState(_))
    ));
}

#[test]
fn unsigned_timestamp_attribute_lands_in_signer_info() {
    let mut context = new_context(true);
    context.append_data(b"document bytes").unwrap();
    context.compute_hash_to_sign().unwrap();

    let signature = common::fixture_signature(256);
    let tsr = timestamp_response(0, &signature, &[]);
    context.set_timestamp_token(&tsr).unwrap();

    let cms = context.compute_signature(&signature).unwrap();
    assert_eq!(context.status(), CmsStatus::ComputedSignature);

    // ContentInfo { id-signedData, ... } with the token OID inside.
    let mut cursor = DerCursor::new(cms.as_der());
    let content_info = cursor.expect(0x30, "ContentInfo").unwrap();
    assert!(cursor.is_at_end());
    let mut fields = DerCursor::new(content_info.content);
    let oid = fields.expect(0x06, "contentType").unwrap();
    assert_eq!(oid.content, OID_SIGNED_DATA);

    let needle = OID_TIMESTAMP_TOKEN;
    assert!(
        cms.as_der().windows(needle.len()).any(|w| w == needle),
        "timestamp token attribute OID must appear in the CMS"
    );
}

#[test]
fn rejected_tsr_fails_without_state_change() {
    let mut context = new_context(true);
    context.append_data(b"document bytes").unwrap();
    context.compute_hash_to_sign().unwrap();

    let rejected = timestamp_response(2, b"", &[]);
    assert!(matches!(
        context.set_timestamp_token(&rejected),
        Err(SigningError::TimestampRejected(_))
    ));

    // The context is still usable afterwards.
    let cms = context.compute_signature(&common::fixture_signature(256)).unwrap();
    assert!(!cms.is_empty());
}

#[test]
fn unsigned_attributes_close_after_signature() {
    let mut context = new_context(true);
    context.append_data(b"data").unwrap();
    context.compute_hash_to_sign().unwrap();
    context.compute_signature(&common::fixture_signature(64)).unwrap();

    let tsr = timestamp_response(0, b"data", &[]);
    assert!(matches!(
        context.set_timestamp_token(&tsr),
        Err(SigningError::InvalidState(_))
    ));
}

#[test]
fn identical_inputs_yield_identical_cms() {
    let signature = common::fixture_signature(256);
    let build = || {
        let mut context = new_context(true);
        context.append_data(b"same bytes every time").unwrap();
        context.compute_hash_to_sign().unwrap();
        context.compute_signature(&signature).unwrap()
    };
    assert_eq!(build().as_der(), build().as_der());
}

#[test]
fn signature_value_embedded_verbatim() {
    let signature = common::fixture_signature(128);
    let mut context = new_context(true);
    context.append_data(b"bytes").unwrap();
    context.compute_hash_to_sign().unwrap();
    let cms = context.compute_signature(&signature).unwrap();
    assert!(
        cms.as_der()
            .windows(signature.len())
            .any(|w| w == signature.as_slice()),
        "external signature bytes must appear verbatim"
    );
}
