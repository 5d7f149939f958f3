//! Shared fixtures: hand-built DER certificates, TimeStampResp containers
//! and minimal PDF documents.

#![allow(dead_code)]

use lopdf::{Dictionary, Document, Object, Stream};
use sha2::{Digest, Sha256};

use pades_signer::base64_encode;
use pades_signer::domain::der;

/// sha256WithRSAEncryption (1.2.840.113549.1.1.11)
const OID_SHA256_RSA: &[u8] = &[0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x01, 0x0B];
/// rsaEncryption (1.2.840.113549.1.1.1)
const OID_RSA: &[u8] = &[0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x01, 0x01];
/// commonName (2.5.4.3)
const OID_CN: &[u8] = &[0x55, 0x04, 0x03];
/// id-signedData (1.2.840.113549.1.7.2)
const OID_SIGNED_DATA: &[u8] = &[0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x07, 0x02];
/// id-ct-TSTInfo (1.2.840.113549.1.9.16.1.4)
const OID_TST_INFO: &[u8] = &[
    0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x09, 0x10, 0x01, 0x04,
];
/// SHA-256 (2.16.840.1.101.3.4.2.1)
const OID_SHA256: &[u8] = &[0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x01];
/// CRLDistributionPoints (2.5.29.31)
const OID_CDP: &[u8] = &[0x55, 0x1D, 0x1F];
/// AuthorityInfoAccess (1.3.6.1.5.5.7.1.1)
const OID_AIA: &[u8] = &[0x2B, 0x06, 0x01, 0x05, 0x05, 0x07, 0x01, 0x01];
/// id-ad-ocsp (1.3.6.1.5.5.7.48.1)
const OID_AD_OCSP: &[u8] = &[0x2B, 0x06, 0x01, 0x05, 0x05, 0x07, 0x30, 0x01];
/// id-ad-caIssuers (1.3.6.1.5.5.7.48.2)
const OID_AD_CA_ISSUERS: &[u8] = &[0x2B, 0x06, 0x01, 0x05, 0x05, 0x07, 0x30, 0x02];

/// Knobs for the synthetic certificate builder.
#[derive(Default)]
pub struct CertSpec {
    pub common_name: String,
    pub serial: Vec<u8>,
    pub crl_url: Option<String>,
    pub ocsp_url: Option<String>,
    pub ca_issuers_url: Option<String>,
}

impl CertSpec {
    pub fn named(cn: &str) -> Self {
        Self {
            common_name: cn.to_string(),
            serial: vec![0x01, 0x02, 0x03],
            ..Self::default()
        }
    }
}

fn name(cn: &str) -> Vec<u8> {
    let value = der::tlv(0x0C, cn.as_bytes());
    let atv = der::sequence(&[&der::oid(OID_CN), &value]);
    let rdn = der::set(&atv);
    der::sequence(&[&rdn])
}

fn utc_time(text: &str) -> Vec<u8> {
    der::tlv(0x17, text.as_bytes())
}

fn extension(oid_content: &[u8], value_der: &[u8]) -> Vec<u8> {
    der::sequence(&[&der::oid(oid_content), &der::octet_string(value_der)])
}

fn uri_general_name(url: &str) -> Vec<u8> {
    der::tlv(0x86, url.as_bytes())
}

/// Build a structurally valid (unsigned-garbage) X.509 certificate with an
/// RSA SPKI and the requested CDP/AIA extensions. `x509-cert` parses it; no
/// signature verification happens anywhere in the engine.
pub fn test_certificate(spec: &CertSpec) -> Vec<u8> {
    let version = der::context(0, &der::integer(&[0x02]));
    let serial = der::integer(&spec.serial);
    let sig_alg = der::algorithm_identifier(OID_SHA256_RSA);
    let issuer = name(&format!("{} CA", spec.common_name));
    let validity = der::sequence(&[&utc_time("240101000000Z"), &utc_time("340101000000Z")]);
    let subject = name(&spec.common_name);

    // RSA SPKI with a placeholder modulus; never used for verification.
    let rsa_key = der::sequence(&[&der::integer(&[0x00, 0xC2, 0x3F, 0x11]), &der::integer(&[0x01, 0x00, 0x01])]);
    let mut key_bits = vec![0u8];
    key_bits.extend_from_slice(&rsa_key);
    let spki = der::sequence(&[
        &der::algorithm_identifier(OID_RSA),
        &der::tlv(0x03, &key_bits),
    ]);

    let mut extensions = Vec::new();
    if let Some(url) = &spec.crl_url {
        let general_names = der::context(0, &uri_general_name(url));
        let dist_point_name = der::context(0, &general_names);
        let dist_point = der::sequence(&[&dist_point_name]);
        let cdp = der::sequence(&[&dist_point]);
        extensions.extend_from_slice(&extension(OID_CDP, &cdp));
    }
    let mut access_descriptions = Vec::new();
    if let Some(url) = &spec.ocsp_url {
        access_descriptions
            .extend_from_slice(&der::sequence(&[&der::oid(OID_AD_OCSP), &uri_general_name(url)]));
    }
    if let Some(url) = &spec.ca_issuers_url {
        access_descriptions.extend_from_slice(&der::sequence(&[
            &der::oid(OID_AD_CA_ISSUERS),
            &uri_general_name(url),
        ]));
    }
    if !access_descriptions.is_empty() {
        let aia = der::tlv(0x30, &access_descriptions);
        extensions.extend_from_slice(&extension(OID_AIA, &aia));
    }

    let mut tbs_parts: Vec<&[u8]> = vec![
        &version, &serial, &sig_alg, &issuer, &validity, &subject, &spki,
    ];
    let ext_wrapper;
    if !extensions.is_empty() {
        ext_wrapper = der::context(3, &der::tlv(0x30, &extensions));
        tbs_parts.push(&ext_wrapper);
    }
    let tbs = der::sequence(&tbs_parts);

    let signature = der::tlv(0x03, &[0u8, 0xDE, 0xAD, 0xBE, 0xEF]);
    der::sequence(&[&tbs, &der::algorithm_identifier(OID_SHA256_RSA), &signature])
}

pub fn test_certificate_b64(spec: &CertSpec) -> String {
    base64_encode(&test_certificate(spec))
}

/// TSTInfo whose messageImprint carries the given hash.
fn tst_info(message_imprint_hash: &[u8]) -> Vec<u8> {
    let policy = der::oid(&[0x2A, 0x03, 0x04]); // arbitrary policy arc
    let imprint = der::sequence(&[
        &der::algorithm_identifier(OID_SHA256),
        &der::octet_string(message_imprint_hash),
    ]);
    der::sequence(&[&der::integer(&[0x01]), &policy, &imprint])
}

/// A TimeStampToken (PKCS#7 SignedData ContentInfo) over the given imprint,
/// embedding the given certificates.
pub fn timestamp_token(message_imprint_hash: &[u8], certificates: &[Vec<u8>]) -> Vec<u8> {
    let tst = tst_info(message_imprint_hash);
    let encap = der::sequence(&[
        &der::oid(OID_TST_INFO),
        &der::context(0, &der::octet_string(&tst)),
    ]);

    let mut certs_content = Vec::new();
    for cert in certificates {
        certs_content.extend_from_slice(cert);
    }

    let mut signed_data_parts: Vec<&[u8]> = Vec::new();
    let version = der::integer(&[0x03]);
    let digest_algs = der::set(&der::algorithm_identifier(OID_SHA256));
    signed_data_parts.push(&version);
    signed_data_parts.push(&digest_algs);
    signed_data_parts.push(&encap);
    let certs_tagged;
    if !certificates.is_empty() {
        certs_tagged = der::tlv(0xA0, &certs_content);
        signed_data_parts.push(&certs_tagged);
    }
    let signer_infos = der::set(&[]);
    signed_data_parts.push(&signer_infos);
    let signed_data = der::sequence(&signed_data_parts);

    der::sequence(&[&der::oid(OID_SIGNED_DATA), &der::context(0, &signed_data)])
}

/// TimeStampResp with the given status and, when granted, a token over the
/// SHA-256 of `message` embedding `certificates`.
pub fn timestamp_response(status: u8, message: &[u8], certificates: &[Vec<u8>]) -> Vec<u8> {
    let status_info = der::sequence(&[&der::integer(&[status])]);
    if status != 0 {
        return der::sequence(&[&status_info]);
    }
    let imprint = Sha256::digest(message);
    let token = timestamp_token(&imprint, certificates);
    der::sequence(&[&status_info, &token])
}

pub fn timestamp_response_b64(status: u8, message: &[u8], certificates: &[Vec<u8>]) -> String {
    base64_encode(&timestamp_response(status, message, certificates))
}

/// A minimal one-page PDF, padded with a comment stream to a realistic size.
pub fn minimal_pdf_bytes() -> Vec<u8> {
    let mut doc = Document::with_version("1.7");

    let pages_id = doc.new_object_id();
    let content = Stream::new(Dictionary::new(), b"BT /F1 12 Tf 72 720 Td (fixture) Tj ET".to_vec());
    let content_id = doc.add_object(Object::Stream(content));

    let mut page = Dictionary::new();
    page.set("Type", Object::Name(b"Page".to_vec()));
    page.set("Parent", Object::Reference(pages_id));
    page.set("Contents", Object::Reference(content_id));
    page.set(
        "MediaBox",
        Object::Array(vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(612),
            Object::Integer(792),
        ]),
    );
    let page_id = doc.add_object(Object::Dictionary(page));

    let mut pages = Dictionary::new();
    pages.set("Type", Object::Name(b"Pages".to_vec()));
    pages.set("Kids", Object::Array(vec![Object::Reference(page_id)]));
    pages.set("Count", Object::Integer(1));
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let mut catalog = Dictionary::new();
    catalog.set("Type", Object::Name(b"Catalog".to_vec()));
    catalog.set("Pages", Object::Reference(pages_id));
    let catalog_id = doc.add_object(Object::Dictionary(catalog));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("fixture PDF serializes");
    bytes
}

/// Deterministic stand-in for a remote signature value.
pub fn fixture_signature(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}
