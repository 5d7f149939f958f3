//! Centralized constants for commonly repeated DER/OID bytes and tags.
//! Keep this intentionally small; only broadly reused literals belong here.

// === ASN.1 DER tags ===

/// ASN.1 SEQUENCE tag
pub const ASN1_SEQUENCE_TAG: u8 = 0x30;

/// ASN.1 SET tag
pub const ASN1_SET_TAG: u8 = 0x31;

/// ASN.1 INTEGER tag
pub const ASN1_INTEGER_TAG: u8 = 0x02;

/// ASN.1 OBJECT IDENTIFIER tag
pub const ASN1_OID_TAG: u8 = 0x06;

/// ASN.1 OCTET STRING tag
pub const ASN1_OCTET_STRING_TAG: u8 = 0x04;

/// ASN.1 NULL value (tag + zero length)
pub const ASN1_NULL: &[u8] = &[0x05, 0x00];

/// ASN.1 GeneralizedTime tag
pub const ASN1_GENERALIZED_TIME_TAG: u8 = 0x18;

/// Context-specific constructed tag [0]
pub const ASN1_CONTEXT_0_TAG: u8 = 0xA0;

/// Context-specific constructed tag [1] (unsigned attributes in SignerInfo)
pub const ASN1_CONTEXT_1_TAG: u8 = 0xA1;

/// Context-specific constructed tag [4] (directoryName GeneralName)
pub const ASN1_CONTEXT_4_TAG: u8 = 0xA4;

// === CMS / PKCS#7 OIDs (content bytes, without tag/length) ===

/// id-data (1.2.840.113549.1.7.1)
pub const OID_ID_DATA: &[u8] = &[0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x07, 0x01];

/// id-signedData (1.2.840.113549.1.7.2)
pub const OID_ID_SIGNED_DATA: &[u8] = &[0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x07, 0x02];

/// contentType attribute (1.2.840.113549.1.9.3)
pub const OID_CONTENT_TYPE: &[u8] = &[0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x09, 0x03];

/// messageDigest attribute (1.2.840.113549.1.9.4)
pub const OID_MESSAGE_DIGEST: &[u8] = &[0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x09, 0x04];

/// signingTime attribute (1.2.840.113549.1.9.5)
pub const OID_SIGNING_TIME: &[u8] = &[0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x09, 0x05];

/// smimeCapabilities attribute (1.2.840.113549.1.9.15)
pub const OID_SMIME_CAPABILITIES: &[u8] = &[0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x09, 0x0F];

/// id-aa-timeStampToken unsigned attribute (1.2.840.113549.1.9.16.2.14)
pub const OID_TIMESTAMP_TOKEN: &[u8] = &[
    0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x09, 0x10, 0x02, 0x0E,
];

/// id-aa-signingCertificateV2 attribute (1.2.840.113549.1.9.16.2.47)
pub const OID_SIGNING_CERTIFICATE_V2: &[u8] = &[
    0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x09, 0x10, 0x02, 0x2F,
];

/// Dotted form of id-aa-timeStampToken, the reserved attribute OID of the
/// CMS builder's `add_attribute` operation.
pub const OID_TIMESTAMP_TOKEN_DOTTED: &str = "1.2.840.113549.1.9.16.2.14";

// === Digest algorithm OIDs ===

/// SHA-256 (2.16.840.1.101.3.4.2.1)
pub const OID_SHA256: &[u8] = &[0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x01];

/// SHA-384 (2.16.840.1.101.3.4.2.2)
pub const OID_SHA384: &[u8] = &[0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x02];

/// SHA-512 (2.16.840.1.101.3.4.2.3)
pub const OID_SHA512: &[u8] = &[0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x03];

/// SHA-1 (1.3.14.3.2.26), the RFC 6960 default for OCSP CertID hashes
pub const OID_SHA1: &[u8] = &[0x2B, 0x0E, 0x03, 0x02, 0x1A];

// === Signature algorithm OIDs ===

/// rsaEncryption (1.2.840.113549.1.1.1)
pub const OID_RSA_ENCRYPTION: &[u8] = &[0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x01, 0x01];

/// id-ecPublicKey (1.2.840.10045.2.1)
pub const OID_EC_PUBLIC_KEY: &[u8] = &[0x2A, 0x86, 0x48, 0xCE, 0x3D, 0x02, 0x01];

/// ecdsa-with-SHA256 (1.2.840.10045.4.3.2)
pub const OID_ECDSA_SHA256: &[u8] = &[0x2A, 0x86, 0x48, 0xCE, 0x3D, 0x04, 0x03, 0x02];

/// ecdsa-with-SHA384 (1.2.840.10045.4.3.3)
pub const OID_ECDSA_SHA384: &[u8] = &[0x2A, 0x86, 0x48, 0xCE, 0x3D, 0x04, 0x03, 0x03];

/// ecdsa-with-SHA512 (1.2.840.10045.4.3.4)
pub const OID_ECDSA_SHA512: &[u8] = &[0x2A, 0x86, 0x48, 0xCE, 0x3D, 0x04, 0x03, 0x04];

// === X.509 extension / access OIDs (dotted, matched against x509-cert) ===

/// CRLDistributionPoints extension (2.5.29.31)
pub const OID_CRL_DISTRIBUTION_POINTS: &str = "2.5.29.31";

/// AuthorityInfoAccess extension (1.3.6.1.5.5.7.1.1)
pub const OID_AUTHORITY_INFO_ACCESS: &str = "1.3.6.1.5.5.7.1.1";

/// id-ad-ocsp access method (1.3.6.1.5.5.7.48.1)
pub const OID_AD_OCSP: &str = "1.3.6.1.5.5.7.48.1";

/// id-ad-caIssuers access method (1.3.6.1.5.5.7.48.2)
pub const OID_AD_CA_ISSUERS: &str = "1.3.6.1.5.5.7.48.2";

// === PDF signature dictionary values ===

/// Reserved `/Contents` capacity in bytes for B-B and B-T signatures.
pub const RESERVED_CMS_SIZE_BASIC: usize = 17_000;

/// Reserved `/Contents` capacity in bytes for B-LT and B-LTA signatures
/// and for DocTimeStamp tokens.
pub const RESERVED_CMS_SIZE_LT: usize = 20_000;

/// Fixed placeholder written for `/ByteRange` before offsets are known.
/// Wide enough for four offsets in files up to ~10 GB.
pub const BYTE_RANGE_PLACEHOLDER: [i64; 4] = [0, 9_999_999_999, 9_999_999_999, 9_999_999_999];
