//! CMS SignedData builder with deferred external signing.
//!
//! Assembles a CAdES-baseline CMS container over detached data. The private
//! key never enters the process: `compute_hash_to_sign` hands out the
//! signed-attribute digest, the remote service signs it, and
//! `compute_signature` installs the returned value and serializes the final
//! `ContentInfo`.

use chrono::{DateTime, SecondsFormat, Utc};
use der::{Decode, Encode};
use sha2::digest::DynDigest;
use sha2::{Digest, Sha256, Sha384, Sha512};
use x509_cert::Certificate;

use crate::domain::cms::{CmsSignedData, SignedAttribute, SignedAttributesCanonical};
use crate::domain::der::{self as derenc, DerCursor};
use crate::domain::types::HashAlgorithm;
use crate::domain::{constants, tstoken::TimestampResponse};
use crate::infra::error::{SigningError, SigningResult};

/// Construction parameters, mirroring the knobs of the reference CMS layer.
#[derive(Debug, Clone)]
pub struct CmsBuilderParams {
    pub hashing: HashAlgorithm,
    /// Leave out the S/MIME capabilities attribute (CAdES signatures don't
    /// want unneeded attributes).
    pub skip_mime_cap: bool,
    /// Leave out the signingTime signed attribute.
    pub skip_write_signing_time: bool,
    /// Fixed signing time; `None` means current UTC at hash computation.
    pub signing_time_utc: Option<DateTime<Utc>>,
    /// Return `digest(signed attributes)` from `compute_hash_to_sign`
    /// instead of the attribute DER itself.
    pub do_wrap_digest: bool,
    /// Include the ESS signingCertificateV2 attribute.
    pub add_signing_certificate_v2: bool,
}

impl Default for CmsBuilderParams {
    fn default() -> Self {
        Self {
            hashing: HashAlgorithm::Sha256,
            skip_mime_cap: true,
            skip_write_signing_time: false,
            signing_time_utc: None,
            do_wrap_digest: true,
            add_signing_certificate_v2: true,
        }
    }
}

/// Signature algorithm family, derived from the certificate SPKI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SignatureAlgorithm {
    Rsa,
    Ecdsa,
}

/// Builder status; operations are gated on it exactly like the reference
/// context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmsStatus {
    Initialized,
    AppendingData,
    ComputedHash,
    ComputedSignature,
}

/// Partial CMS state bound to one signer certificate.
pub struct CmsSignerContext {
    params: CmsBuilderParams,
    end_cert_der: Vec<u8>,
    chain_der: Vec<Vec<u8>>,
    issuer_name_der: Vec<u8>,
    serial_der: Vec<u8>,
    signature_alg: SignatureAlgorithm,
    cert_hash: Vec<u8>,
    data_digest: Option<Box<dyn DynDigest>>,
    extra_signed_attrs: Vec<SignedAttribute>,
    unsigned_attrs: Vec<SignedAttribute>,
    signed_attrs: Option<SignedAttributesCanonical>,
    status: CmsStatus,
}

impl CmsSignerContext {
    /// Load the end-entity certificate and chain, precompute the material
    /// needed for SignerInfo and ESSCertIDv2.
    pub fn new(
        end_cert_der: Vec<u8>,
        chain_der: Vec<Vec<u8>>,
        params: CmsBuilderParams,
    ) -> SigningResult<Self> {
        let cert = Certificate::from_der(&end_cert_der)
            .map_err(|e| SigningError::ParseFailure(format!("end-entity certificate: {e}")))?;

        let issuer_name_der = cert
            .tbs_certificate
            .issuer
            .to_der()
            .map_err(|e| SigningError::ParseFailure(format!("issuer name encoding: {e}")))?;
        let serial_der = derenc::tlv(
            constants::ASN1_INTEGER_TAG,
            cert.tbs_certificate.serial_number.as_bytes(),
        );

        let spki_oid = cert
            .tbs_certificate
            .subject_public_key_info
            .algorithm
            .oid
            .to_string();
        let signature_alg = match spki_oid.as_str() {
            "1.2.840.113549.1.1.1" => SignatureAlgorithm::Rsa,
            "1.2.840.10045.2.1" => SignatureAlgorithm::Ecdsa,
            other => {
                return Err(SigningError::UnsupportedAlgorithm(format!(
                    "unsupported subject public key algorithm: {other}"
                )))
            }
        };

        let cert_hash = digest_once(params.hashing, &end_cert_der);

        log::debug!(
            "CMS context initialized: {} signer, {} chain certificate(s), {}",
            match signature_alg {
                SignatureAlgorithm::Rsa => "RSA",
                SignatureAlgorithm::Ecdsa => "ECDSA",
            },
            chain_der.len(),
            params.hashing
        );

        Ok(Self {
            params,
            end_cert_der,
            chain_der,
            issuer_name_der,
            serial_der,
            signature_alg,
            cert_hash,
            data_digest: None,
            extra_signed_attrs: Vec::new(),
            unsigned_attrs: Vec::new(),
            signed_attrs: None,
            status: CmsStatus::Initialized,
        })
    }

    #[must_use]
    pub fn status(&self) -> CmsStatus {
        self.status
    }

    /// Feed detached content. Repeatable until the hash is computed.
    pub fn append_data(&mut self, data: &[u8]) -> SigningResult<()> {
        self.check_append_allowed()?;
        let hashing = self.params.hashing;
        self.data_digest
            .get_or_insert_with(|| new_digest(hashing))
            .update(data);
        self.status = CmsStatus::AppendingData;
        Ok(())
    }

    /// Lock the signed attributes and return the byte string the external
    /// service signs: the digest of the attribute SET when `do_wrap_digest`,
    /// the attribute SET DER otherwise.
    pub fn compute_hash_to_sign(&mut self) -> SigningResult<Vec<u8>> {
        self.check_append_allowed()?;

        let message_digest = self
            .data_digest
            .take()
            .unwrap_or_else(|| new_digest(self.params.hashing))
            .finalize()
            .to_vec();

        let mut attrs = Vec::new();
        attrs.push(SignedAttribute {
            oid: "1.2.840.113549.1.9.3".into(),
            der: attribute(constants::OID_CONTENT_TYPE, &derenc::oid(constants::OID_ID_DATA)),
        });
        attrs.push(SignedAttribute {
            oid: "1.2.840.113549.1.9.4".into(),
            der: attribute(
                constants::OID_MESSAGE_DIGEST,
                &derenc::octet_string(&message_digest),
            ),
        });
        if !self.params.skip_write_signing_time {
            let when = self.params.signing_time_utc.unwrap_or_else(Utc::now);
            log::debug!(
                "signingTime attribute: {}",
                when.to_rfc3339_opts(SecondsFormat::Secs, true)
            );
            attrs.push(SignedAttribute {
                oid: "1.2.840.113549.1.9.5".into(),
                der: attribute(constants::OID_SIGNING_TIME, &generalized_time(&when)),
            });
        }
        if !self.params.skip_mime_cap {
            attrs.push(SignedAttribute {
                oid: "1.2.840.113549.1.9.15".into(),
                der: attribute(constants::OID_SMIME_CAPABILITIES, &derenc::sequence(&[])),
            });
        }
        if self.params.add_signing_certificate_v2 {
            attrs.push(SignedAttribute {
                oid: "1.2.840.113549.1.9.16.2.47".into(),
                der: attribute(
                    constants::OID_SIGNING_CERTIFICATE_V2,
                    &self.signing_certificate_v2(),
                ),
            });
        }
        attrs.extend(self.extra_signed_attrs.iter().cloned());

        let canonical = SignedAttributesCanonical::new(attrs);
        // RFC 5652 §5.4: the digest input uses the explicit SET OF tag, not
        // the [0] IMPLICIT tag the SignerInfo carries.
        let set_der = derenc::set(canonical.concatenated_der());
        self.signed_attrs = Some(canonical);
        self.status = CmsStatus::ComputedHash;

        if self.params.do_wrap_digest {
            Ok(digest_once(self.params.hashing, &set_der))
        } else {
            Ok(set_der)
        }
    }

    /// Install the externally produced signature value and serialize the
    /// complete `ContentInfo`.
    pub fn compute_signature(&mut self, external_signature: &[u8]) -> SigningResult<CmsSignedData> {
        if self.status != CmsStatus::ComputedHash {
            return Err(SigningError::InvalidState(
                "the signature can't be computed at this moment".into(),
            ));
        }
        let signed_attrs = self.signed_attrs.as_ref().ok_or_else(|| {
            SigningError::InvalidState("signed attributes were never computed".into())
        })?;

        let digest_oid = digest_oid(self.params.hashing);
        let digest_alg = derenc::algorithm_identifier(digest_oid);

        // SignerInfo
        let sid = derenc::sequence(&[&self.issuer_name_der, &self.serial_der]);
        let signed_attrs_tagged = derenc::tlv(
            constants::ASN1_CONTEXT_0_TAG,
            signed_attrs.concatenated_der(),
        );
        let signature_alg = match self.signature_alg {
            SignatureAlgorithm::Rsa => derenc::algorithm_identifier(constants::OID_RSA_ENCRYPTION),
            SignatureAlgorithm::Ecdsa => {
                derenc::algorithm_identifier_no_params(match self.params.hashing {
                    HashAlgorithm::Sha256 => constants::OID_ECDSA_SHA256,
                    HashAlgorithm::Sha384 => constants::OID_ECDSA_SHA384,
                    HashAlgorithm::Sha512 => constants::OID_ECDSA_SHA512,
                })
            }
        };
        let signature_value = derenc::octet_string(external_signature);
        let unsigned_tagged = if self.unsigned_attrs.is_empty() {
            Vec::new()
        } else {
            let canonical = SignedAttributesCanonical::new(self.unsigned_attrs.clone());
            derenc::tlv(constants::ASN1_CONTEXT_1_TAG, canonical.concatenated_der())
        };

        let signer_info = derenc::sequence(&[
            &[0x02, 0x01, 0x01], // version 1: issuerAndSerialNumber
            &sid,
            &digest_alg,
            &signed_attrs_tagged,
            &signature_alg,
            &signature_value,
            &unsigned_tagged,
        ]);

        // SignedData
        let digest_algorithms = derenc::set(&digest_alg);
        let encap_content_info = derenc::sequence(&[&derenc::oid(constants::OID_ID_DATA)]);
        let mut certs_content = self.end_cert_der.clone();
        for cert in &self.chain_der {
            certs_content.extend_from_slice(cert);
        }
        let certificates = derenc::tlv(constants::ASN1_CONTEXT_0_TAG, &certs_content);
        let signer_infos = derenc::set(&signer_info);

        let signed_data = derenc::sequence(&[
            &[0x02, 0x01, 0x01], // CMSVersion 1
            &digest_algorithms,
            &encap_content_info,
            &certificates,
            &signer_infos,
        ]);

        let content_info = derenc::sequence(&[
            &derenc::oid(constants::OID_ID_SIGNED_DATA),
            &derenc::context(0, &signed_data),
        ]);

        log::debug!("assembled CMS ContentInfo ({} bytes)", content_info.len());
        self.status = CmsStatus::ComputedSignature;
        Ok(CmsSignedData::from_der(content_info))
    }

    /// Add an attribute by dotted OID.
    ///
    /// The reserved OID `1.2.840.113549.1.9.16.2.14` takes a whole DER
    /// `TimeStampResp`; the inner token is extracted and embedded as a
    /// SEQUENCE-typed unsigned attribute. Other values go in as an OCTET
    /// STRING when `as_octet_string`, or verbatim when they already are a
    /// single well-formed DER element. Failures leave the context unchanged.
    pub fn add_attribute(
        &mut self,
        oid_dotted: &str,
        value: &[u8],
        signed: bool,
        as_octet_string: bool,
    ) -> SigningResult<()> {
        if signed {
            self.check_add_signed_allowed()?;
        } else {
            self.check_add_unsigned_allowed()?;
        }

        if oid_dotted == constants::OID_TIMESTAMP_TOKEN_DOTTED {
            let token = TimestampResponse::from_der(value)?.into_token()?;
            let attr = attribute(constants::OID_TIMESTAMP_TOKEN, token.as_der());
            log::debug!(
                "embedded timestamp token as unsigned attribute ({} bytes)",
                token.as_der().len()
            );
            self.unsigned_attrs.push(SignedAttribute {
                oid: oid_dotted.to_string(),
                der: attr,
            });
            return Ok(());
        }

        let oid_content = derenc::encode_oid_dotted(oid_dotted)?;
        let value_der = if as_octet_string {
            derenc::octet_string(value)
        } else {
            let mut cursor = DerCursor::new(value);
            let element = cursor.read()?;
            if !cursor.is_at_end() {
                return Err(SigningError::ParseFailure(
                    "attribute value holds trailing bytes after its DER element".into(),
                ));
            }
            element.raw.to_vec()
        };
        let attr = attribute(&oid_content, &value_der);
        let entry = SignedAttribute {
            oid: oid_dotted.to_string(),
            der: attr,
        };
        if signed {
            self.extra_signed_attrs.push(entry);
        } else {
            self.unsigned_attrs.push(entry);
        }
        Ok(())
    }

    /// Register a `TimeStampResp` as the `id-aa-timeStampToken` unsigned
    /// attribute.
    pub fn set_timestamp_token(&mut self, tsr_der: &[u8]) -> SigningResult<()> {
        self.add_attribute(constants::OID_TIMESTAMP_TOKEN_DOTTED, tsr_der, false, false)
    }

    /// ESS signingCertificateV2 attribute value.
    ///
    /// The hash AlgorithmIdentifier is a DER DEFAULT of sha256 and must be
    /// omitted for that algorithm.
    fn signing_certificate_v2(&self) -> Vec<u8> {
        let cert_hash = derenc::octet_string(&self.cert_hash);
        let general_names = derenc::sequence(&[&derenc::context(4, &self.issuer_name_der)]);
        let issuer_serial = derenc::sequence(&[&general_names, &self.serial_der]);

        let ess_cert_id = match self.params.hashing {
            HashAlgorithm::Sha256 => derenc::sequence(&[&cert_hash, &issuer_serial]),
            HashAlgorithm::Sha384 => derenc::sequence(&[
                &derenc::algorithm_identifier(constants::OID_SHA384),
                &cert_hash,
                &issuer_serial,
            ]),
            HashAlgorithm::Sha512 => derenc::sequence(&[
                &derenc::algorithm_identifier(constants::OID_SHA512),
                &cert_hash,
                &issuer_serial,
            ]),
        };
        let certs = derenc::sequence(&[&ess_cert_id]);
        derenc::sequence(&[&certs])
    }

    fn check_append_allowed(&self) -> SigningResult<()> {
        match self.status {
            CmsStatus::Initialized | CmsStatus::AppendingData => Ok(()),
            _ => Err(SigningError::InvalidState(
                "the CMS context is not initialized or the signature was already computed".into(),
            )),
        }
    }

    fn check_add_signed_allowed(&self) -> SigningResult<()> {
        if self.status != CmsStatus::Initialized {
            return Err(SigningError::InvalidState(
                "signed attributes can be added only before data appending starts".into(),
            ));
        }
        Ok(())
    }

    fn check_add_unsigned_allowed(&self) -> SigningResult<()> {
        match self.status {
            CmsStatus::Initialized | CmsStatus::AppendingData | CmsStatus::ComputedHash => Ok(()),
            CmsStatus::ComputedSignature => Err(SigningError::InvalidState(
                "unsigned attributes can be added only before signature computation".into(),
            )),
        }
    }
}

/// Attribute ::= SEQUENCE { attrType OID, attrValues SET OF AttributeValue }
fn attribute(oid_content: &[u8], value_der: &[u8]) -> Vec<u8> {
    let oid_der = derenc::oid(oid_content);
    let value_set = derenc::set(value_der);
    derenc::sequence(&[&oid_der, &value_set])
}

fn generalized_time(when: &DateTime<Utc>) -> Vec<u8> {
    let text = when.format("%Y%m%d%H%M%SZ").to_string();
    derenc::tlv(constants::ASN1_GENERALIZED_TIME_TAG, text.as_bytes())
}

fn digest_oid(alg: HashAlgorithm) -> &'static [u8] {
    match alg {
        HashAlgorithm::Sha256 => constants::OID_SHA256,
        HashAlgorithm::Sha384 => constants::OID_SHA384,
        HashAlgorithm::Sha512 => constants::OID_SHA512,
    }
}

fn new_digest(alg: HashAlgorithm) -> Box<dyn DynDigest> {
    match alg {
        HashAlgorithm::Sha256 => Box::new(Sha256::new()),
        HashAlgorithm::Sha384 => Box::new(Sha384::new()),
        HashAlgorithm::Sha512 => Box::new(Sha512::new()),
    }
}

fn digest_once(alg: HashAlgorithm, data: &[u8]) -> Vec<u8> {
    match alg {
        HashAlgorithm::Sha256 => Sha256::digest(data).to_vec(),
        HashAlgorithm::Sha384 => Sha384::digest(data).to_vec(),
        HashAlgorithm::Sha512 => Sha512::digest(data).to_vec(),
    }
}
