//! Core domain types: conformance levels, digest algorithms, certificate
//! material and validation-data bundles.

use std::fmt;
use std::str::FromStr;

use crate::infra::error::{SigningError, SigningResult};

/// PAdES baseline conformance level of a signing session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConformanceLevel {
    /// Basic signature, no timestamp.
    BaselineB,
    /// Signature timestamp embedded as unsigned CMS attribute.
    BaselineT,
    /// B-T plus long-term validation material in the DSS.
    BaselineLt,
    /// B-LT plus a document-level archive timestamp.
    BaselineLta,
}

impl ConformanceLevel {
    /// Whether this level embeds a signature timestamp in the CMS.
    #[must_use]
    pub fn requires_timestamp(self) -> bool {
        !matches!(self, ConformanceLevel::BaselineB)
    }

    /// Whether this level carries a DSS with validation material.
    #[must_use]
    pub fn supports_dss(self) -> bool {
        matches!(self, ConformanceLevel::BaselineLt | ConformanceLevel::BaselineLta)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ConformanceLevel::BaselineB => "ADES_B_B",
            ConformanceLevel::BaselineT => "ADES_B_T",
            ConformanceLevel::BaselineLt => "ADES_B_LT",
            ConformanceLevel::BaselineLta => "ADES_B_LTA",
        }
    }
}

impl FromStr for ConformanceLevel {
    type Err = SigningError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADES_B_B" => Ok(ConformanceLevel::BaselineB),
            "ADES_B_T" => Ok(ConformanceLevel::BaselineT),
            "ADES_B_LT" => Ok(ConformanceLevel::BaselineLt),
            "ADES_B_LTA" => Ok(ConformanceLevel::BaselineLta),
            other => Err(SigningError::InvalidConformanceLevel(other.to_string())),
        }
    }
}

impl fmt::Display for ConformanceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Supported digest algorithms, keyed by their dotted OIDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlgorithm {
    /// Resolve a dotted digest algorithm OID.
    pub fn from_oid(oid: &str) -> SigningResult<Self> {
        match oid {
            "2.16.840.1.101.3.4.2.1" => Ok(HashAlgorithm::Sha256),
            "2.16.840.1.101.3.4.2.2" => Ok(HashAlgorithm::Sha384),
            "2.16.840.1.101.3.4.2.3" => Ok(HashAlgorithm::Sha512),
            other => Err(SigningError::UnsupportedAlgorithm(format!(
                "unknown digest OID: {other}"
            ))),
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            HashAlgorithm::Sha256 => "SHA-256",
            HashAlgorithm::Sha384 => "SHA-384",
            HashAlgorithm::Sha512 => "SHA-512",
        }
    }

    #[must_use]
    pub fn digest_size(self) -> usize {
        match self {
            HashAlgorithm::Sha256 => 32,
            HashAlgorithm::Sha384 => 48,
            HashAlgorithm::Sha512 => 64,
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Certificate material owned by the caller and borrowed read-only by a
/// session: a credential identifier, the end-entity certificate and its
/// chain, all base64 DER.
#[derive(Debug, Clone)]
pub struct CertificateBundle {
    pub credential_id: String,
    pub end_entity_cert_b64: String,
    pub chain_certs_b64: Vec<String>,
}

/// Long-term validation material destined for the PDF `/DSS` dictionary.
/// Three ordered sequences of base64 DER blobs; ordering is preserved into
/// the PDF arrays and duplicates are the caller's responsibility.
#[derive(Debug, Clone, Default)]
pub struct ValidationData {
    pub certificates_b64: Vec<String>,
    pub crls_b64: Vec<String>,
    pub ocsps_b64: Vec<String>,
}

impl ValidationData {
    #[must_use]
    pub fn new(
        certificates: Vec<String>,
        crls: Vec<String>,
        ocsps: Vec<String>,
    ) -> Self {
        Self {
            certificates_b64: certificates,
            crls_b64: crls,
            ocsps_b64: ocsps,
        }
    }

    pub fn add_certificate(&mut self, cert_b64: impl Into<String>) {
        self.certificates_b64.push(cert_b64.into());
    }

    pub fn add_crl(&mut self, crl_b64: impl Into<String>) {
        self.crls_b64.push(crl_b64.into());
    }

    pub fn add_ocsp(&mut self, ocsp_b64: impl Into<String>) {
        self.ocsps_b64.push(ocsp_b64.into());
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.certificates_b64.is_empty() && self.crls_b64.is_empty() && self.ocsps_b64.is_empty()
    }
}

/// Mutable signing state of a session; phase methods are only legal from
/// specific states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningState {
    Uninitialized,
    Prepared,
    AwaitingSignature,
    Finalized,
    AwaitingLtaTimestamp,
    AwaitingLtaSignature,
    Complete,
    Failed,
}

impl fmt::Display for SigningState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SigningState::Uninitialized => "Uninitialized",
            SigningState::Prepared => "Prepared",
            SigningState::AwaitingSignature => "AwaitingSignature",
            SigningState::Finalized => "Finalized",
            SigningState::AwaitingLtaTimestamp => "AwaitingLTATimestamp",
            SigningState::AwaitingLtaSignature => "AwaitingLTASignature",
            SigningState::Complete => "Complete",
            SigningState::Failed => "Failed",
        };
        f.write_str(name)
    }
}
