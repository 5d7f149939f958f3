//! Remote PAdES Signing Engine
//!
//! Augments a PDF document with an advanced electronic signature (PAdES
//! baseline B-B, B-T, B-LT, B-LTA) whose signing key is held by an external
//! service. The engine never sees private key material: phase A produces a
//! hash to be signed remotely, phase B incorporates the returned signature
//! value, an RFC 3161 timestamp token and long-term validation material.
//!
//! ```no_run
//! use pades_signer::{PdfRemoteSignSession, SessionConfig, SigningResult};
//!
//! fn sign_one(
//!     end_certificate_b64: String,
//!     chain_b64: Vec<String>,
//!     signed_value_b64: &str,
//!     tsr_b64: &str,
//! ) -> SigningResult<()> {
//!     let config = SessionConfig::new(
//!         "ADES_B_T",
//!         "2.16.840.1.101.3.4.2.1",
//!         "input/contract.pdf",
//!         "output/contract-signed.pdf",
//!         end_certificate_b64,
//!         chain_b64,
//!     );
//!     let mut session = PdfRemoteSignSession::new(config)?;
//!     let hash = session.begin_signing()?;
//!     // ... send `hash` to the remote service, fetch a TSR over the value ...
//!     let _ = hash;
//!     session.finish_signing(signed_value_b64, Some(tsr_b64), None)
//! }
//! ```

pub mod domain;
pub mod infra;
pub mod services;
pub mod session;

pub use domain::cms::CmsSignedData;
pub use domain::tstoken::{TimestampResponse, TimestampToken};
pub use domain::types::{
    CertificateBundle, ConformanceLevel, HashAlgorithm, SigningState, ValidationData,
};
pub use infra::codec::{base64_decode, base64_encode, hex_decode, hex_encode, url_encode};
pub use infra::error::{SigningError, SigningResult};
pub use services::cms_builder::{CmsBuilderParams, CmsSignerContext, CmsStatus};
pub use services::inspector::{
    build_ocsp_request, extract_ca_issuers_url, extract_crl_url, extract_ocsp_url,
    extract_tsa_issuer_cert, extract_tsa_signer_cert,
};
pub use session::{PdfRemoteSignSession, SessionConfig};
