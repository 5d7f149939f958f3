//! Remote signing session façade.
//!
//! A session binds one input PDF to one output PDF and drives the two-phase
//! protocol per conformance level: `begin_signing` returns the URL-encoded
//! base64 hash for the external service, `finish_signing` folds the signed
//! value back in. B-LTA adds a third pair for the document timestamp. Phase
//! calls are strictly serial; any error moves the session to `Failed`.

use std::path::PathBuf;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::domain::constants;
use crate::domain::tstoken::TimestampResponse;
use crate::domain::types::{
    CertificateBundle, ConformanceLevel, HashAlgorithm, SigningState, ValidationData,
};
use crate::infra::codec::{base64_decode, base64_encode, url_encode};
use crate::infra::error::{SigningError, SigningResult};
use crate::services::cms_builder::{CmsBuilderParams, CmsSignerContext};
use crate::services::doc_timestamp::begin_doc_timestamp;
use crate::services::dss::append_dss_update;
use crate::services::pdf_signer::{prepare_signature_field, PreparedPdf, SignatureFieldOptions};

/// Name of the first (CAdES) signature field.
const SIGNATURE_FIELD: &str = "Signature";

/// Name of the DocTimeStamp field added by the LTA phase.
const LTA_SIGNATURE_FIELD: &str = "Signature2";

/// Session configuration, owned by the caller.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// One of `ADES_B_B`, `ADES_B_T`, `ADES_B_LT`, `ADES_B_LTA`.
    pub conformance_level: String,
    /// Dotted digest OID: 2.16.840.1.101.3.4.2.{1,2,3}.
    pub hash_algorithm_oid: String,
    pub document_input_path: PathBuf,
    pub document_output_path: PathBuf,
    pub end_certificate_b64: String,
    pub certificate_chain_b64: Vec<String>,
    pub root_certificate_b64: Option<String>,
    /// Signer name written into the signature dictionary.
    pub label: Option<String>,
    /// Fixed signing time; `None` uses the clock at `begin_signing`.
    pub signing_time: Option<DateTime<Utc>>,
    /// Override for the reserved CMS capacity in bytes.
    pub reserved_signature_size: Option<usize>,
    /// Override for the reserved DocTimeStamp capacity in bytes.
    pub reserved_timestamp_size: Option<usize>,
}

impl SessionConfig {
    /// Minimal configuration with per-level defaults for everything else.
    pub fn new(
        conformance_level: impl Into<String>,
        hash_algorithm_oid: impl Into<String>,
        input: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
        end_certificate_b64: impl Into<String>,
        certificate_chain_b64: Vec<String>,
    ) -> Self {
        Self {
            conformance_level: conformance_level.into(),
            hash_algorithm_oid: hash_algorithm_oid.into(),
            document_input_path: input.into(),
            document_output_path: output.into(),
            end_certificate_b64: end_certificate_b64.into(),
            certificate_chain_b64,
            root_certificate_b64: None,
            label: None,
            signing_time: None,
            reserved_signature_size: None,
            reserved_timestamp_size: None,
        }
    }

    /// Configuration from a credential bundle as returned by the remote
    /// signing service's credential listing.
    pub fn from_bundle(
        conformance_level: impl Into<String>,
        hash_algorithm_oid: impl Into<String>,
        input: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
        bundle: &CertificateBundle,
    ) -> Self {
        Self::new(
            conformance_level,
            hash_algorithm_oid,
            input,
            output,
            bundle.end_entity_cert_b64.clone(),
            bundle.chain_certs_b64.clone(),
        )
    }
}

/// A transient signing session over one document.
pub struct PdfRemoteSignSession {
    level: ConformanceLevel,
    hashing: HashAlgorithm,
    input_path: PathBuf,
    output_path: PathBuf,
    end_cert_der: Vec<u8>,
    chain_der: Vec<Vec<u8>>,
    #[allow(dead_code)]
    root_cert_der: Option<Vec<u8>>,
    signer_name: String,
    configured_signing_time: Option<DateTime<Utc>>,
    reserved_signature_size: usize,
    reserved_timestamp_size: usize,
    cms: Option<CmsSignerContext>,
    prepared: Option<PreparedPdf>,
    lta_prepared: Option<PreparedPdf>,
    state: SigningState,
}

impl PdfRemoteSignSession {
    /// Validate the configuration and decode the certificate material.
    pub fn new(config: SessionConfig) -> SigningResult<Self> {
        let level: ConformanceLevel = config.conformance_level.parse()?;
        let hashing = HashAlgorithm::from_oid(&config.hash_algorithm_oid)?;

        let end_cert_der = base64_decode(&config.end_certificate_b64)?;
        let mut chain_der = Vec::with_capacity(config.certificate_chain_b64.len());
        for cert_b64 in &config.certificate_chain_b64 {
            chain_der.push(base64_decode(cert_b64)?);
        }
        let root_cert_der = config
            .root_certificate_b64
            .as_deref()
            .map(base64_decode)
            .transpose()?;

        let reserved_signature_size = config.reserved_signature_size.unwrap_or(if level.supports_dss() {
            constants::RESERVED_CMS_SIZE_LT
        } else {
            constants::RESERVED_CMS_SIZE_BASIC
        });
        let reserved_timestamp_size = config
            .reserved_timestamp_size
            .unwrap_or(constants::RESERVED_CMS_SIZE_LT);

        log::info!(
            "session prepared: {level}, {hashing}, chain of {}",
            chain_der.len()
        );

        Ok(Self {
            level,
            hashing,
            input_path: config.document_input_path,
            output_path: config.document_output_path,
            end_cert_der,
            chain_der,
            root_cert_der,
            signer_name: config.label.unwrap_or_else(|| "Remote Signer".to_string()),
            configured_signing_time: config.signing_time,
            reserved_signature_size,
            reserved_timestamp_size,
            cms: None,
            prepared: None,
            lta_prepared: None,
            state: SigningState::Prepared,
        })
    }

    #[must_use]
    pub fn state(&self) -> SigningState {
        self.state
    }

    #[must_use]
    pub fn conformance_level(&self) -> ConformanceLevel {
        self.level
    }

    /// Log the session configuration at info level.
    pub fn log_state(&self) {
        log::info!(
            "session state: level={} hash={} input={:?} output={:?} chain={} state={}",
            self.level,
            self.hashing,
            self.input_path,
            self.output_path,
            self.chain_der.len(),
            self.state
        );
    }

    /// Phase A: mutate the document, reserve the signature slot and return
    /// the URL-encoded base64 hash for the remote signing service.
    pub fn begin_signing(&mut self) -> SigningResult<String> {
        self.fallible(Self::begin_signing_inner)
    }

    /// Phase B: install the remote signature value, the timestamp for
    /// non-B-B levels and the optional validation data.
    pub fn finish_signing(
        &mut self,
        signed_hash_b64: &str,
        tsr_b64: Option<&str>,
        validation_data: Option<&ValidationData>,
    ) -> SigningResult<()> {
        let owned_tsr = tsr_b64.map(str::to_owned);
        let owned_vd = validation_data.cloned();
        self.fallible(move |session| {
            session.finish_signing_inner(signed_hash_b64, owned_tsr.as_deref(), owned_vd.as_ref())
        })
    }

    /// Phase C (B-LTA only): reserve the DocTimeStamp slot and return the
    /// base64 SHA-256 digest to send to the TSA.
    pub fn begin_signing_lta(&mut self) -> SigningResult<String> {
        self.fallible(Self::begin_signing_lta_inner)
    }

    /// Phase D (B-LTA only): embed the TimeStampToken and the TSA's own
    /// validation data.
    pub fn finish_signing_lta(
        &mut self,
        tsr_b64: &str,
        validation_data: Option<&ValidationData>,
    ) -> SigningResult<()> {
        let owned_vd = validation_data.cloned();
        self.fallible(move |session| session.finish_signing_lta_inner(tsr_b64, owned_vd.as_ref()))
    }

    fn begin_signing_inner(&mut self) -> SigningResult<String> {
        self.expect_state(SigningState::Prepared, "beginSigning")?;
        log::info!("starting PDF signing process ({})", self.level);

        let signing_time = self.configured_signing_time.unwrap_or_else(Utc::now);
        log::debug!(
            "signing date: {}",
            signing_time.to_rfc3339_opts(SecondsFormat::Secs, true)
        );

        let options = SignatureFieldOptions {
            field_name: SIGNATURE_FIELD.to_string(),
            reason: "Document approval".to_string(),
            signer_name: self.signer_name.clone(),
            signing_time,
            reserved_size: self.reserved_signature_size,
        };
        let prepared = prepare_signature_field(&self.input_path, &self.output_path, &options)?;

        let params = CmsBuilderParams {
            hashing: self.hashing,
            signing_time_utc: Some(signing_time),
            ..CmsBuilderParams::default()
        };
        let mut cms = CmsSignerContext::new(self.end_cert_der.clone(), self.chain_der.clone(), params)?;

        let (head, tail) = prepared.spans();
        cms.append_data(head)?;
        cms.append_data(tail)?;
        let hash = cms.compute_hash_to_sign()?;
        let hash_b64 = base64_encode(&hash);
        log::debug!("hash to sign (base64): {hash_b64}");

        self.cms = Some(cms);
        self.prepared = Some(prepared);
        self.state = SigningState::AwaitingSignature;
        Ok(url_encode(&hash_b64))
    }

    fn finish_signing_inner(
        &mut self,
        signed_hash_b64: &str,
        tsr_b64: Option<&str>,
        validation_data: Option<&ValidationData>,
    ) -> SigningResult<()> {
        self.expect_state(SigningState::AwaitingSignature, "finishSigning")?;
        log::info!("finishing signing process");

        let signature = base64_decode(signed_hash_b64)?;

        let cms = self
            .cms
            .as_mut()
            .ok_or_else(|| SigningError::InvalidState("signer not initialized".into()))?;

        if self.level.requires_timestamp() {
            let tsr_b64 = tsr_b64.ok_or_else(|| {
                SigningError::MalformedInput(format!(
                    "{} requires a timestamp response",
                    self.level
                ))
            })?;
            let tsr_der = base64_decode(tsr_b64)?;
            cms.set_timestamp_token(&tsr_der)?;
        }

        let container = cms.compute_signature(&signature)?;

        let prepared = self
            .prepared
            .as_mut()
            .ok_or_else(|| SigningError::InvalidState("document was never prepared".into()))?;
        prepared.embed_contents(container.as_der())?;

        if self.level.supports_dss() {
            if let Some(vd) = validation_data.filter(|vd| !vd.is_empty()) {
                let updated = append_dss_update(prepared.bytes(), vd)?;
                std::fs::write(&self.output_path, &updated)?;
            }
        }

        self.state = if self.level == ConformanceLevel::BaselineLta {
            SigningState::AwaitingLtaTimestamp
        } else {
            SigningState::Finalized
        };
        log::info!("signing process completed ({})", self.state);
        Ok(())
    }

    fn begin_signing_lta_inner(&mut self) -> SigningResult<String> {
        self.expect_state(SigningState::AwaitingLtaTimestamp, "beginSigningLTA")?;
        log::info!("starting LTA document timestamp");

        let (prepared, digest) = begin_doc_timestamp(
            &self.output_path,
            LTA_SIGNATURE_FIELD,
            self.reserved_timestamp_size,
        )?;
        self.lta_prepared = Some(prepared);
        self.state = SigningState::AwaitingLtaSignature;
        Ok(base64_encode(&digest))
    }

    fn finish_signing_lta_inner(
        &mut self,
        tsr_b64: &str,
        validation_data: Option<&ValidationData>,
    ) -> SigningResult<()> {
        self.expect_state(SigningState::AwaitingLtaSignature, "finishSigningLTA")?;
        log::info!("finishing LTA document timestamp");

        let tsr_der = base64_decode(tsr_b64)?;
        let token = TimestampResponse::from_der(&tsr_der)?.into_token()?;

        let prepared = self
            .lta_prepared
            .as_mut()
            .ok_or_else(|| SigningError::InvalidState("LTA document was never prepared".into()))?;
        prepared.embed_contents(token.as_der())?;

        if let Some(vd) = validation_data.filter(|vd| !vd.is_empty()) {
            let updated = append_dss_update(prepared.bytes(), vd)?;
            std::fs::write(&self.output_path, &updated)?;
        }

        self.state = SigningState::Complete;
        log::info!("LTA timestamp completed");
        Ok(())
    }

    fn expect_state(&self, expected: SigningState, operation: &str) -> SigningResult<()> {
        if self.state != expected {
            return Err(SigningError::InvalidState(format!(
                "{operation} requires state {expected}, session is {}",
                self.state
            )));
        }
        Ok(())
    }

    /// Run a phase body; any error moves the session to `Failed`.
    fn fallible<T>(
        &mut self,
        body: impl FnOnce(&mut Self) -> SigningResult<T>,
    ) -> SigningResult<T> {
        match body(self) {
            Ok(value) => Ok(value),
            Err(error) => {
                log::warn!("signing phase failed: {error}");
                self.state = SigningState::Failed;
                Err(error)
            }
        }
    }
}
