//! ASN.1/X.509 inspector: revocation and chain-building hints.
//!
//! Extracts CRL distribution points, OCSP/caIssuers access URLs and TSA
//! certificates from base64 DER inputs, and builds minimal OCSP requests.
//! The network fetches themselves belong to the caller.

use der::{Decode, Encode};
use sha1::{Digest, Sha1};
use x509_cert::ext::pkix::name::{DistributionPointName, GeneralName};
use x509_cert::ext::pkix::{AuthorityInfoAccessSyntax, CrlDistributionPoints};
use x509_cert::Certificate;

use crate::domain::tstoken::TimestampResponse;
use crate::domain::{constants, der as derenc};
use crate::infra::codec::{base64_decode, base64_encode};
use crate::infra::error::{SigningError, SigningResult};

/// Extract the first CRL distribution point URI from a certificate.
///
/// The input may also be a whole `TimeStampResp`; in that case the TSA
/// signer certificate is lifted from the embedded token and inspected
/// instead.
pub fn extract_crl_url(cert_or_tsr_b64: &str) -> SigningResult<String> {
    let der = base64_decode(cert_or_tsr_b64)?;
    let cert = match Certificate::from_der(&der) {
        Ok(cert) => cert,
        Err(_) => {
            log::debug!("input is not an X.509 certificate, retrying as TimeStampResp");
            let response = TimestampResponse::from_der(&der)?;
            let token = response.token().ok_or_else(|| {
                SigningError::ParseFailure("TimeStampResp does not contain a timeStampToken".into())
            })?;
            let certs = token.certificates()?;
            let signer = certs.first().ok_or_else(|| {
                SigningError::NotFound("no certificates found in timeStampToken".into())
            })?;
            Certificate::from_der(signer)
                .map_err(|e| SigningError::ParseFailure(format!("TSA signer certificate: {e}")))?
        }
    };

    crl_url_from_certificate(&cert)
}

/// Extract the first OCSP responder URI from a certificate's AIA extension.
/// The issuer certificate is parsed alongside to validate the pair.
pub fn extract_ocsp_url(cert_b64: &str, issuer_b64: &str) -> SigningResult<String> {
    let cert = parse_certificate(cert_b64, "certificate")?;
    let _issuer = parse_certificate(issuer_b64, "issuer certificate")?;
    access_url(&cert, constants::OID_AD_OCSP)
        .ok_or_else(|| SigningError::NotFound("no OCSP responder URL in certificate".into()))
}

/// Extract the first caIssuers URI from a certificate's AIA extension.
pub fn extract_ca_issuers_url(cert_b64: &str) -> SigningResult<String> {
    let cert = parse_certificate(cert_b64, "certificate")?;
    access_url(&cert, constants::OID_AD_CA_ISSUERS)
        .ok_or_else(|| SigningError::NotFound("no caIssuers URL in certificate".into()))
}

/// The TSA signer certificate (index 0 of the token certificate set),
/// returned as base64 DER.
pub fn extract_tsa_signer_cert(tsr_b64: &str) -> SigningResult<String> {
    tsa_certificate_at(tsr_b64, 0)
}

/// The TSA issuer certificate (index 1 of the token certificate set).
/// Fails with `NotFound` when the token embeds only the signer; callers
/// fall back to the signer's AIA caIssuers URL in that case.
pub fn extract_tsa_issuer_cert(tsr_b64: &str) -> SigningResult<String> {
    tsa_certificate_at(tsr_b64, 1)
}

/// Build a DER `OCSPRequest` with a single CertID for the subject/issuer
/// pair: SHA-1 name and key hashes (the RFC 6960 default), no requestor
/// name, no extensions, no nonce. Returned as base64 DER.
pub fn build_ocsp_request(cert_b64: &str, issuer_b64: &str) -> SigningResult<String> {
    let cert = parse_certificate(cert_b64, "certificate")?;
    let issuer = parse_certificate(issuer_b64, "issuer certificate")?;

    let issuer_name_der = issuer
        .tbs_certificate
        .subject
        .to_der()
        .map_err(|e| SigningError::ParseFailure(format!("issuer subject encoding: {e}")))?;
    let issuer_name_hash = Sha1::digest(&issuer_name_der);

    let issuer_key_bits = issuer
        .tbs_certificate
        .subject_public_key_info
        .subject_public_key
        .raw_bytes();
    let issuer_key_hash = Sha1::digest(issuer_key_bits);

    let serial = derenc::tlv(
        constants::ASN1_INTEGER_TAG,
        cert.tbs_certificate.serial_number.as_bytes(),
    );

    let cert_id = derenc::sequence(&[
        &derenc::algorithm_identifier(constants::OID_SHA1),
        &derenc::octet_string(&issuer_name_hash),
        &derenc::octet_string(&issuer_key_hash),
        &serial,
    ]);
    let request = derenc::sequence(&[&cert_id]);
    let request_list = derenc::sequence(&[&request]);
    let tbs_request = derenc::sequence(&[&request_list]);
    let ocsp_request = derenc::sequence(&[&tbs_request]);

    log::debug!("built OCSPRequest ({} bytes)", ocsp_request.len());
    Ok(base64_encode(&ocsp_request))
}

fn parse_certificate(b64: &str, what: &str) -> SigningResult<Certificate> {
    let der = base64_decode(b64)?;
    Certificate::from_der(&der)
        .map_err(|e| SigningError::ParseFailure(format!("failed to parse {what}: {e}")))
}

fn tsa_certificate_at(tsr_b64: &str, index: usize) -> SigningResult<String> {
    let der = base64_decode(tsr_b64)?;
    let response = TimestampResponse::from_der(&der)?;
    let token = response.token().ok_or_else(|| {
        SigningError::ParseFailure("TimeStampResp does not contain a timeStampToken".into())
    })?;
    let certs = token.certificates()?;
    if certs.is_empty() {
        return Err(SigningError::NotFound(
            "no certificates found in timeStampToken".into(),
        ));
    }
    let cert = certs.get(index).ok_or_else(|| {
        SigningError::NotFound(format!(
            "timeStampToken embeds {} certificate(s), wanted index {index}",
            certs.len()
        ))
    })?;
    Ok(base64_encode(cert))
}

/// First URI GeneralName among the certificate's CRL distribution points.
fn crl_url_from_certificate(cert: &Certificate) -> SigningResult<String> {
    let Some(ext_value) = extension_value(cert, constants::OID_CRL_DISTRIBUTION_POINTS) else {
        return Err(SigningError::NotFound(
            "certificate has no CRL distribution points extension".into(),
        ));
    };
    let points = CrlDistributionPoints::from_der(ext_value)
        .map_err(|e| SigningError::ParseFailure(format!("CRLDistributionPoints: {e}")))?;

    for point in points.0 {
        let Some(DistributionPointName::FullName(names)) = point.distribution_point else {
            continue;
        };
        for name in names {
            if let GeneralName::UniformResourceIdentifier(uri) = name {
                let url = uri.as_str().to_string();
                if !url.is_empty() {
                    log::debug!("extracted CRL URL: {url}");
                    return Ok(url);
                }
            }
        }
    }
    Err(SigningError::NotFound(
        "no CRL distribution point URL found in certificate".into(),
    ))
}

/// First URI access location with the requested AIA access method.
fn access_url(cert: &Certificate, method_oid: &str) -> Option<String> {
    let ext_value = extension_value(cert, constants::OID_AUTHORITY_INFO_ACCESS)?;
    let aia = AuthorityInfoAccessSyntax::from_der(ext_value).ok()?;
    for description in aia.0 {
        if description.access_method.to_string() != method_oid {
            continue;
        }
        if let GeneralName::UniformResourceIdentifier(uri) = description.access_location {
            return Some(uri.as_str().to_string());
        }
    }
    None
}

fn extension_value<'a>(cert: &'a Certificate, oid: &str) -> Option<&'a [u8]> {
    cert.tbs_certificate
        .extensions
        .as_ref()?
        .iter()
        .find(|ext| ext.extn_id.to_string() == oid)
        .map(|ext| ext.extn_value.as_bytes())
}
